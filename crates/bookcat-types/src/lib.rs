pub mod contact;
pub mod error;
pub mod isbn;

pub use contact::AuthorEmail;
pub use error::ValidationError;
pub use isbn::{validate_authors, validate_isbn};
