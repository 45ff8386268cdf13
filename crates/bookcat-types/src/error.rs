#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("ISBN must contain only digits (hyphens and spaces are allowed)")]
    IsbnNotDigits,

    #[error("ISBN must be either 10 or 13 digits long, got {0}")]
    IsbnLength(usize),

    #[error("A book must have at least one author")]
    MissingAuthors,
}

impl ValidationError {
    /// Stable machine readable kind of the error
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::IsbnNotDigits | ValidationError::IsbnLength(_) => "INVALID_ISBN",
            ValidationError::MissingAuthors => "MISSING_AUTHORS",
        }
    }

    /// Name of the write model field the error belongs to
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::IsbnNotDigits | ValidationError::IsbnLength(_) => "isbn",
            ValidationError::MissingAuthors => "authors",
        }
    }
}
