use bookcat_types::ValidationError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Invalid order by field: {0}")]
    InvalidOrderByField(String),

    #[error("Value of {field} already exists")]
    UniqueViolation { field: String },

    #[error("Unknown author id {0}")]
    UnknownAuthor(i64),

    #[error("Invalid value: {0}")]
    InvalidValue(#[from] ValidationError),
}

impl Error {
    /// Maps store constraint failures on insert/update to domain errors
    pub(crate) fn from_write(error: sqlx::Error) -> Self {
        if let Some(db_error) = error.as_database_error() {
            if db_error.is_unique_violation() {
                // SQLite reports "UNIQUE constraint failed: table.column"
                let field = db_error
                    .message()
                    .rsplit(['.', ' '])
                    .next()
                    .unwrap_or_default()
                    .to_string();
                return Error::UniqueViolation { field };
            }
        }
        Error::DatabaseError(error)
    }
}
