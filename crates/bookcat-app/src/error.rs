use std::collections::BTreeMap;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use tracing::error;

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

/// Validation messages keyed by field name
pub type FieldErrors = BTreeMap<String, Vec<String>>;

const NON_FIELD_ERRORS: &str = "non_field_errors";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApiError {
    pub fn field_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), vec![message.into()]);
        ApiError::Validation(errors)
    }
}

/// Groups garde report by top level field, nested paths keep full dotted name
pub fn field_errors(report: &garde::Report) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for (path, error) in report.iter() {
        let mut field = path.to_string();
        if field.is_empty() {
            field = NON_FIELD_ERRORS.to_string();
        }
        errors
            .entry(field)
            .or_default()
            .push(error.message().to_string());
    }
    errors
}

impl From<garde::Report> for ApiError {
    fn from(report: garde::Report) -> Self {
        ApiError::Validation(field_errors(&report))
    }
}

impl From<bookcat_dal::Error> for ApiError {
    fn from(e: bookcat_dal::Error) -> Self {
        use bookcat_dal::Error as DalError;
        match e {
            DalError::RecordNotFound(entity) => ApiError::ResourceNotFound(entity),
            DalError::DatabaseError(bookcat_dal::SqlxError::RowNotFound) => {
                ApiError::ResourceNotFound("Record".to_string())
            }
            DalError::InvalidOrderByField(field) => {
                ApiError::InvalidQuery(format!("Cannot order by {field}"))
            }
            DalError::UniqueViolation { field } => {
                let message = format!("Record with this {field} already exists");
                ApiError::field_error(field, message)
            }
            DalError::UnknownAuthor(id) => {
                ApiError::field_error("authors", format!("Author with id {id} does not exist"))
            }
            DalError::InvalidValue(e) => ApiError::field_error(e.field(), e.to_string()),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidQuery(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(errors) => {
                return (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            ApiError::ResourceNotFound(entity) => {
                (StatusCode::NOT_FOUND, format!("{entity} not found"))
            }
            ApiError::InvalidQuery(msg) | ApiError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, msg)
            }
            ApiError::InternalError(msg) => {
                error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
