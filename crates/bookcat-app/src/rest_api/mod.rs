use axum::{response::IntoResponse, Json};
use http::StatusCode;
use serde::Serialize;
use tracing::debug;

pub mod author;
pub mod book;
mod macros;
mod paging;

pub use paging::{Page, Paging};

/// Operations exposed by entity endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Count,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Delete,
    Statistics,
    Related,
    Recent,
}

/// Projection of an entity returned by an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadModel {
    List,
    Detail,
    Aggregate,
    Empty,
}

impl Operation {
    pub const fn read_model(self) -> ReadModel {
        match self {
            Operation::List | Operation::Related | Operation::Recent => ReadModel::List,
            Operation::Retrieve
            | Operation::Create
            | Operation::Update
            | Operation::PartialUpdate => ReadModel::Detail,
            Operation::Count | Operation::Statistics => ReadModel::Aggregate,
            Operation::Delete => ReadModel::Empty,
        }
    }

    pub const fn success_status(self) -> StatusCode {
        match self {
            Operation::Create => StatusCode::CREATED,
            Operation::Delete => StatusCode::NO_CONTENT,
            _ => StatusCode::OK,
        }
    }
}

/// Successful response of an operation
pub(crate) fn reply<T: Serialize>(operation: Operation, body: T) -> axum::response::Response {
    let read_model = operation.read_model();
    debug!(?operation, ?read_model, "Operation succeeded");
    match read_model {
        ReadModel::Empty => operation.success_status().into_response(),
        _ => (operation.success_status(), Json(body)).into_response(),
    }
}
