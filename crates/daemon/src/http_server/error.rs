use axum::http::header::{ALLOW, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use common::prelude::{BlobError, PathError, ResolveError};

/// Every way a store request can fail.
///
/// `NotFound` and `Forbidden` are the answers the access rules give.
/// `Inconsistent` means the catalog points at bytes that are not there and
/// is never reported as a 404.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("artifact {0} is recorded but its blob is missing")]
    Inconsistent(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            StoreError::NotFound => StatusCode::NOT_FOUND,
            StoreError::Forbidden => StatusCode::FORBIDDEN,
            StoreError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            StoreError::Inconsistent(_) | StoreError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<PathError> for StoreError {
    fn from(e: PathError) -> Self {
        tracing::debug!("rejected request path: {}", e);
        StoreError::NotFound
    }
}

impl From<ResolveError<sqlx::Error>> for StoreError {
    fn from(e: ResolveError<sqlx::Error>) -> Self {
        match e {
            ResolveError::NotFound => StoreError::NotFound,
            ResolveError::Forbidden => StoreError::Forbidden,
            ResolveError::Catalog(e) => StoreError::Internal(e.to_string()),
        }
    }
}

impl From<BlobError> for StoreError {
    fn from(e: BlobError) -> Self {
        match e {
            BlobError::Missing(key) => StoreError::Inconsistent(key),
            e => StoreError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            StoreError::Inconsistent(_) | StoreError::Internal(_) => {
                tracing::error!("{}", self);
            }
            _ => {}
        }

        let body = match self {
            StoreError::Inconsistent(_) | StoreError::Internal(_) => "internal server error",
            StoreError::NotFound => "not found",
            StoreError::Forbidden => "forbidden",
            StoreError::MethodNotAllowed => {
                return (
                    status,
                    [(ALLOW, "GET, HEAD"), (CONTENT_TYPE, "text/plain")],
                    "method not allowed",
                )
                    .into_response();
            }
        };

        (status, [(CONTENT_TYPE, "text/plain")], body).into_response()
    }
}
