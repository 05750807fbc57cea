use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure while paging through the remote catalog.
///
/// Any of these aborts the whole fetch; entities from earlier pages are dropped.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("Request failed: {0}")]
    Network(String),

    #[error("Malformed listing response: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum AppError {
    #[error("Catalog fetch failed: {0}")]
    FetchError(#[from] FetchError),

    #[error("Invalid index snapshot: {0}")]
    InvalidSnapshotError(String),

    #[error("Registry returned no servers, refusing to build an empty index")]
    EmptyCatalogError,

    #[error("Index storage failed: {0}")]
    StorageError(String),

    #[error("Invalid input: {0}")]
    ValidationError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::FetchError(e) => {
                tracing::error!(error = %e, "Registry fetch error");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::EmptyCatalogError => {
                tracing::error!("Registry returned an empty catalog");
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            AppError::InvalidSnapshotError(msg) | AppError::StorageError(msg) => {
                tracing::error!(error = %msg, "Index storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::ValidationError(msg) => {
                tracing::warn!(error = %msg, "Validation error");
                (StatusCode::BAD_REQUEST, msg.clone())
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidSnapshotError(err.to_string())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
