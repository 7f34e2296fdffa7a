use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::archive::ArchiveError;
use crate::ashby::AshbyError;
use crate::pdf::PdfError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream error (status {}): {message}", status_label(.status))]
    Upstream { status: Option<u16>, message: String },

    #[error("Unprocessable input: {0}")]
    UnprocessableInput(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

fn status_label(status: &Option<u16>) -> String {
    status.map_or_else(|| "none".to_string(), |s| s.to_string())
}

impl From<AshbyError> for AppError {
    fn from(err: AshbyError) -> Self {
        match err {
            AshbyError::NotFound(what) => AppError::NotFound(what),
            other => AppError::Upstream {
                status: other.status(),
                message: other.to_string(),
            },
        }
    }
}

impl From<PdfError> for AppError {
    fn from(err: PdfError) -> Self {
        match err {
            PdfError::InvalidGroupSize(_) => AppError::InvalidArgument(err.to_string()),
            PdfError::Unprocessable { .. } => AppError::UnprocessableInput(err.to_string()),
            PdfError::Write(_) => AppError::Internal(anyhow::Error::new(err)),
        }
    }
}

impl From<ArchiveError> for AppError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::InvalidArchive(_)
            | ArchiveError::NoPdfEntries
            | ArchiveError::TooLarge { .. } => {
                AppError::InvalidArgument(err.to_string())
            }
            ArchiveError::DuplicateName(_) | ArchiveError::Write(_) | ArchiveError::Io(_) => {
                AppError::Internal(anyhow::Error::new(err))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::InvalidArgument(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", msg.clone())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Upstream { .. } => {
                tracing::error!("{self}");
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", self.to_string())
            }
            AppError::UnprocessableInput(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_INPUT",
                msg.clone(),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
