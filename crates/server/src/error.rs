use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use services::services::{file_storage::FileStorageError, upload_policy::PolicyViolation};
use thiserror::Error;
use utils::response::ApiResponse;

pub const SERVER_ERROR_MESSAGE: &str = "Server error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    FileStorage(#[from] FileStorageError),
    #[error(transparent)]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Json(#[from] JsonRejection),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Database(sqlx::Error::RowNotFound) => {
                (StatusCode::NOT_FOUND, "Not found".to_string())
            }
            ApiError::Database(e) if db::is_unique_violation(e) => {
                (StatusCode::CONFLICT, "Already exists".to_string())
            }
            ApiError::FileStorage(e) => match e {
                FileStorageError::NotFound | FileStorageError::NoFilesInScope => {
                    (StatusCode::NOT_FOUND, e.to_string())
                }
                FileStorageError::DuplicateFilename(_) | FileStorageError::NumberCollision(_) => {
                    (StatusCode::CONFLICT, e.to_string())
                }
                FileStorageError::Policy(violation) => match violation {
                    PolicyViolation::InvalidFileType(_) => {
                        (StatusCode::UNSUPPORTED_MEDIA_TYPE, violation.to_string())
                    }
                    PolicyViolation::TooLarge { .. } => {
                        (StatusCode::PAYLOAD_TOO_LARGE, violation.to_string())
                    }
                    PolicyViolation::EmptyFilename => {
                        (StatusCode::BAD_REQUEST, violation.to_string())
                    }
                },
                FileStorageError::BlobMissing(_)
                | FileStorageError::BlobStore(_)
                | FileStorageError::Database(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    SERVER_ERROR_MESSAGE.to_string(),
                ),
            },
            ApiError::Multipart(e) => (e.status(), e.body_text()),
            ApiError::Json(e) => (e.status(), e.body_text()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                SERVER_ERROR_MESSAGE.to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!(error = %self, error_debug = ?self, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "Request rejected");
        }

        (status, Json(ApiResponse::<()>::error(&message))).into_response()
    }
}
