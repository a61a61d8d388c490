use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::assets::UploadError;
use crate::storage::StoreError;
use crate::utils::response::error as error_response;

/// Which store operation failed, used to word the 500 message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAction {
    Create,
    Fetch,
    Update,
    Delete,
}

impl fmt::Display for StoreAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StoreAction::Create => "Event Creation Failed",
            StoreAction::Fetch => "Event Fetch Failed",
            StoreAction::Update => "Event Update Failed",
            StoreAction::Delete => "Event Deletion Failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid form data: {0}")]
    Decode(String),

    #[error("Event ID is required")]
    MissingId,

    #[error("Image file is required")]
    MissingImage,

    #[error("Image upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Event with ID {0} not found")]
    NotFound(String),

    #[error("{action}: {source}")]
    Store {
        action: StoreAction,
        #[source]
        source: StoreError,
    },
}

impl AppError {
    /// Converts a store failure, routing schema violations to `Validation`.
    pub fn store(action: StoreAction) -> impl FnOnce(StoreError) -> AppError {
        move |source| match source {
            StoreError::Validation(msg) => AppError::Validation(msg),
            source => AppError::Store { action, source },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Decode(_) => StatusCode::BAD_REQUEST,
            AppError::MissingId => StatusCode::BAD_REQUEST,
            AppError::MissingImage => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Decode(_) | AppError::MissingId => "DECODE_ERROR",
            AppError::MissingImage => "MISSING_IMAGE",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Upload(_) => "UPLOAD_ERROR",
            AppError::Store { .. } => "STORE_ERROR",
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Decode(_) => "Invalid form data".to_string(),
            AppError::Validation(_) => "Validation failed".to_string(),
            AppError::Upload(_) => "Image upload failed".to_string(),
            AppError::Store { action, .. } => action.to_string(),
            AppError::MissingId | AppError::MissingImage | AppError::NotFound(_) => {
                self.to_string()
            }
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            AppError::Decode(detail) | AppError::Validation(detail) => Some(detail.clone()),
            AppError::Upload(e) => Some(e.to_string()),
            AppError::Store { source, .. } => Some(source.to_string()),
            AppError::MissingId | AppError::MissingImage | AppError::NotFound(_) => None,
        }
    }

    fn log(&self) {
        match self {
            AppError::Upload(e) => {
                error!(error = ?e, "Asset upload error");
            }
            AppError::Store { action, source } => {
                error!(error = ?source, action = %action, "Event store error");
            }
            _ => {
                warn!(code = self.code(), message = %self, "Request rejected");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        error_response(
            self.code(),
            self.public_message(),
            self.details(),
            self.status_code(),
        )
    }
}
