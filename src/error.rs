use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt::Display;

use crate::repository::StoreError;

pub type AppResult<T> = Result<T, AppError>;

pub const INTERNAL_ERROR_MESSAGE: &str = "An unhandled exception occurred.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingParameter,
    InvalidParameter,
    ReferenceNotFound,
    NotFound,
    DuplicateKey,
    Conflict,
    InternalError,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::MissingParameter
            | ErrorKind::InvalidParameter
            | ErrorKind::ReferenceNotFound => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::DuplicateKey | ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn missing_parameter(field: &str) -> Self {
        Self::new(
            ErrorKind::MissingParameter,
            format!("missing required parameter: {field}"),
        )
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParameter, message)
    }

    pub fn reference_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ReferenceNotFound, message)
    }

    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound, "resource not found")
    }

    pub fn duplicate_code(code: &str) -> Self {
        Self::new(ErrorKind::DuplicateKey, format!("Code {code} already exists"))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Logs the underlying error and hides it behind a generic message.
    pub fn internal<E: Display>(error: E) -> Self {
        tracing::error!(error = %error, "unhandled error while serving request");
        Self::new(ErrorKind::InternalError, INTERNAL_ERROR_MESSAGE)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(MessageResponse {
            message: self.message,
        });
        (status, body).into_response()
    }
}

/// Body shared by every non-list response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn ok() -> Self {
        Self {
            message: "OK".to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => AppError::not_found(),
            StoreError::DuplicateKey => {
                AppError::new(ErrorKind::DuplicateKey, "record already exists")
            }
            StoreError::ForeignKeyViolation => {
                AppError::conflict("record is still referenced by other records")
            }
            other => AppError::internal(other),
        }
    }
}
