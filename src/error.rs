//! API error type and its JSON rendering.

use crate::storage::StorageError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;

/// Field name to list of messages, rendered as-is for validation failures.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Errors surfaced to API clients.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or out-of-range input.
    Validation(FieldErrors),
    /// Request body could not be parsed at all.
    BadRequest(String),
    /// Duplicate relation add or self-follow.
    Conflict(String),
    /// Relation to remove does not exist, or the shopping cart is empty.
    Missing(String),
    /// Addressed object does not exist.
    NotFound,
    /// Requested page is past the end of the result set.
    InvalidPage,
    NotAuthenticated,
    InvalidToken,
    /// Authenticated, but not allowed to touch this object.
    PermissionDenied,
    Database(DbErr),
    Storage(StorageError),
    Internal(String),
}

impl ApiError {
    /// Validation failure on a single field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_owned(), vec![message.into()]);
        ApiError::Validation(errors)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(errors) => write!(f, "Validation failed: {:?}", errors),
            ApiError::BadRequest(msg) => write!(f, "{}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Missing(msg) => write!(f, "Missing: {}", msg),
            ApiError::NotFound => write!(f, "Not found."),
            ApiError::InvalidPage => write!(f, "Invalid page."),
            ApiError::NotAuthenticated => {
                write!(f, "Authentication credentials were not provided.")
            }
            ApiError::InvalidToken => write!(f, "Invalid token."),
            ApiError::PermissionDenied => {
                write!(f, "You do not have permission to perform this action.")
            }
            ApiError::Database(e) => write!(f, "Database error: {}", e),
            ApiError::Storage(e) => write!(f, "Storage error: {}", e),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<DbErr> for ApiError {
    fn from(e: DbErr) -> Self {
        ApiError::Database(e)
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        ApiError::Storage(e)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        ApiError::Validation(field_errors(&e))
    }
}

/// Flattens `validator` output into the field map clients receive.
pub fn field_errors(errors: &validator::ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value ({}).", e.code),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) | ApiError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Missing(_) | ApiError::NotFound | ApiError::InvalidPage => {
                StatusCode::NOT_FOUND
            }
            ApiError::NotAuthenticated | ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::PermissionDenied => StatusCode::FORBIDDEN,
            ApiError::Database(_) | ApiError::Storage(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Validation(errors) => json!(errors),
            ApiError::Conflict(msg) | ApiError::Missing(msg) => json!({ "errors": msg }),
            ApiError::Database(_) | ApiError::Storage(_) | ApiError::Internal(_) => {
                log::error!("{}", self);
                json!({ "detail": "Internal server error." })
            }
            _ => json!({ "detail": self.to_string() }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
