use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

/// Request-scoped failures. None of these take the process or the store down.
#[derive(Debug)]
pub enum AppError {
    InvalidIdentifier(String),
    MalformedBody(String),
    NotFound(i64),
    // Not produced while the lookup and merge of an update share the store lock.
    #[allow(dead_code)]
    InternalInconsistency(i64),
}

impl AppError {
    /// Message returned to the client in the `error` field.
    pub fn public_message(&self) -> &'static str {
        match self {
            AppError::InvalidIdentifier(_) => "Invalid user ID",
            AppError::MalformedBody(_) => "Invalid JSON",
            AppError::NotFound(_) => "User not found",
            AppError::InternalInconsistency(_) => "Failed to update user",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidIdentifier(raw) => write!(f, "Invalid user ID: {:?}", raw),
            AppError::MalformedBody(msg) => write!(f, "Invalid JSON: {}", msg),
            AppError::NotFound(id) => write!(f, "User not found: {}", id),
            AppError::InternalInconsistency(id) => {
                write!(f, "Failed to update user {} after existence check", id)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidIdentifier(_) | AppError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalInconsistency(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "error": self.public_message()
        }))
    }
}
