//! API Error Types
//!
//! Errors raised while talking to the admin backend, with the backend's own
//! `message` preserved for display.

use reqwest::StatusCode;
use thiserror::Error;

/// Backend API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Token missing, expired or rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Non-success status other than 401
    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    /// Backend could not be reached
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Request did not complete in time
    #[error("Request timeout")]
    Timeout,

    /// Body did not match the expected shape
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// Any other transport failure
    #[error("Request failed: {0}")]
    Request(reqwest::Error),
}

impl ApiError {
    /// Map a transport error onto the variants callers care about
    pub fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ApiError::Timeout
        } else if error.is_connect() {
            ApiError::Unavailable(error.to_string())
        } else if error.is_decode() {
            ApiError::InvalidResponse(error.to_string())
        } else {
            ApiError::Request(error)
        }
    }

    /// Build the error for a non-success response
    pub fn from_status(status: StatusCode, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

        if status == StatusCode::UNAUTHORIZED {
            ApiError::Unauthorized(message)
        } else {
            ApiError::Status {
                status: status.as_u16(),
                message,
            }
        }
    }

    /// HTTP status, when the backend answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message suitable for display: the backend's text when present
    pub fn display_message(&self) -> String {
        match self {
            ApiError::Unauthorized(message) | ApiError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the request never produced a response
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            ApiError::Unavailable(_) | ApiError::Timeout | ApiError::Request(_)
        )
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
