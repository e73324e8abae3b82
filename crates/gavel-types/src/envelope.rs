//! API response envelope for the inbound marketplace surface.
//!
//! Every request/response operation returns an explicit success flag, a
//! human-readable message, and a payload. Failures carry a summarized
//! message only — gateway internals never leak past the error's own
//! display string.

use serde::{Deserialize, Serialize};

use crate::GavelError;

/// Uniform response wrapper for the inbound API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// A successful response with a payload.
    #[must_use]
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    /// A failed response. No payload; the message is all the client gets.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    /// Collapse a `Result` into an envelope, using the error's display
    /// string as the failure message.
    #[must_use]
    pub fn from_result(message: impl Into<String>, result: crate::Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(message, data),
            Err(err) => Self::failure(err.to_string()),
        }
    }
}

impl<T> From<GavelError> for ApiResponse<T> {
    fn from(err: GavelError) -> Self {
        Self::failure(err.to_string())
    }
}
