//! HTTP client error types.

use crate::envelope::ErrorCode;
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Failed to send the request.
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTTP error response without a backend envelope.
    #[error("HTTP {status}: {message}")]
    HttpError { status: u16, message: String },

    /// The backend answered with its error envelope.
    #[error("{message} (code {code})")]
    Api {
        status: u16,
        code: i32,
        message: String,
    },

    /// Failed to parse response body.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Request timeout.
    #[error("Request timed out")]
    Timeout,

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(String),
}

impl FetchError {
    /// HTTP status, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::HttpError { status, .. } | FetchError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Backend error code from the envelope.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            FetchError::Api { code, .. } => Some(ErrorCode::from_code(*code)),
            _ => None,
        }
    }

    /// HTTP 401 or one of the backend's authentication codes.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401) || self.code().is_some_and(|c| c.is_auth_error())
    }

    /// Whether the request never produced a response.
    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::RequestError(_) | FetchError::Timeout)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::JsonError(e.to_string())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_builder() {
            FetchError::InvalidUrl(e.to_string())
        } else {
            FetchError::RequestError(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_by_status_or_code() {
        let http = FetchError::HttpError {
            status: 401,
            message: String::new(),
        };
        assert!(http.is_unauthorized());

        let locked = FetchError::Api {
            status: 403,
            code: 1006,
            message: "Account locked".into(),
        };
        assert!(locked.is_unauthorized());

        let voucher = FetchError::Api {
            status: 400,
            code: 3009,
            message: "used".into(),
        };
        assert!(!voucher.is_unauthorized());
        assert_eq!(voucher.code(), Some(ErrorCode::VoucherAlreadyUsed));
        assert!(!FetchError::Timeout.is_unauthorized());
    }

    #[test]
    fn test_api_error_display() {
        let err = FetchError::Api {
            status: 400,
            code: 3009,
            message: "Voucher already used".into(),
        };
        assert_eq!(err.to_string(), "Voucher already used (code 3009)");
    }
}
