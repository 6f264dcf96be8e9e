//! Client error types.

use crate::config::ConfigError;
use crate::storage::StoreError;
use lila_commerce::voucher::VoucherRejection;
use lila_commerce::CommerceError;
use lila_data::FetchError;
use thiserror::Error;

/// Errors surfaced by the services, the checkout and the pollers.
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP 401 or one of the backend's authentication codes.
    #[error("Session expired, please sign in again")]
    Unauthorized,

    /// The backend rejected the request's content.
    #[error("{0}")]
    Validation(String),

    /// The voucher cannot be applied.
    #[error(transparent)]
    Voucher(#[from] VoucherRejection),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A backend business error not covered above.
    #[error("{message}")]
    Backend { code: i32, message: String },

    /// Network failure or a non-envelope HTTP error.
    #[error(transparent)]
    Fetch(FetchError),

    #[error(transparent)]
    Commerce(#[from] CommerceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An order submission is already running.
    #[error("An order is already being placed")]
    Busy,
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
            || matches!(self, ClientError::Commerce(CommerceError::NotSignedIn))
    }

    /// Backend error code, when the backend sent one.
    pub fn code(&self) -> Option<i32> {
        match self {
            ClientError::Backend { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<FetchError> for ClientError {
    fn from(e: FetchError) -> Self {
        if e.is_unauthorized() {
            return ClientError::Unauthorized;
        }
        match (e.code(), e) {
            (Some(code), FetchError::Api { message, .. }) if code.is_not_found() => {
                ClientError::NotFound(message)
            }
            (Some(code), FetchError::Api { message, .. }) if code.is_validation_error() => {
                ClientError::Validation(message)
            }
            (_, FetchError::Api { code, message, .. }) => ClientError::Backend { code, message },
            (_, FetchError::HttpError { status: 404, message }) => ClientError::NotFound(message),
            (_, other) => ClientError::Fetch(other),
        }
    }
}
