//! The backend's response envelope and error codes.
//!
//! Every backend endpoint wraps its payload as
//! `{ "code": 1000, "message": "...", "result": ... }`. Errors use the same
//! shape with a non-success `code`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Envelope code the backend uses for success.
pub const SUCCESS_CODE: i32 = 1000;

/// A decoded envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub result: Option<T>,
    /// GHN passthrough endpoints keep GHN's own `{ code: 200, data }` shape.
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// No code, `1000`, or a plain `200` all mean success.
    pub fn is_success(&self) -> bool {
        matches!(self.code, None | Some(SUCCESS_CODE) | Some(200))
    }
}

impl ApiResponse<serde_json::Value> {
    /// Decode `result` into `T`.
    pub fn into_result<T: DeserializeOwned>(self) -> Result<Option<T>, serde_json::Error> {
        match self.result.or(self.data) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value).map(Some),
        }
    }
}

macro_rules! error_codes {
    ($($name:ident = $code:literal),+ $(,)?) => {
        /// Backend error codes.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ErrorCode {
            $($name,)+
            /// A code this client does not know.
            Unknown(i32),
        }

        impl ErrorCode {
            pub fn from_code(code: i32) -> Self {
                match code {
                    $($code => ErrorCode::$name,)+
                    other => ErrorCode::Unknown(other),
                }
            }

            pub fn code(&self) -> i32 {
                match self {
                    $(ErrorCode::$name => $code,)+
                    ErrorCode::Unknown(code) => *code,
                }
            }
        }
    };
}

error_codes! {
    UncategorizedException = 9999,
    InvalidKey = 1001,
    UserExisted = 1002,
    InvalidPassword = 1003,
    UserNotExisted = 1004,
    Unauthenticated = 1005,
    AccountLocked = 1006,
    Unauthorized = 1007,
    InvalidDob = 1008,
    EmailSendFailed = 1009,
    InvalidOtp = 1010,
    TicketNotExisted = 1011,

    PromotionNotExisted = 2001,
    PromotionNotPending = 2002,
    InvalidPromotionScope = 2003,
    PromotionProductConflict = 2004,
    PromotionCodeAlreadyExists = 2005,
    PromotionOverlapConflict = 2006,

    VoucherNotExisted = 3001,
    VoucherCodeAlreadyExists = 3002,
    VoucherNotPending = 3003,
    VoucherExpired = 3004,
    VoucherSoldOut = 3005,
    InvalidVoucherMinimum = 3006,
    InvalidVoucherScope = 3007,
    VoucherUsageLimitExceeded = 3008,
    VoucherAlreadyUsed = 3009,

    BannerNotExisted = 4001,
    ReviewNotExisted = 5001,

    ProductNotExisted = 6001,
    OutOfStock = 6002,
    ProductAlreadyExists = 6003,
    CategoryNotExisted = 6004,
    CategoryAlreadyExists = 6005,
    CategoryHasProducts = 6006,
    CategoryHasSubcategories = 6007,

    CartItemNotExisted = 7001,
    OrderNotExisted = 7002,
    ExternalServiceError = 7003,
    AddressNotExisted = 7004,
    ShipmentNotExisted = 7005,
    BadRequest = 7006,

    FileUploadFailed = 8001,
    NotificationNotExisted = 9001,
}

impl ErrorCode {
    /// The session is missing, expired, or the account is locked.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::Unauthenticated | ErrorCode::Unauthorized | ErrorCode::AccountLocked
        )
    }

    /// The request was rejected because of its content.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::CategoryAlreadyExists
                | ErrorCode::ProductAlreadyExists
                | ErrorCode::VoucherCodeAlreadyExists
                | ErrorCode::PromotionCodeAlreadyExists
                | ErrorCode::InvalidPassword
                | ErrorCode::InvalidOtp
                | ErrorCode::BadRequest
        )
    }

    /// An entity lookup failed.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ErrorCode::UserNotExisted
                | ErrorCode::TicketNotExisted
                | ErrorCode::PromotionNotExisted
                | ErrorCode::VoucherNotExisted
                | ErrorCode::BannerNotExisted
                | ErrorCode::ReviewNotExisted
                | ErrorCode::ProductNotExisted
                | ErrorCode::CategoryNotExisted
                | ErrorCode::CartItemNotExisted
                | ErrorCode::OrderNotExisted
                | ErrorCode::AddressNotExisted
                | ErrorCode::ShipmentNotExisted
                | ErrorCode::NotificationNotExisted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_code_roundtrip_values() {
        assert_eq!(ErrorCode::from_code(3009), ErrorCode::VoucherAlreadyUsed);
        assert_eq!(ErrorCode::VoucherAlreadyUsed.code(), 3009);
        assert_eq!(ErrorCode::from_code(4242), ErrorCode::Unknown(4242));
        assert_eq!(ErrorCode::Unknown(4242).code(), 4242);
    }

    #[test]
    fn test_classification() {
        for code in [1005, 1006, 1007] {
            assert!(ErrorCode::from_code(code).is_auth_error());
        }
        assert!(!ErrorCode::from_code(1004).is_auth_error());
        assert!(ErrorCode::BadRequest.is_validation_error());
        assert!(ErrorCode::InvalidOtp.is_validation_error());
        assert!(!ErrorCode::VoucherExpired.is_validation_error());
        assert!(ErrorCode::AddressNotExisted.is_not_found());
    }

    #[test]
    fn test_envelope_decode() {
        let env: ApiResponse<serde_json::Value> =
            serde_json::from_value(json!({"code": 1000, "result": {"id": "c1"}})).unwrap();
        assert!(env.is_success());
        let result: Option<serde_json::Map<String, serde_json::Value>> =
            env.into_result().unwrap();
        assert_eq!(result.unwrap()["id"], "c1");

        let env: ApiResponse<serde_json::Value> =
            serde_json::from_value(json!({"code": 3009, "message": "used"})).unwrap();
        assert!(!env.is_success());
        assert_eq!(env.message.as_deref(), Some("used"));
    }

    #[test]
    fn test_ghn_shape() {
        let env: ApiResponse<serde_json::Value> =
            serde_json::from_value(json!({"code": 200, "message": "Success", "data": {"total": 32000}}))
                .unwrap();
        assert!(env.is_success());
        let data: Option<serde_json::Value> = env.into_result().unwrap();
        assert_eq!(data.unwrap()["total"], 32000);
    }

    #[test]
    fn test_envelope_null_result() {
        let env: ApiResponse<serde_json::Value> =
            serde_json::from_value(json!({"code": 1000, "result": null})).unwrap();
        let result: Option<i64> = env.into_result().unwrap();
        assert_eq!(result, None);
    }
}
