//! Reasons a voucher cannot be applied.

use crate::money::Money;
use chrono::NaiveDate;
use thiserror::Error;

/// Why a voucher was refused. The `Display` text is what the customer sees.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VoucherRejection {
    #[error("Voucher does not exist")]
    Missing,

    #[error("Voucher \"{code}\" is no longer active")]
    Inactive { code: String },

    #[error("Voucher \"{code}\" has not been approved or was rejected")]
    NotApproved { code: String },

    #[error("Voucher \"{code}\" is not valid yet. Starts on {}", .starts.format("%d/%m/%Y"))]
    NotStarted { code: String, starts: NaiveDate },

    #[error("Voucher \"{code}\" has expired")]
    Expired { code: String },

    #[error("Voucher \"{code}\" has no uses left")]
    UsageExhausted { code: String },

    #[error("Order total must be greater than 0 to apply a voucher")]
    NonPositiveTotal,

    #[error("Voucher \"{code}\" requires an order of at least {minimum}. Current order: {total}")]
    BelowMinimum {
        code: String,
        minimum: Money,
        total: Money,
    },

    #[error("Voucher \"{code}\" applies to orders up to {maximum}. Current order: {total}")]
    AboveMaximum {
        code: String,
        maximum: Money,
        total: Money,
    },

    #[error("Voucher \"{code}\" does not apply to the selected products")]
    ProductMismatch { code: String },

    #[error("Voucher \"{code}\" has no eligible products")]
    NoEligibleProducts { code: String },

    #[error("Voucher \"{code}\" does not apply to the categories of the selected products")]
    CategoryMismatch { code: String },

    #[error("Voucher \"{code}\" has no eligible categories")]
    NoEligibleCategories { code: String },

    #[error("Voucher code must not be empty")]
    EmptyCode,

    #[error("Voucher code may only contain letters, digits, hyphens and underscores")]
    InvalidCodeFormat,

    #[error("Voucher \"{code}\" does not exist or is no longer available")]
    UnknownCode { code: String },

    #[error("You have already used voucher \"{code}\"")]
    AlreadyUsed { code: String },
}

impl VoucherRejection {
    /// Whether the rejection depends only on the voucher itself, not the order.
    pub fn is_voucher_state(&self) -> bool {
        matches!(
            self,
            VoucherRejection::Missing
                | VoucherRejection::Inactive { .. }
                | VoucherRejection::NotApproved { .. }
                | VoucherRejection::NotStarted { .. }
                | VoucherRejection::Expired { .. }
                | VoucherRejection::UsageExhausted { .. }
        )
    }
}
