//! Discount vouchers.
//!
//! - [`Voucher`]: the entity and its wire format
//! - [`validate_voucher`] / [`calculate_voucher_discount`]: eligibility and amount
//! - [`StoreClock`]: the calendar day voucher windows are judged against

mod clock;
mod rejection;
mod types;
mod validation;

pub use clock::{StoreClock, STORE_UTC_OFFSET_HOURS};
pub use rejection::VoucherRejection;
pub use types::{ApplyScope, DiscountValueType, Voucher, VoucherStatus};
pub use validation::{
    calculate_voucher_discount, filter_applicable_vouchers, filter_applicable_vouchers_on,
    validate_voucher, validate_voucher_code_format, validate_voucher_on, OrderContext,
};
