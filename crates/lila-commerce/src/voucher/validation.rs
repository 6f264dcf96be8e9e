//! Voucher eligibility and discount rules.
//!
//! The backend re-checks everything on apply; these rules exist so the
//! storefront can hide unusable vouchers and explain refusals up front.

use super::clock::StoreClock;
use super::rejection::VoucherRejection;
use super::types::{ApplyScope, DiscountValueType, Voucher, VoucherStatus};
use crate::money::Money;
use chrono::NaiveDate;
use std::collections::HashSet;

/// The products and categories in the order being priced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderContext {
    pub product_ids: HashSet<String>,
    pub category_ids: HashSet<String>,
}

impl OrderContext {
    /// An order with no scope information.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add product ids.
    pub fn with_products<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.product_ids
            .extend(ids.into_iter().map(|id| id.as_ref().to_string()));
        self
    }

    /// Add category ids.
    pub fn with_categories<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.category_ids
            .extend(ids.into_iter().map(|id| id.as_ref().to_string()));
        self
    }
}

/// Check a voucher against an order using the store's current day.
pub fn validate_voucher(
    voucher: Option<&Voucher>,
    order_total: Money,
    ctx: &OrderContext,
) -> Result<(), VoucherRejection> {
    validate_voucher_on(voucher, order_total, ctx, StoreClock::default().today())
}

/// Check a voucher against an order as of `today`.
///
/// Checks run in a fixed order and the first failure wins: existence,
/// active flag, approval, date window, usage cap, order total, min/max
/// bounds, then scope.
pub fn validate_voucher_on(
    voucher: Option<&Voucher>,
    order_total: Money,
    ctx: &OrderContext,
    today: NaiveDate,
) -> Result<(), VoucherRejection> {
    let voucher = voucher.ok_or(VoucherRejection::Missing)?;
    check_voucher_state(voucher, today)?;

    if order_total.is_non_positive() {
        return Err(VoucherRejection::NonPositiveTotal);
    }

    let code = || voucher.code.clone();

    if let Some(minimum) = voucher.min_order_value.filter(Money::is_positive) {
        if order_total < minimum {
            return Err(VoucherRejection::BelowMinimum {
                code: code(),
                minimum,
                total: order_total,
            });
        }
    }

    if let Some(maximum) = voucher.max_order_value.filter(Money::is_positive) {
        if order_total > maximum {
            return Err(VoucherRejection::AboveMaximum {
                code: code(),
                maximum,
                total: order_total,
            });
        }
    }

    match voucher.apply_scope {
        ApplyScope::Order => Ok(()),
        ApplyScope::Product => {
            if voucher.product_apply.is_empty() {
                Err(VoucherRejection::NoEligibleProducts { code: code() })
            } else if intersects(&voucher.product_apply, &ctx.product_ids) {
                Ok(())
            } else {
                Err(VoucherRejection::ProductMismatch { code: code() })
            }
        }
        ApplyScope::Category => {
            if voucher.category_apply.is_empty() {
                Err(VoucherRejection::NoEligibleCategories { code: code() })
            } else if intersects(&voucher.category_apply, &ctx.category_ids) {
                Ok(())
            } else {
                Err(VoucherRejection::CategoryMismatch { code: code() })
            }
        }
    }
}

/// Checks that depend only on the voucher and the day.
fn check_voucher_state(voucher: &Voucher, today: NaiveDate) -> Result<(), VoucherRejection> {
    let code = || voucher.code.clone();

    if !voucher.is_active {
        return Err(VoucherRejection::Inactive { code: code() });
    }
    if voucher.status != VoucherStatus::Approved {
        return Err(VoucherRejection::NotApproved { code: code() });
    }
    if let Some(starts) = voucher.start_date {
        if today < starts {
            return Err(VoucherRejection::NotStarted {
                code: code(),
                starts,
            });
        }
    }
    // Usable through the whole expiry day.
    if let Some(expiry) = voucher.expiry_date {
        if today > expiry {
            return Err(VoucherRejection::Expired { code: code() });
        }
    }
    if voucher.is_exhausted() {
        return Err(VoucherRejection::UsageExhausted { code: code() });
    }
    Ok(())
}

fn intersects(allowed: &[String], present: &HashSet<String>) -> bool {
    allowed.iter().any(|id| present.contains(id))
}

/// Discount the voucher grants on `order_total`, in whole dong.
///
/// Percentage discounts are capped by `max_discount_value` when positive;
/// every discount is clamped to the order total.
pub fn calculate_voucher_discount(voucher: &Voucher, order_total: Money) -> Money {
    if order_total.is_non_positive() {
        return Money::ZERO;
    }

    let total = order_total.as_f64();
    let mut discount = match voucher.discount_value_type {
        DiscountValueType::Percentage => {
            let raw = total * voucher.discount_value / 100.0;
            match voucher.max_discount_value.filter(Money::is_positive) {
                Some(cap) => raw.min(cap.as_f64()),
                None => raw,
            }
        }
        DiscountValueType::Fixed => voucher.discount_value,
    };

    discount = discount.min(total).max(0.0);
    Money::from_f64(discount)
}

/// The vouchers from `vouchers` that `validate_voucher_on` accepts.
pub fn filter_applicable_vouchers_on<'a>(
    vouchers: &'a [Voucher],
    order_total: Money,
    ctx: &OrderContext,
    today: NaiveDate,
) -> Vec<&'a Voucher> {
    if order_total.is_non_positive() {
        return Vec::new();
    }
    vouchers
        .iter()
        .filter(|v| validate_voucher_on(Some(*v), order_total, ctx, today).is_ok())
        .collect()
}

/// The vouchers from `vouchers` usable today.
pub fn filter_applicable_vouchers<'a>(
    vouchers: &'a [Voucher],
    order_total: Money,
    ctx: &OrderContext,
) -> Vec<&'a Voucher> {
    filter_applicable_vouchers_on(vouchers, order_total, ctx, StoreClock::default().today())
}

/// Trim and uppercase a typed code, rejecting anything outside `[A-Z0-9_-]`.
pub fn validate_voucher_code_format(code: &str) -> Result<String, VoucherRejection> {
    let normalized = code.trim().to_uppercase();
    if normalized.is_empty() {
        return Err(VoucherRejection::EmptyCode);
    }
    let well_formed = normalized
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if !well_formed {
        return Err(VoucherRejection::InvalidCodeFormat);
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        day(2025, 6, 15)
    }

    fn check(v: &Voucher, total: i64) -> Result<(), VoucherRejection> {
        validate_voucher_on(Some(v), Money::new(total), &OrderContext::new(), today())
    }

    #[test]
    fn test_missing_voucher() {
        let result = validate_voucher_on(None, Money::new(1000), &OrderContext::new(), today());
        assert_eq!(result, Err(VoucherRejection::Missing));
    }

    #[test]
    fn test_inactive_checked_before_status() {
        let mut v = Voucher::percentage("OFF", 10.0);
        v.is_active = false;
        v.status = VoucherStatus::Rejected;
        assert!(matches!(check(&v, 1000), Err(VoucherRejection::Inactive { .. })));
    }

    #[test]
    fn test_unapproved_statuses_rejected() {
        for status in [
            VoucherStatus::Pending,
            VoucherStatus::Rejected,
            VoucherStatus::Expired,
            VoucherStatus::Cancelled,
        ] {
            let mut v = Voucher::percentage("S", 10.0);
            v.status = status;
            assert!(matches!(check(&v, 1000), Err(VoucherRejection::NotApproved { .. })));
        }
    }

    #[test]
    fn test_date_window_is_inclusive() {
        let v = Voucher::percentage("W", 10.0).valid_between(Some(today()), Some(today()));
        assert!(check(&v, 1000).is_ok());

        let v = Voucher::percentage("W", 10.0).valid_between(Some(day(2025, 6, 16)), None);
        assert!(matches!(check(&v, 1000), Err(VoucherRejection::NotStarted { .. })));

        let v = Voucher::percentage("W", 10.0).valid_between(None, Some(day(2025, 6, 14)));
        assert!(matches!(check(&v, 1000), Err(VoucherRejection::Expired { .. })));
    }

    #[test]
    fn test_usage_cap() {
        let v = Voucher::percentage("U", 10.0).with_usage(10, 10);
        assert!(matches!(check(&v, 1000), Err(VoucherRejection::UsageExhausted { .. })));
        let v = Voucher::percentage("U", 10.0).with_usage(10, 9);
        assert!(check(&v, 1000).is_ok());
    }

    #[test]
    fn test_non_positive_total() {
        let v = Voucher::percentage("Z", 10.0);
        assert_eq!(check(&v, 0), Err(VoucherRejection::NonPositiveTotal));
        assert_eq!(check(&v, -5), Err(VoucherRejection::NonPositiveTotal));
    }

    #[test]
    fn test_order_bounds() {
        let v = Voucher::fixed("B", Money::new(10_000))
            .for_orders_between(Some(Money::new(100_000)), Some(Money::new(500_000)));
        assert!(matches!(check(&v, 99_999), Err(VoucherRejection::BelowMinimum { .. })));
        assert!(check(&v, 100_000).is_ok());
        assert!(check(&v, 500_000).is_ok());
        assert!(matches!(check(&v, 500_001), Err(VoucherRejection::AboveMaximum { .. })));
    }

    #[test]
    fn test_zero_bounds_are_ignored() {
        let v = Voucher::fixed("B", Money::new(10_000))
            .for_orders_between(Some(Money::ZERO), Some(Money::ZERO));
        assert!(check(&v, 5_000_000).is_ok());
    }

    #[test]
    fn test_category_scope() {
        let v = Voucher::percentage("CAT", 10.0).for_categories(["catA"]);
        let b = OrderContext::new().with_categories(["catB"]);
        let a = OrderContext::new().with_categories(["catB", "catA"]);
        assert!(matches!(
            validate_voucher_on(Some(&v), Money::new(1000), &b, today()),
            Err(VoucherRejection::CategoryMismatch { .. })
        ));
        assert!(validate_voucher_on(Some(&v), Money::new(1000), &a, today()).is_ok());
    }

    #[test]
    fn test_product_scope() {
        let v = Voucher::percentage("P", 10.0).for_products(["1", "2"]);
        let ctx = OrderContext::new().with_products(["2"]);
        assert!(validate_voucher_on(Some(&v), Money::new(1000), &ctx, today()).is_ok());
        let ctx = OrderContext::new().with_products(["3"]);
        assert!(matches!(
            validate_voucher_on(Some(&v), Money::new(1000), &ctx, today()),
            Err(VoucherRejection::ProductMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_allow_list_always_fails() {
        let v = Voucher::percentage("P", 10.0).for_products(Vec::<String>::new());
        let ctx = OrderContext::new().with_products(["anything"]);
        assert!(matches!(
            validate_voucher_on(Some(&v), Money::new(1000), &ctx, today()),
            Err(VoucherRejection::NoEligibleProducts { .. })
        ));

        let v = Voucher::percentage("C", 10.0).for_categories(Vec::<String>::new());
        assert!(matches!(
            validate_voucher_on(Some(&v), Money::new(1000), &ctx, today()),
            Err(VoucherRejection::NoEligibleCategories { .. })
        ));
    }

    #[test]
    fn test_percentage_discount_capped() {
        let v = Voucher::percentage("P20", 20.0).capped_at(Money::new(50_000));
        assert_eq!(
            calculate_voucher_discount(&v, Money::new(1_000_000)),
            Money::new(50_000)
        );
    }

    #[test]
    fn test_percentage_discount_uncapped_rounds() {
        let v = Voucher::percentage("P", 12.5);
        assert_eq!(calculate_voucher_discount(&v, Money::new(1_001)), Money::new(125));
    }

    #[test]
    fn test_fixed_discount_clamped_to_total() {
        let v = Voucher::fixed("F", Money::new(30_000));
        assert_eq!(calculate_voucher_discount(&v, Money::new(10_000)), Money::new(10_000));
        assert_eq!(calculate_voucher_discount(&v, Money::new(90_000)), Money::new(30_000));
    }

    #[test]
    fn test_discount_zero_for_non_positive_total() {
        let v = Voucher::fixed("F", Money::new(30_000));
        assert_eq!(calculate_voucher_discount(&v, Money::ZERO), Money::ZERO);
    }

    #[test]
    fn test_filter_matches_validate() {
        let mut pending = Voucher::percentage("PENDING", 5.0);
        pending.status = VoucherStatus::Pending;
        let vouchers = vec![
            Voucher::percentage("OK", 5.0),
            pending,
            Voucher::fixed("MIN", Money::new(1)).for_orders_between(Some(Money::new(1_000_000)), None),
            Voucher::percentage("CAT", 5.0).for_categories(["c1"]),
        ];
        let ctx = OrderContext::new().with_categories(["c1"]);
        let applicable = filter_applicable_vouchers_on(&vouchers, Money::new(50_000), &ctx, today());
        let codes: Vec<_> = applicable.iter().map(|v| v.code.as_str()).collect();
        assert_eq!(codes, vec!["OK", "CAT"]);

        assert!(filter_applicable_vouchers_on(&vouchers, Money::ZERO, &ctx, today()).is_empty());
    }

    #[test]
    fn test_code_format() {
        assert_eq!(
            validate_voucher_code_format("  abc-123_X "),
            Ok("ABC-123_X".to_string())
        );
        assert_eq!(
            validate_voucher_code_format("abc def"),
            Err(VoucherRejection::InvalidCodeFormat)
        );
        assert_eq!(validate_voucher_code_format("   "), Err(VoucherRejection::EmptyCode));
        assert_eq!(
            validate_voucher_code_format("giảm"),
            Err(VoucherRejection::InvalidCodeFormat)
        );
    }
}
