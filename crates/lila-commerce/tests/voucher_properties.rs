//! Property-based tests for voucher validation.

use chrono::NaiveDate;
use lila_commerce::voucher::{
    calculate_voucher_discount, filter_applicable_vouchers_on, validate_voucher_code_format,
    validate_voucher_on, ApplyScope, DiscountValueType, OrderContext, Voucher, VoucherStatus,
};
use lila_commerce::Money;
use proptest::prelude::*;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

fn status_strategy() -> impl Strategy<Value = VoucherStatus> {
    prop_oneof![
        Just(VoucherStatus::Pending),
        Just(VoucherStatus::Approved),
        Just(VoucherStatus::Rejected),
        Just(VoucherStatus::Expired),
        Just(VoucherStatus::Cancelled),
    ]
}

fn scope_strategy() -> impl Strategy<Value = (ApplyScope, Vec<String>)> {
    let ids = prop::collection::vec("[a-d]", 0..3);
    prop_oneof![
        Just((ApplyScope::Order, Vec::new())),
        ids.clone().prop_map(|ids| (ApplyScope::Product, ids)),
        ids.prop_map(|ids| (ApplyScope::Category, ids)),
    ]
}

fn optional_money() -> impl Strategy<Value = Option<Money>> {
    prop::option::of((0i64..2_000_000).prop_map(Money::new))
}

prop_compose! {
    fn voucher_strategy()(
        code in "[A-Z0-9]{3,10}",
        percentage in any::<bool>(),
        value in 0.0f64..150_000.0,
        cap in optional_money(),
        min in optional_money(),
        max in optional_money(),
        (scope, ids) in scope_strategy(),
        start_offset in prop::option::of(-30i64..30),
        expiry_offset in prop::option::of(-30i64..30),
        usage in prop::option::of((0i64..5, 0i64..5)),
        is_active in any::<bool>(),
        status in status_strategy(),
    ) -> Voucher {
        let mut v = if percentage {
            Voucher::percentage(code, value % 100.0)
        } else {
            Voucher::fixed(code, Money::from_f64(value))
        };
        v.max_discount_value = cap;
        v.min_order_value = min;
        v.max_order_value = max;
        v.apply_scope = scope;
        match scope {
            ApplyScope::Product => v.product_apply = ids,
            ApplyScope::Category => v.category_apply = ids,
            ApplyScope::Order => {}
        }
        v.start_date = start_offset.map(|d| today() + chrono::Duration::days(d));
        v.expiry_date = expiry_offset.map(|d| today() + chrono::Duration::days(d));
        if let Some((limit, count)) = usage {
            v = v.with_usage(limit, count);
        }
        v.is_active = is_active;
        v.status = status;
        v
    }
}

fn context_strategy() -> impl Strategy<Value = OrderContext> {
    (
        prop::collection::vec("[a-d]", 0..3),
        prop::collection::vec("[a-d]", 0..3),
    )
        .prop_map(|(products, categories)| {
            OrderContext::new()
                .with_products(products)
                .with_categories(categories)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn inactive_or_unapproved_vouchers_never_validate(
        mut voucher in voucher_strategy(),
        total in 1i64..5_000_000,
        ctx in context_strategy(),
        deactivate in any::<bool>(),
    ) {
        if deactivate {
            voucher.is_active = false;
        } else if voucher.status == VoucherStatus::Approved {
            voucher.status = VoucherStatus::Rejected;
        }
        prop_assert!(validate_voucher_on(Some(&voucher), Money::new(total), &ctx, today()).is_err());
    }

    #[test]
    fn non_positive_totals_never_validate(
        voucher in voucher_strategy(),
        total in -1_000_000i64..=0,
        ctx in context_strategy(),
    ) {
        prop_assert!(validate_voucher_on(Some(&voucher), Money::new(total), &ctx, today()).is_err());
    }

    #[test]
    fn discount_stays_within_order_total(
        voucher in voucher_strategy(),
        total in -1_000i64..5_000_000,
    ) {
        let discount = calculate_voucher_discount(&voucher, Money::new(total));
        prop_assert!(discount >= Money::ZERO);
        prop_assert!(discount <= Money::new(total.max(0)));
    }

    #[test]
    fn percentage_discount_respects_cap(
        percent in 0.0f64..100.0,
        cap in 1i64..500_000,
        total in 1i64..5_000_000,
    ) {
        let voucher = Voucher::percentage("CAP", percent).capped_at(Money::new(cap));
        prop_assert_eq!(voucher.discount_value_type, DiscountValueType::Percentage);
        prop_assert!(calculate_voucher_discount(&voucher, Money::new(total)) <= Money::new(cap));
    }

    #[test]
    fn filter_agrees_with_validate(
        vouchers in prop::collection::vec(voucher_strategy(), 0..12),
        total in -10_000i64..3_000_000,
        ctx in context_strategy(),
    ) {
        let filtered: Vec<&str> =
            filter_applicable_vouchers_on(&vouchers, Money::new(total), &ctx, today())
                .into_iter()
                .map(|v| v.code.as_str())
                .collect();
        let expected: Vec<&str> = vouchers
            .iter()
            .filter(|v| validate_voucher_on(Some(*v), Money::new(total), &ctx, today()).is_ok())
            .map(|v| v.code.as_str())
            .collect();
        prop_assert_eq!(filtered, expected);
    }

    #[test]
    fn well_formed_codes_normalize_to_uppercase(code in "[ ]{0,3}[a-zA-Z0-9_-]{1,20}[ ]{0,3}") {
        let normalized = validate_voucher_code_format(&code);
        prop_assert_eq!(normalized, Ok(code.trim().to_uppercase()));
    }

    #[test]
    fn codes_with_inner_spaces_are_rejected(a in "[A-Z]{1,5}", b in "[A-Z]{1,5}") {
        let code = format!("{a} {b}");
        prop_assert!(validate_voucher_code_format(&code).is_err());
    }
}

#[test]
fn test_documented_examples() {
    let capped = Voucher::percentage("P20", 20.0).capped_at(Money::new(50_000));
    assert_eq!(
        calculate_voucher_discount(&capped, Money::new(1_000_000)),
        Money::new(50_000)
    );

    let fixed = Voucher::fixed("F30", Money::new(30_000));
    assert_eq!(
        calculate_voucher_discount(&fixed, Money::new(10_000)),
        Money::new(10_000)
    );

    assert_eq!(
        validate_voucher_code_format("  abc-123_X "),
        Ok("ABC-123_X".to_string())
    );
    assert!(validate_voucher_code_format("abc def").is_err());

    let cat = Voucher::percentage("CAT", 10.0).for_categories(["catA"]);
    let b = OrderContext::new().with_categories(["catB"]);
    let a = OrderContext::new().with_categories(["catA"]);
    assert!(validate_voucher_on(Some(&cat), Money::new(100_000), &b, today()).is_err());
    assert!(validate_voucher_on(Some(&cat), Money::new(100_000), &a, today()).is_ok());
}
