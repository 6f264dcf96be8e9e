//! Voucher checks.

use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use lila_commerce::voucher::{
    calculate_voucher_discount, filter_applicable_vouchers_on, validate_voucher_code_format,
    validate_voucher_on, OrderContext, Voucher, VoucherRejection,
};
use lila_commerce::Money;
use serde::Serialize;

use super::{VoucherArgs, VoucherCommand};
use crate::context::Context;
use crate::output::{status_badge, truncate};

/// Outcome of checking one code against an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckReport {
    pub code: String,
    pub order_total: Money,
    pub valid: bool,
    pub discount: Money,
    pub total_after_discount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Run the voucher command.
pub async fn run(args: VoucherArgs, ctx: &Context) -> Result<()> {
    match args.command {
        VoucherCommand::Format { code } => format(&code, ctx),
        VoucherCommand::Check {
            code,
            total,
            products,
            categories,
        } => {
            let order = OrderContext::new()
                .with_products(&products)
                .with_categories(&categories);
            check(&code, Money::from(total), &order, ctx).await
        }
        VoucherCommand::List { total, all } => list(Money::from(total), all, ctx).await,
    }
}

fn format(code: &str, ctx: &Context) -> Result<()> {
    let result = validate_voucher_code_format(code);
    if ctx.output.is_json() {
        let value = match &result {
            Ok(normalized) => serde_json::json!({ "valid": true, "code": normalized }),
            Err(reason) => serde_json::json!({ "valid": false, "reason": reason.to_string() }),
        };
        ctx.output.json(&value);
    }
    let normalized = result?;
    ctx.output.success(&format!("Code format is valid: {}", normalized));
    Ok(())
}

async fn check(code: &str, total: Money, order: &OrderContext, ctx: &Context) -> Result<()> {
    let code = validate_voucher_code_format(code)?;
    let today = ctx.config.clock()?.today();
    let vouchers = active_vouchers(ctx).await?;

    let report = check_code(&vouchers, &code, total, order, today);

    if ctx.output.is_json() {
        ctx.output.json(&report);
    } else {
        ctx.output.header(&format!("Voucher {}", report.code));
        ctx.output.kv("Order total", &report.order_total.display());
        if report.valid {
            ctx.output.kv("Discount", &report.discount.display());
            ctx.output.kv("To pay", &report.total_after_discount.display());
        }
    }

    match report.reason {
        Some(reason) => anyhow::bail!(reason),
        None => {
            ctx.output.success("Voucher can be applied");
            Ok(())
        }
    }
}

/// Validate `code` against the active vouchers as of `today`.
pub fn check_code(
    vouchers: &[Voucher],
    code: &str,
    total: Money,
    order: &OrderContext,
    today: NaiveDate,
) -> CheckReport {
    let rejected = |reason: VoucherRejection| CheckReport {
        code: code.to_string(),
        order_total: total,
        valid: false,
        discount: Money::default(),
        total_after_discount: total,
        reason: Some(reason.to_string()),
    };

    let Some(voucher) = vouchers.iter().find(|v| v.code.eq_ignore_ascii_case(code)) else {
        return rejected(VoucherRejection::UnknownCode {
            code: code.to_string(),
        });
    };
    if let Err(reason) = validate_voucher_on(Some(voucher), total, order, today) {
        return rejected(reason);
    }

    let discount = calculate_voucher_discount(voucher, total);
    CheckReport {
        code: voucher.code.clone(),
        order_total: total,
        valid: true,
        discount,
        total_after_discount: total.saturating_sub(discount),
        reason: None,
    }
}

async fn list(total: Money, all: bool, ctx: &Context) -> Result<()> {
    let today = ctx.config.clock()?.today();
    let vouchers = active_vouchers(ctx).await?;
    let shown: Vec<&Voucher> = if all {
        vouchers.iter().collect()
    } else {
        filter_applicable_vouchers_on(&vouchers, total, &OrderContext::new(), today)
    };

    if ctx.output.is_json() {
        ctx.output.json(&shown);
        return Ok(());
    }

    ctx.output.header(&format!("Vouchers for an order of {}", total.display()));
    if shown.is_empty() {
        ctx.output.info("No vouchers can be used for this order");
        return Ok(());
    }

    let widths = [14, 12, 12, 30];
    ctx.output.table_row(&["CODE", "VALUE", "STATUS", "NAME"], &widths);
    for voucher in shown {
        let usable = validate_voucher_on(Some(voucher), total, &OrderContext::new(), today).is_ok();
        let status = if usable {
            "applicable"
        } else {
            "inactive"
        };
        ctx.output.table_row(
            &[
                voucher.code.as_str(),
                voucher.value_label().as_str(),
                status_badge(status).as_str(),
                truncate(voucher.name.as_deref().unwrap_or("-"), 30).as_str(),
            ],
            &widths,
        );
    }
    Ok(())
}

async fn active_vouchers(ctx: &Context) -> Result<Vec<Voucher>> {
    let api = ctx.api()?;
    let spinner = ctx.output.spinner("Fetching active vouchers...");
    let result = api.vouchers().active().await;
    spinner.finish_and_clear();
    result.context("Failed to fetch active vouchers")
}
