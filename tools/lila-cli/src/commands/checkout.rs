//! Placing orders and finishing MoMo payments.

use anyhow::{Context as _, Result};
use dialoguer::Confirm;
use lila_client::{complete_momo_payment, Checkout, CheckoutSource, MomoReturn};
use lila_commerce::checkout::{CheckoutSummary, OrderPlacement, PaymentMethod};
use lila_commerce::{AddressId, CartItemId, ProductId, VariantId};
use serde_json::json;

use super::{CheckoutArgs, MomoReturnArgs};
use crate::context::Context;
use crate::output::truncate;

/// Run the checkout command.
pub async fn run(args: CheckoutArgs, ctx: &Context) -> Result<()> {
    let api = ctx.signed_in_api()?;
    let source = source_from(&args);
    let method = PaymentMethod::from(args.payment);

    let spinner = ctx.output.spinner("Loading checkout...");
    let loaded = Checkout::load(
        api,
        source,
        ctx.config.ghn.clone(),
        ctx.config.clock()?,
    )
    .await;
    spinner.finish_and_clear();
    let mut checkout = loaded.context("Failed to load checkout")?;

    if let Some(id) = &args.address {
        checkout
            .select_address(&AddressId::new(id.as_str()))
            .with_context(|| format!("Cannot ship to address {}", id))?;
    }

    let spinner = ctx.output.spinner("Quoting GHN shipping...");
    checkout.refresh_quotes().await;
    spinner.finish_and_clear();

    if let Some(code) = &args.voucher {
        let discount = checkout
            .apply_voucher(code)
            .await
            .with_context(|| format!("Voucher {} was not applied", code))?;
        ctx.output
            .success(&format!("Voucher {} saves {}", code.to_uppercase(), discount.display()));
    }

    let summary = checkout.summary();
    print_summary(&checkout, &summary, method, ctx);

    if args.dry_run {
        ctx.output.info("Dry run - no order placed");
        return Ok(());
    }

    if !args.yes && !ctx.output.is_json() {
        let confirmed = Confirm::new()
            .with_prompt(format!("Place this order for {}?", summary.total.display()))
            .default(false)
            .interact()?;

        if !confirmed {
            ctx.output.warn("Checkout cancelled");
            return Ok(());
        }
    }

    let spinner = ctx.output.spinner("Placing order...");
    let placed = checkout.place_order(method).await;
    spinner.finish_and_clear();

    match placed.context("Order was not placed")? {
        OrderPlacement::Confirmed(order) => {
            if ctx.output.is_json() {
                ctx.output.json(&json!({ "status": "confirmed", "order": order }));
                return Ok(());
            }
            ctx.output.success(&format!(
                "Order {} placed",
                order.code.as_deref().unwrap_or(order.id.as_str())
            ));
            ctx.output.kv("Total", &summary.total.display());
        }
        OrderPlacement::Redirect {
            pay_url,
            order_code,
        } => {
            if ctx.output.is_json() {
                ctx.output.json(&json!({
                    "status": "awaiting_payment",
                    "payUrl": pay_url,
                    "orderCode": order_code,
                }));
                return Ok(());
            }
            ctx.output.info("Complete the payment on MoMo:");
            println!("  {}", pay_url);
            if let Some(code) = order_code {
                ctx.output.kv("Order code", &code);
            }
            ctx.output
                .info("Then run `lila momo-return <resultCode>` with the code MoMo returns");
        }
    }
    Ok(())
}

fn source_from(args: &CheckoutArgs) -> CheckoutSource {
    match &args.direct {
        Some(product) => CheckoutSource::Direct {
            product_id: ProductId::new(product.as_str()),
            variant_id: args.variant.as_deref().map(VariantId::new),
            quantity: args.qty,
        },
        None => CheckoutSource::Cart {
            selected_item_ids: args.items.iter().map(|id| CartItemId::new(id.as_str())).collect(),
        },
    }
}

fn print_summary(
    checkout: &Checkout,
    summary: &CheckoutSummary,
    method: PaymentMethod,
    ctx: &Context,
) {
    if ctx.output.is_json() {
        ctx.output.json(&json!({
            "summary": summary,
            "address": checkout.address(),
            "voucher": checkout.applied_voucher(),
            "delivery": checkout.delivery().map(|d| d.label()),
            "payment": method.as_str(),
        }));
        return;
    }

    ctx.output.header("Order summary");
    let widths = [32, 5, 14];
    for line in &summary.lines {
        let name = match &line.variant {
            Some(variant) => format!("{} ({})", line.name, variant),
            None => line.name.clone(),
        };
        ctx.output.table_row(
            &[
                truncate(&name, 32).as_str(),
                format!("x{}", line.quantity).as_str(),
                line.line_total.display().as_str(),
            ],
            &widths,
        );
    }

    ctx.output.kv("Subtotal", &summary.subtotal.display());
    ctx.output.kv("Shipping", &summary.shipping_fee.display());
    if let Some(code) = checkout.applied_voucher() {
        ctx.output.kv(
            &format!("Voucher {}", code),
            &format!("-{}", summary.voucher_discount.display()),
        );
    }
    ctx.output.kv("Total", &summary.total.display());
    ctx.output.kv("Payment", method.label());
    match checkout.address() {
        Some(address) => ctx.output.kv("Ship to", &address.full_address()),
        None => ctx.output.warn("No shipping address selected"),
    }
    if let Some(delivery) = checkout.delivery() {
        ctx.output.kv("Expected delivery", &delivery.label());
    }
}

/// Run the momo-return command.
pub async fn momo_return(args: MomoReturnArgs, ctx: &Context) -> Result<()> {
    let api = ctx.signed_in_api()?;
    let outcome = complete_momo_payment(&api, &args.result_code)
        .await
        .context("Failed to finish the MoMo payment")?;

    match outcome {
        MomoReturn::Created(order) => {
            if ctx.output.is_json() {
                ctx.output.json(&json!({ "status": "created", "order": order }));
                return Ok(());
            }
            ctx.output.success(&format!(
                "Payment received, order {} created",
                order.code.as_deref().unwrap_or(order.id.as_str())
            ));
            Ok(())
        }
        MomoReturn::Failed { result_code } => {
            anyhow::bail!("MoMo reported a failed payment (resultCode {})", result_code)
        }
        MomoReturn::NothingPending => {
            ctx.output.info("No checkout is waiting for payment");
            Ok(())
        }
    }
}
