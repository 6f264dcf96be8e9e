//! Checkout price summary.

use crate::cart::CartItem;
use crate::ids::CartItemId;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// A line of the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryLine {
    pub item_id: CartItemId,
    pub name: String,
    pub variant: Option<String>,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
    pub image_url: Option<String>,
}

impl From<&CartItem> for SummaryLine {
    fn from(item: &CartItem) -> Self {
        Self {
            item_id: item.id.clone(),
            name: item.product_name.clone(),
            variant: item.variant_label().map(str::to_string),
            quantity: item.effective_quantity(),
            unit_price: item.unit_price,
            line_total: item.line_total(),
            image_url: item.image_url.clone(),
        }
    }
}

/// What the customer is about to pay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub lines: Vec<SummaryLine>,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub voucher_discount: Money,
    pub total: Money,
}

impl CheckoutSummary {
    /// Assemble the summary; the total never goes below zero.
    pub fn new(items: &[CartItem], shipping_fee: Money, voucher_discount: Money) -> Self {
        let lines: Vec<SummaryLine> = items.iter().map(SummaryLine::from).collect();
        let subtotal: Money = lines.iter().map(|l| l.line_total).sum();
        let shipping_fee = shipping_fee.non_negative();
        let voucher_discount = voucher_discount.non_negative();
        Self {
            total: (subtotal + shipping_fee - voucher_discount).non_negative(),
            lines,
            subtotal,
            shipping_fee,
            voucher_discount,
        }
    }
}
