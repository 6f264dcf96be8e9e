//! Order placement types.

use super::address::{Address, ShippingInfo};
use super::summary::CheckoutSummary;
use crate::error::CommerceError;
use crate::ids::{AddressId, CartItemId, OrderId, ProductId, VariantId};
use crate::money::Money;
use crate::serde_helpers::lenient_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Created,
    Confirmed,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether the order can still change.
    pub fn is_open(&self) -> bool {
        !matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    /// Cash on delivery: the order exists as soon as checkout returns.
    Cod,
    /// MoMo wallet: checkout returns a hosted payment page and the order is
    /// created once payment succeeds.
    Momo,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "COD",
            PaymentMethod::Momo => "MOMO",
        }
    }

    /// Label stored in the order preview.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "Cash on delivery",
            PaymentMethod::Momo => "MoMo wallet",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = CommerceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "COD" => Ok(PaymentMethod::Cod),
            "MOMO" => Ok(PaymentMethod::Momo),
            other => Err(CommerceError::ValidationError(format!(
                "unknown payment method: {other}"
            ))),
        }
    }
}

/// An order as returned by the order endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(default, alias = "orderCode")]
    pub code: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub order_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub expected_delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub shipping_fee: Option<Money>,
    #[serde(default)]
    pub total_amount: Option<Money>,
}

impl Order {
    /// Code to show the customer, falling back to the id.
    pub fn display_code(&self) -> &str {
        self.code.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Body for `POST /orders/checkout`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCheckoutRequest {
    pub address_id: Option<AddressId>,
    /// JSON-encoded [`ShippingInfo`].
    pub shipping_address: String,
    pub note: String,
    pub shipping_fee: Money,
    pub cart_item_ids: Vec<CartItemId>,
    pub payment_method: PaymentMethod,
}

/// Body for `POST /orders/checkout-direct`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectCheckoutRequest {
    pub product_id: ProductId,
    pub quantity: i64,
    pub variant_id: Option<VariantId>,
    pub address_id: Option<AddressId>,
    /// JSON-encoded [`ShippingInfo`].
    pub shipping_address: String,
    pub note: String,
    pub shipping_fee: Money,
    pub payment_method: PaymentMethod,
}

/// The checkout endpoints' result.
///
/// COD returns the created order, either bare or under `order`. MoMo
/// returns a `payUrl` and the `orderCode` the order will get.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CheckoutResult {
    pub order: Option<Order>,
    pub pay_url: Option<String>,
    pub order_code: Option<String>,
}

impl CheckoutResult {
    /// Decode from the envelope's `result`.
    pub fn from_value(value: serde_json::Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let pay_url = text("payUrl");
        let order_code = text("orderCode");
        let order = match value.get("order") {
            Some(nested) if !nested.is_null() => serde_json::from_value(nested.clone()).ok(),
            _ => serde_json::from_value(value.clone()).ok(),
        };
        Self {
            order,
            pay_url,
            order_code,
        }
    }
}

/// What the customer should see after placing an order.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderPlacement {
    /// The order exists (COD).
    Confirmed(Order),
    /// Payment must be completed on the hosted page first (MoMo).
    Redirect {
        pay_url: String,
        order_code: Option<String>,
    },
}

impl OrderPlacement {
    /// Interpret a checkout result for the chosen payment method.
    pub fn from_result(
        method: PaymentMethod,
        result: CheckoutResult,
    ) -> Result<Self, CommerceError> {
        match method {
            PaymentMethod::Momo => {
                let pay_url = result.pay_url.ok_or_else(|| {
                    CommerceError::CheckoutIncomplete("payment URL".to_string())
                })?;
                Ok(OrderPlacement::Redirect {
                    pay_url,
                    order_code: result.order_code,
                })
            }
            PaymentMethod::Cod => {
                let order = result
                    .order
                    .filter(|o| !o.id.as_str().is_empty())
                    .ok_or_else(|| CommerceError::CheckoutIncomplete("order id".to_string()))?;
                Ok(OrderPlacement::Confirmed(order))
            }
        }
    }
}

/// One item in the order preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestOrderItem {
    pub id: CartItemId,
    pub name: String,
    pub quantity: i64,
    pub line_total: Money,
    pub image_url: Option<String>,
}

/// Preview of the last placed order, read back by the order-success screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestOrder {
    pub order_id: Option<OrderId>,
    pub code: Option<String>,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub payment_method: String,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub voucher_discount: Money,
    pub total: Money,
    pub shipping_provider: String,
    pub shipping_address: String,
    pub items: Vec<LatestOrderItem>,
}

impl LatestOrder {
    /// Build the preview from the checkout state.
    pub fn new(
        summary: &CheckoutSummary,
        address: &Address,
        method: PaymentMethod,
        order_id: Option<OrderId>,
        code: Option<String>,
    ) -> Self {
        let info = address.shipping_info();
        Self {
            order_id,
            code,
            receiver_name: info.name,
            receiver_phone: if info.phone.is_empty() {
                "---".to_string()
            } else {
                info.phone
            },
            payment_method: method.label().to_string(),
            subtotal: summary.subtotal,
            shipping_fee: summary.shipping_fee,
            voucher_discount: summary.voucher_discount,
            total: summary.total,
            shipping_provider: "GHN".to_string(),
            shipping_address: info.address,
            items: summary
                .lines
                .iter()
                .map(|line| LatestOrderItem {
                    id: line.item_id.clone(),
                    name: line.name.clone(),
                    quantity: line.quantity,
                    line_total: line.line_total,
                    image_url: line.image_url.clone(),
                })
                .collect(),
        }
    }
}

/// Checkout state kept across the MoMo redirect so the return leg can
/// finish the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutInfo {
    pub payment_method: PaymentMethod,
    pub order_code: Option<String>,
    pub direct_checkout: bool,
    pub product_id: Option<ProductId>,
    pub quantity: Option<i64>,
    pub variant_id: Option<VariantId>,
    pub address_id: Option<AddressId>,
    /// JSON-encoded [`ShippingInfo`].
    pub shipping_address: String,
    pub shipping_fee: Money,
    pub cart_item_ids: Vec<CartItemId>,
    pub summary: CheckoutSummary,
    pub address: ShippingInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("cod".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cod);
        assert_eq!(" MoMo ".parse::<PaymentMethod>().unwrap(), PaymentMethod::Momo);
        assert!("card".parse::<PaymentMethod>().is_err());
        assert_eq!(serde_json::to_string(&PaymentMethod::Momo).unwrap(), "\"MOMO\"");
    }

    #[test]
    fn test_checkout_result_nested_order() {
        let result = CheckoutResult::from_value(json!({
            "order": {"id": "o1", "code": "LILA-1", "status": "CREATED", "orderDate": "2025-06-01"},
            "payUrl": null
        }));
        assert_eq!(result.order.as_ref().unwrap().display_code(), "LILA-1");
        assert_eq!(result.pay_url, None);
    }

    #[test]
    fn test_checkout_result_bare_order() {
        let result = CheckoutResult::from_value(json!({"id": "o2", "status": "CONFIRMED"}));
        let order = result.order.unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.display_code(), "o2");
    }

    #[test]
    fn test_checkout_result_momo() {
        let result = CheckoutResult::from_value(json!({
            "order": null, "payUrl": "https://pay.momo/x", "orderCode": "LILA-9"
        }));
        let placement = OrderPlacement::from_result(PaymentMethod::Momo, result).unwrap();
        assert_eq!(
            placement,
            OrderPlacement::Redirect {
                pay_url: "https://pay.momo/x".into(),
                order_code: Some("LILA-9".into())
            }
        );
    }

    #[test]
    fn test_placement_requires_pay_url_or_order() {
        let empty = CheckoutResult::from_value(json!({}));
        assert!(OrderPlacement::from_result(PaymentMethod::Momo, empty.clone()).is_err());
        assert!(OrderPlacement::from_result(PaymentMethod::Cod, empty).is_err());
    }

    #[test]
    fn test_cart_checkout_request_shape() {
        let req = CartCheckoutRequest {
            address_id: Some(AddressId::new("3")),
            shipping_address: "{}".into(),
            note: String::new(),
            shipping_fee: Money::new(32_000),
            cart_item_ids: vec![CartItemId::new("10")],
            payment_method: PaymentMethod::Cod,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["paymentMethod"], "COD");
        assert_eq!(value["shippingFee"], 32_000);
        assert_eq!(value["cartItemIds"][0], "10");
    }

    #[test]
    fn test_order_status_open() {
        assert!(OrderStatus::Shipped.is_open());
        assert!(!OrderStatus::Cancelled.is_open());
    }
}
