//! Voucher entity as served by `/vouchers/active`.

use crate::ids::VoucherId;
use crate::money::Money;
use crate::serde_helpers::{lenient_bool, lenient_date};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// How the discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DiscountValueType {
    /// `discount_value` is a percent of the order total.
    #[serde(rename = "PERCENTAGE")]
    Percentage,
    /// `discount_value` is a fixed number of dong.
    #[default]
    #[serde(rename = "AMOUNT", alias = "FIXED")]
    Fixed,
}

/// What part of an order the voucher applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplyScope {
    #[default]
    Order,
    Product,
    Category,
}

/// Moderation state of a voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoucherStatus {
    #[default]
    #[serde(alias = "PENDING_APPROVAL")]
    Pending,
    Approved,
    Rejected,
    Expired,
    Cancelled,
}

/// A discount code with its eligibility constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    #[serde(default)]
    pub id: Option<VoucherId>,
    /// Uppercase code typed by the customer.
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub discount_value_type: DiscountValueType,
    /// Percent (for `Percentage`) or dong (for `Fixed`).
    #[serde(default)]
    pub discount_value: f64,
    /// Cap on a percentage discount; ignored unless positive.
    #[serde(default)]
    pub max_discount_value: Option<Money>,
    #[serde(default)]
    pub min_order_value: Option<Money>,
    #[serde(default)]
    pub max_order_value: Option<Money>,
    #[serde(default, deserialize_with = "nullable_scope")]
    pub apply_scope: ApplyScope,
    #[serde(default, alias = "productIds", deserialize_with = "scope_ids")]
    pub product_apply: Vec<String>,
    #[serde(default, alias = "categoryIds", deserialize_with = "scope_ids")]
    pub category_apply: Vec<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub expiry_date: Option<NaiveDate>,
    /// Total redemptions allowed; ignored unless positive.
    #[serde(default)]
    pub usage_limit: Option<i64>,
    #[serde(default, deserialize_with = "nullable_count")]
    pub usage_count: i64,
    #[serde(default)]
    pub usage_per_user: Option<i64>,
    /// A missing flag means active; only an explicit `false`/`0` disables.
    #[serde(default = "default_active", deserialize_with = "active_flag")]
    pub is_active: bool,
    /// A missing status is treated as not yet approved.
    #[serde(default, deserialize_with = "nullable_status")]
    pub status: VoucherStatus,
}

fn default_active() -> bool {
    true
}

fn active_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(lenient_bool(deserializer)?.unwrap_or(true))
}

fn nullable_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or(0))
}

fn nullable_scope<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ApplyScope, D::Error> {
    Ok(Option::<ApplyScope>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<VoucherStatus, D::Error> {
    Ok(Option::<VoucherStatus>::deserialize(deserializer)?.unwrap_or_default())
}

/// Allow-list entries arrive as strings, numbers, or objects carrying an `id`.
/// Objects without an id cannot match anything and are dropped.
fn scope_ids<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw.iter().filter_map(scope_id).collect())
}

fn scope_id(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("id").filter(|id| !id.is_null()).and_then(scope_id),
        _ => None,
    }
}

impl Voucher {
    /// A percentage voucher with no constraints beyond being active and approved.
    pub fn percentage(code: impl Into<String>, percent: f64) -> Self {
        Self::with_value(code, DiscountValueType::Percentage, percent)
    }

    /// A fixed-amount voucher with no constraints beyond being active and approved.
    pub fn fixed(code: impl Into<String>, amount: Money) -> Self {
        Self::with_value(code, DiscountValueType::Fixed, amount.as_f64())
    }

    fn with_value(code: impl Into<String>, kind: DiscountValueType, value: f64) -> Self {
        Self {
            id: None,
            code: code.into(),
            name: None,
            description: None,
            image_url: None,
            discount_value_type: kind,
            discount_value: value,
            max_discount_value: None,
            min_order_value: None,
            max_order_value: None,
            apply_scope: ApplyScope::Order,
            product_apply: Vec::new(),
            category_apply: Vec::new(),
            start_date: None,
            expiry_date: None,
            usage_limit: None,
            usage_count: 0,
            usage_per_user: None,
            is_active: true,
            status: VoucherStatus::Approved,
        }
    }

    /// Cap the percentage discount.
    pub fn capped_at(mut self, max: Money) -> Self {
        self.max_discount_value = Some(max);
        self
    }

    /// Set order-total bounds.
    pub fn for_orders_between(mut self, min: Option<Money>, max: Option<Money>) -> Self {
        self.min_order_value = min;
        self.max_order_value = max;
        self
    }

    /// Restrict to the given products.
    pub fn for_products<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.apply_scope = ApplyScope::Product;
        self.product_apply = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict to the given categories.
    pub fn for_categories<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.apply_scope = ApplyScope::Category;
        self.category_apply = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Limit the validity window.
    pub fn valid_between(mut self, start: Option<NaiveDate>, expiry: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.expiry_date = expiry;
        self
    }

    /// Set the usage cap and current count.
    pub fn with_usage(mut self, limit: i64, count: i64) -> Self {
        self.usage_limit = Some(limit);
        self.usage_count = count;
        self
    }

    /// Label shown in voucher pickers, e.g. `"-20%"` or `"-30.000 ₫"`.
    pub fn value_label(&self) -> String {
        match self.discount_value_type {
            DiscountValueType::Percentage => format!("-{}%", self.discount_value),
            DiscountValueType::Fixed => format!("-{}", Money::from_f64(self.discount_value)),
        }
    }

    /// Whether the usage cap applies and has been reached.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.usage_limit, Some(limit) if limit > 0 && self.usage_count >= limit)
    }
}
