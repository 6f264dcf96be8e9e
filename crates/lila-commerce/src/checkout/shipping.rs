//! GHN parcel rules.
//!
//! GHN quotes by service type. Parcels under the weight threshold use the
//! "light" service and are described by one box (longest length, widest
//! width, stacked height). Heavier parcels use the "heavy" service and are
//! described item by item. Every dimension and weight is floored at the
//! configured defaults because GHN rejects zeros.

use super::address::Address;
use crate::cart::{subtotal_of, CartItem};
use crate::catalog::Product;
use crate::error::CommerceError;
use crate::money::Money;
use crate::serde_helpers::parse_date;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// Name GHN shows for items without one.
pub const DEFAULT_ITEM_NAME: &str = "Sản phẩm";

/// Origin warehouse and parcel defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GhnSettings {
    pub from_district_id: i64,
    pub from_ward_code: String,
    pub service_type_light: i64,
    pub service_type_heavy: i64,
    pub heavy_weight_threshold_grams: i64,
    pub default_dimension_cm: i64,
    pub default_weight_grams: i64,
}

impl Default for GhnSettings {
    fn default() -> Self {
        Self {
            from_district_id: 1454,
            from_ward_code: "21211".to_string(),
            service_type_light: 2,
            service_type_heavy: 5,
            heavy_weight_threshold_grams: 20_000,
            default_dimension_cm: 10,
            default_weight_grams: 100,
        }
    }
}

/// GHN service class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    Light,
    Heavy,
}

impl GhnSettings {
    /// Service class for a parcel weight.
    pub fn service_type_for(&self, weight_grams: i64) -> ServiceType {
        if weight_grams >= self.heavy_weight_threshold_grams {
            ServiceType::Heavy
        } else {
            ServiceType::Light
        }
    }

    /// GHN numeric id for a service class.
    pub fn service_type_id(&self, service: ServiceType) -> i64 {
        match service {
            ServiceType::Light => self.service_type_light,
            ServiceType::Heavy => self.service_type_heavy,
        }
    }

    fn dimension(&self, value: Option<f64>) -> i64 {
        match value {
            Some(v) if v > 0.0 => v.round() as i64,
            _ => self.default_dimension_cm,
        }
    }
}

fn grams(product: &Product) -> i64 {
    product.weight.filter(|w| w.is_finite() && *w > 0.0).map_or(0, |w| w.round() as i64)
}

/// Checkout items paired with their product details, where those resolved.
#[derive(Debug, Clone)]
pub struct Parcel<'a> {
    items: &'a [CartItem],
    products: &'a [Option<Product>],
}

impl<'a> Parcel<'a> {
    /// Pair items with product details; `products[i]` belongs to `items[i]`.
    pub fn new(items: &'a [CartItem], products: &'a [Option<Product>]) -> Self {
        Self { items, products }
    }

    fn resolved(&self) -> impl Iterator<Item = (&'a CartItem, &'a Product)> + '_ {
        self.items
            .iter()
            .zip(self.products.iter())
            .filter_map(|(item, product)| product.as_ref().map(|p| (item, p)))
    }

    fn has_resolved(&self) -> bool {
        self.resolved().next().is_some()
    }

    /// Parcel weight in grams for fee quotes.
    ///
    /// Falls back to the default weight per item when no product details
    /// could be loaded.
    pub fn weight_grams(&self, settings: &GhnSettings) -> i64 {
        if !self.has_resolved() {
            return settings.default_weight_grams * self.items.len() as i64;
        }
        self.resolved()
            .map(|(item, product)| grams(product) * item.effective_quantity())
            .sum()
    }

    /// Parcel weight for lead-time quotes: a zero weight also falls back to
    /// the per-item default.
    pub fn lead_time_weight_grams(&self, settings: &GhnSettings) -> i64 {
        match self.weight_grams(settings) {
            0 => settings.default_weight_grams * self.items.len() as i64,
            w => w,
        }
    }

    /// Items subtotal used as GHN's insurance value.
    pub fn insurance_value(&self) -> Money {
        subtotal_of(self.items)
    }

    fn light_box(&self, settings: &GhnSettings) -> ParcelBox {
        let d = settings.default_dimension_cm;
        let mut length = d;
        let mut width = d;
        let mut height = 0;
        let mut weight = 0;
        for (item, product) in self.resolved() {
            let qty = item.effective_quantity();
            length = length.max(settings.dimension(product.length));
            width = width.max(settings.dimension(product.width));
            height += settings.dimension(product.height) * qty;
            weight += grams(product) * qty;
        }
        if !self.has_resolved() {
            weight = self.weight_grams(settings);
        }
        ParcelBox {
            length,
            width,
            height: height.max(d),
            weight: weight.max(settings.default_weight_grams),
        }
    }

    fn heavy_items(&self, settings: &GhnSettings) -> Vec<FeeItem> {
        let d = settings.default_dimension_cm;
        let mut items: Vec<FeeItem> = self
            .resolved()
            .map(|(item, product)| {
                let qty = item.effective_quantity();
                let price = item
                    .final_price
                    .filter(Money::is_positive)
                    .unwrap_or_else(|| item.unit_price * qty);
                FeeItem {
                    name: non_empty(&product.name).unwrap_or(DEFAULT_ITEM_NAME).to_string(),
                    code: non_empty(product.id.as_str())
                        .unwrap_or(item.product_id.as_str())
                        .to_string(),
                    quantity: qty,
                    price,
                    length: settings.dimension(product.length).max(d),
                    width: settings.dimension(product.width).max(d),
                    height: settings.dimension(product.height).max(d),
                    weight: grams(product).max(settings.default_weight_grams),
                    category: FeeItemCategory {
                        level1: product
                            .category_name()
                            .and_then(non_empty)
                            .unwrap_or(DEFAULT_ITEM_NAME)
                            .to_string(),
                    },
                }
            })
            .collect();

        if items.is_empty() {
            items.push(FeeItem {
                name: DEFAULT_ITEM_NAME.to_string(),
                code: "default".to_string(),
                quantity: 1,
                price: self.insurance_value(),
                length: d,
                width: d,
                height: d,
                weight: settings.default_weight_grams,
                category: FeeItemCategory {
                    level1: DEFAULT_ITEM_NAME.to_string(),
                },
            });
        }
        items
    }
}

fn non_empty(s: &str) -> Option<&str> {
    Some(s.trim()).filter(|s| !s.is_empty())
}

struct ParcelBox {
    length: i64,
    width: i64,
    height: i64,
    weight: i64,
}

/// Destination for a quote, taken from a routable address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub district_id: i64,
    pub ward_code: String,
}

impl Destination {
    /// Extract the GHN destination; fails without a ward code or a numeric district.
    pub fn from_address(address: &Address) -> Result<Self, CommerceError> {
        let ward_code = address
            .ghn_ward_code()
            .ok_or_else(|| CommerceError::InvalidAddress("missing ward code".to_string()))?;
        let district_id = address.ghn_district_id().ok_or_else(|| {
            CommerceError::InvalidAddress("missing or non-numeric district id".to_string())
        })?;
        Ok(Self {
            district_id,
            ward_code: ward_code.to_string(),
        })
    }
}

/// Body of a GHN fee quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeRequest {
    pub service_type_id: i64,
    pub insurance_value: Money,
    pub coupon: Option<String>,
    pub from_district_id: i64,
    pub from_ward_code: String,
    pub to_district_id: i64,
    pub to_ward_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<FeeItem>,
}

/// One item of a heavy-service quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeItem {
    pub name: String,
    pub code: String,
    pub quantity: i64,
    pub price: Money,
    pub length: i64,
    pub width: i64,
    pub height: i64,
    pub weight: i64,
    pub category: FeeItemCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeItemCategory {
    pub level1: String,
}

impl FeeRequest {
    /// Build the quote for a parcel going to `destination`.
    pub fn build(
        parcel: &Parcel<'_>,
        destination: &Destination,
        settings: &GhnSettings,
    ) -> Result<Self, CommerceError> {
        if parcel.items.is_empty() {
            return Err(CommerceError::EmptyCheckout);
        }
        let service = settings.service_type_for(parcel.weight_grams(settings));
        let mut request = Self {
            service_type_id: settings.service_type_id(service),
            insurance_value: parcel.insurance_value(),
            coupon: None,
            from_district_id: settings.from_district_id,
            from_ward_code: settings.from_ward_code.clone(),
            to_district_id: destination.district_id,
            to_ward_code: destination.ward_code.clone(),
            length: None,
            width: None,
            height: None,
            weight: None,
            items: Vec::new(),
        };
        match service {
            ServiceType::Light => {
                let b = parcel.light_box(settings);
                request.length = Some(b.length);
                request.width = Some(b.width);
                request.height = Some(b.height);
                request.weight = Some(b.weight);
            }
            ServiceType::Heavy => request.items = parcel.heavy_items(settings),
        }
        Ok(request)
    }
}

/// GHN fee quote result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeQuote {
    pub total: Option<Money>,
    pub service_fee: Option<Money>,
    pub insurance_fee: Option<Money>,
}

/// Body of a GHN lead-time quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadTimeRequest {
    pub from_district_id: i64,
    pub from_ward_code: String,
    pub to_district_id: i64,
    pub to_ward_code: String,
    pub service_type_id: i64,
}

impl LeadTimeRequest {
    /// Build the lead-time quote for a parcel going to `destination`.
    pub fn build(
        parcel: &Parcel<'_>,
        destination: &Destination,
        settings: &GhnSettings,
    ) -> Result<Self, CommerceError> {
        if parcel.items.is_empty() {
            return Err(CommerceError::EmptyCheckout);
        }
        let service = settings.service_type_for(parcel.lead_time_weight_grams(settings));
        Ok(Self {
            from_district_id: settings.from_district_id,
            from_ward_code: settings.from_ward_code.clone(),
            to_district_id: destination.district_id,
            to_ward_code: destination.ward_code.clone(),
            service_type_id: settings.service_type_id(service),
        })
    }
}

/// GHN lead-time result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LeadTimeQuote {
    /// Estimated delivery as unix seconds.
    pub leadtime: Option<i64>,
    #[serde(alias = "leadtime_order")]
    pub leadtime_order: Option<LeadTimeOrder>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LeadTimeOrder {
    #[serde(alias = "from_estimate_date")]
    pub from_estimate_date: Option<String>,
    #[serde(alias = "to_estimate_date")]
    pub to_estimate_date: Option<String>,
}

/// Estimated delivery dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryWindow {
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
}

impl DeliveryWindow {
    /// Read the window from a quote, preferring the explicit estimate dates
    /// over the unix `leadtime`. Unix times are read in `offset`.
    pub fn from_quote(quote: &LeadTimeQuote, offset: FixedOffset) -> Option<Self> {
        let order = quote.leadtime_order.as_ref();
        let from = order
            .and_then(|o| o.from_estimate_date.as_deref())
            .and_then(parse_date)
            .or_else(|| {
                quote
                    .leadtime
                    .filter(|secs| *secs > 0)
                    .and_then(|secs| DateTime::from_timestamp(secs, 0))
                    .map(|t| t.with_timezone(&offset).date_naive())
            })?;
        let to = order
            .and_then(|o| o.to_estimate_date.as_deref())
            .and_then(parse_date)
            .filter(|to| *to != from);
        Some(Self { from, to })
    }

    /// Short label such as `"Mon, 3-5/6"`, `"Fri, 30/5 - 2/6"` or `"Tue, 3/6"`.
    pub fn label(&self) -> String {
        let weekday = self.from.format("%a");
        let (d, m) = (self.from.day(), self.from.month());
        match self.to {
            Some(to) if to.month() == m => format!("{weekday}, {d}-{}/{m}", to.day()),
            Some(to) => format!("{weekday}, {d}/{m} - {}/{}", to.day(), to.month()),
            None => format!("{weekday}, {d}/{m}"),
        }
    }
}
