//! Products and their variants.

use crate::error::CommerceError;
use crate::ids::{CategoryId, ProductId, VariantId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// A sellable product as returned by `/products/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Money,
    #[serde(default)]
    pub original_price: Option<Money>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub category: Option<ProductCategory>,
    /// Shipping weight in grams.
    #[serde(default)]
    pub weight: Option<f64>,
    /// Package dimensions in centimetres.
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    #[serde(default)]
    pub default_media_url: Option<String>,
    #[serde(default)]
    pub media_urls: Vec<String>,
}

/// The category summary embedded in a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCategory {
    #[serde(default)]
    pub id: Option<CategoryId>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A shade or size of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: VariantId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub shade_name: Option<String>,
    #[serde(default)]
    pub shade_hex: Option<String>,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
}

impl Product {
    /// Find a variant by id.
    pub fn variant(&self, id: &VariantId) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| &v.id == id)
    }

    /// Unit price for a purchase, preferring the chosen variant's price.
    pub fn unit_price(&self, variant_id: Option<&VariantId>) -> Money {
        variant_id
            .and_then(|id| self.variant(id))
            .and_then(|v| v.price)
            .filter(|p| p.is_positive())
            .unwrap_or(self.price)
    }

    /// Category id, from the flat field or the embedded category.
    pub fn category_id(&self) -> Option<&CategoryId> {
        self.category_id
            .as_ref()
            .or_else(|| self.category.as_ref().and_then(|c| c.id.as_ref()))
    }

    /// Category name, if known.
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().and_then(|c| c.name.as_deref())
    }

    /// Image to show for the product.
    pub fn image_url(&self) -> Option<&str> {
        self.default_media_url
            .as_deref()
            .or_else(|| self.media_urls.first().map(String::as_str))
    }
}

impl ProductVariant {
    /// Human label for the variant.
    pub fn label(&self) -> Option<&str> {
        self.shade_name.as_deref().or(self.name.as_deref())
    }
}

/// Create/update body for `/products`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    /// The product code; required on create, ignored on update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    pub name: String,
    pub description: Option<String>,
    pub brand: String,
    pub category_id: Option<CategoryId>,
    /// Listed price before discounts.
    pub unit_price: Money,
    pub price: Option<Money>,
    pub stock_quantity: i64,
    pub weight: Option<f64>,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub default_media_url: Option<String>,
}

impl ProductPayload {
    /// Field rules the backend enforces on create.
    pub fn validate(&self) -> Result<(), CommerceError> {
        let invalid = |msg: &str| Err(CommerceError::ValidationError(msg.to_string()));
        if self.id.as_ref().is_some_and(|id| id.as_str().trim().is_empty()) {
            return invalid("product code is required");
        }
        if self.name.trim().is_empty() {
            return invalid("product name is required");
        }
        if self.name.chars().count() > 255 {
            return invalid("product name exceeds 255 characters");
        }
        if self
            .description
            .as_deref()
            .is_some_and(|d| d.chars().count() > 5000)
        {
            return invalid("product description exceeds 5000 characters");
        }
        if self.brand.trim().is_empty() {
            return invalid("brand is required");
        }
        if self.category_id.is_none() {
            return invalid("category is required");
        }
        if self.unit_price.amount() < 0 || self.price.is_some_and(|p| p.amount() < 0) {
            return invalid("prices must be non-negative");
        }
        if self.stock_quantity < 0 {
            return invalid("stock quantity must be non-negative");
        }
        let dimensions = [self.weight, self.length, self.width, self.height];
        if dimensions.iter().flatten().any(|d| !d.is_finite() || *d < 0.0) {
            return invalid("weight and dimensions must be non-negative");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lipstick() -> Product {
        serde_json::from_str(
            r#"{
                "id": "p1",
                "name": "Velvet Lipstick",
                "price": 250000,
                "category": {"id": "c7", "name": "Lips"},
                "weight": 35.6,
                "length": 9, "width": 2, "height": 2,
                "variants": [
                    {"id": "v1", "shadeName": "Ruby", "price": 270000},
                    {"id": "v2", "shadeName": "Nude", "price": null}
                ],
                "mediaUrls": ["https://cdn/x.jpg"]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_unit_price_prefers_variant() {
        let p = lipstick();
        assert_eq!(p.unit_price(Some(&VariantId::new("v1"))), Money::new(270_000));
        assert_eq!(p.unit_price(Some(&VariantId::new("v2"))), Money::new(250_000));
        assert_eq!(p.unit_price(Some(&VariantId::new("missing"))), Money::new(250_000));
        assert_eq!(p.unit_price(None), Money::new(250_000));
    }

    #[test]
    fn test_category_lookup() {
        let p = lipstick();
        assert_eq!(p.category_id(), Some(&CategoryId::new("c7")));
        assert_eq!(p.category_name(), Some("Lips"));
    }

    #[test]
    fn test_image_url_fallback() {
        let p = lipstick();
        assert_eq!(p.image_url(), Some("https://cdn/x.jpg"));
    }

    #[test]
    fn test_product_payload_rules() {
        let mut payload = ProductPayload {
            id: Some(ProductId::new("LIP-01")),
            name: "Velvet Lipstick".into(),
            brand: "Lila".into(),
            category_id: Some(CategoryId::new("c7")),
            unit_price: Money::new(250_000),
            stock_quantity: 10,
            ..Default::default()
        };
        assert!(payload.validate().is_ok());

        payload.weight = Some(-1.0);
        assert!(payload.validate().is_err());

        payload.weight = Some(35.0);
        payload.category_id = None;
        assert!(payload.validate().is_err());
    }
}
