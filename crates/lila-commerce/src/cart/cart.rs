//! Cart and cart item types.

use crate::catalog::Product;
use crate::error::CommerceError;
use crate::ids::{CartId, CartItemId, ProductId, VariantId};
use crate::money::Money;
use serde::{Deserialize, Deserializer, Serialize};

/// Maximum quantity allowed per cart item.
pub const MAX_QUANTITY_PER_ITEM: i64 = 999;

/// Item id used for the synthetic cart of a "buy now" checkout.
pub const DIRECT_ITEM_ID: &str = "direct";

/// A cart snapshot as returned by `GET /cart`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default)]
    pub id: Option<CartId>,
    #[serde(default, deserialize_with = "nullable_items")]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub applied_voucher_code: Option<String>,
    #[serde(default)]
    pub voucher_discount: Option<Money>,
    #[serde(default)]
    pub subtotal: Option<Money>,
    #[serde(default, alias = "totalAmount")]
    pub total: Option<Money>,
}

fn nullable_items<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<CartItem>, D::Error> {
    Ok(Option::<Vec<CartItem>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    #[serde(default)]
    pub variant_name: Option<String>,
    #[serde(default)]
    pub shade_name: Option<String>,
    #[serde(default)]
    pub shade_hex: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub unit_price: Money,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    /// Line total after item-level promotions, when the backend computed one.
    #[serde(default)]
    pub final_price: Option<Money>,
}

fn default_quantity() -> i64 {
    1
}

impl CartItem {
    /// Quantity, treating a missing or zero quantity as one.
    pub fn effective_quantity(&self) -> i64 {
        if self.quantity > 0 {
            self.quantity
        } else {
            1
        }
    }

    /// Line total: the backend's final price, else unit price times quantity.
    pub fn line_total(&self) -> Money {
        self.final_price
            .unwrap_or_else(|| self.unit_price * self.effective_quantity())
    }

    /// Variant label for display.
    pub fn variant_label(&self) -> Option<&str> {
        self.shade_name.as_deref().or(self.variant_name.as_deref())
    }
}

impl Cart {
    /// A one-item cart for buying a product directly.
    pub fn direct(
        product: &Product,
        variant_id: Option<VariantId>,
        quantity: i64,
    ) -> Result<Self, CommerceError> {
        if quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }
        if quantity > MAX_QUANTITY_PER_ITEM {
            return Err(CommerceError::InvalidQuantity(quantity));
        }
        if let Some(id) = &variant_id {
            if product.variant(id).is_none() {
                return Err(CommerceError::VariantNotFound(id.to_string()));
            }
        }

        let unit_price = product.unit_price(variant_id.as_ref());
        let variant = variant_id.as_ref().and_then(|id| product.variant(id));
        let item = CartItem {
            id: CartItemId::new(DIRECT_ITEM_ID),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            variant_name: variant.and_then(|v| v.name.clone()),
            shade_name: variant.and_then(|v| v.shade_name.clone()),
            shade_hex: variant.and_then(|v| v.shade_hex.clone()),
            variant_id,
            image_url: product.image_url().map(str::to_string),
            unit_price,
            quantity,
            final_price: None,
        };
        let subtotal = item.line_total();

        Ok(Self {
            id: None,
            items: vec![item],
            applied_voucher_code: None,
            voucher_discount: None,
            subtotal: Some(subtotal),
            total: Some(subtotal),
        })
    }

    /// Check if cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find an item by id.
    pub fn item(&self, id: &CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.id == id)
    }

    /// The items chosen for checkout.
    ///
    /// An empty selection, or one that matches nothing in the cart, means
    /// the whole cart.
    pub fn select(&self, selected: &[CartItemId]) -> Vec<CartItem> {
        if selected.is_empty() {
            return self.items.clone();
        }
        let chosen: Vec<CartItem> = self
            .items
            .iter()
            .filter(|i| selected.contains(&i.id))
            .cloned()
            .collect();
        if chosen.is_empty() {
            self.items.clone()
        } else {
            chosen
        }
    }

    /// Sum of line totals.
    pub fn items_subtotal(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Voucher discount recorded on the cart, zero when none.
    pub fn discount(&self) -> Money {
        self.voucher_discount.unwrap_or_default().non_negative()
    }

    /// Record a voucher outcome on the snapshot.
    pub fn set_voucher(&mut self, code: Option<String>, discount: Money) {
        self.applied_voucher_code = code;
        self.voucher_discount = Some(discount.non_negative());
        let subtotal = self.items_subtotal();
        self.subtotal = Some(subtotal);
        self.total = Some(subtotal.saturating_sub(self.discount()));
    }

    /// Drop any voucher from the snapshot.
    pub fn clear_voucher(&mut self) {
        self.set_voucher(None, Money::ZERO);
    }

    /// Remove an item locally, returning whether it was present.
    pub fn remove_item(&mut self, id: &CartItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| &i.id != id);
        self.items.len() != before
    }

    /// Total number of units.
    pub fn unit_count(&self) -> i64 {
        self.items.iter().map(CartItem::effective_quantity).sum()
    }
}

/// Sum of line totals for an arbitrary selection.
pub fn subtotal_of(items: &[CartItem]) -> Money {
    items.iter().map(CartItem::line_total).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, unit: i64, qty: i64) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            product_id: ProductId::new(format!("p-{id}")),
            product_name: format!("Product {id}"),
            variant_id: None,
            variant_name: None,
            shade_name: None,
            shade_hex: None,
            image_url: None,
            unit_price: Money::new(unit),
            quantity: qty,
            final_price: None,
        }
    }

    fn cart() -> Cart {
        Cart {
            items: vec![item("a", 100_000, 2), item("b", 50_000, 1)],
            ..Cart::default()
        }
    }

    #[test]
    fn test_deserialize_cart_response() {
        let json = r#"{
            "id": 3,
            "subtotal": 250000,
            "appliedVoucherCode": "SALE",
            "voucherDiscount": 25000,
            "totalAmount": 225000,
            "items": [{
                "id": 10, "productId": "p1", "productName": "Serum",
                "variantId": null, "unitPrice": 125000, "quantity": 2, "finalPrice": 250000
            }]
        }"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.total, Some(Money::new(225_000)));
        assert_eq!(cart.discount(), Money::new(25_000));
        assert_eq!(cart.items[0].line_total(), Money::new(250_000));
    }

    #[test]
    fn test_line_total_fallback() {
        assert_eq!(item("x", 30_000, 3).line_total(), Money::new(90_000));
        assert_eq!(item("x", 30_000, 0).line_total(), Money::new(30_000));
    }

    #[test]
    fn test_select_subset() {
        let chosen = cart().select(&[CartItemId::new("b")]);
        assert_eq!(chosen.len(), 1);
        assert_eq!(chosen[0].id.as_str(), "b");
    }

    #[test]
    fn test_select_falls_back_to_all() {
        assert_eq!(cart().select(&[]).len(), 2);
        assert_eq!(cart().select(&[CartItemId::new("zzz")]).len(), 2);
    }

    #[test]
    fn test_subtotal() {
        assert_eq!(cart().items_subtotal(), Money::new(250_000));
        assert_eq!(subtotal_of(&cart().select(&[CartItemId::new("a")])), Money::new(200_000));
    }

    #[test]
    fn test_set_and_clear_voucher() {
        let mut c = cart();
        c.set_voucher(Some("SALE".into()), Money::new(30_000));
        assert_eq!(c.total, Some(Money::new(220_000)));
        c.clear_voucher();
        assert_eq!(c.applied_voucher_code, None);
        assert_eq!(c.discount(), Money::ZERO);
    }

    #[test]
    fn test_remove_item() {
        let mut c = cart();
        assert!(c.remove_item(&CartItemId::new("a")));
        assert!(!c.remove_item(&CartItemId::new("a")));
        assert_eq!(c.unit_count(), 1);
    }

    #[test]
    fn test_direct_cart() {
        let product: Product = serde_json::from_str(
            r#"{"id": "p9", "name": "Toner", "price": 180000,
                "variants": [{"id": "v1", "name": "200ml", "price": 210000}]}"#,
        )
        .unwrap();

        let c = Cart::direct(&product, Some(VariantId::new("v1")), 2).unwrap();
        assert_eq!(c.items[0].id.as_str(), DIRECT_ITEM_ID);
        assert_eq!(c.items[0].unit_price, Money::new(210_000));
        assert_eq!(c.items_subtotal(), Money::new(420_000));

        let c = Cart::direct(&product, None, 1).unwrap();
        assert_eq!(c.items_subtotal(), Money::new(180_000));

        assert!(matches!(
            Cart::direct(&product, None, 0),
            Err(CommerceError::InvalidQuantity(0))
        ));
        assert!(matches!(
            Cart::direct(&product, Some(VariantId::new("nope")), 1),
            Err(CommerceError::VariantNotFound(_))
        ));
    }
}
