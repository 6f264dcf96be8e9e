use super::{segment, ApiClient};
use crate::error::ClientError;
use lila_commerce::cart::{Cart, MAX_QUANTITY_PER_ITEM};
use lila_commerce::{CartItemId, CommerceError, Money, ProductId, VariantId};
use lila_data::Method;

/// The signed-in customer's cart. Every call returns the updated snapshot.
pub struct CartApi<'a> {
    client: &'a ApiClient,
}

fn check_quantity(quantity: i64) -> Result<(), ClientError> {
    if quantity <= 0 || quantity > MAX_QUANTITY_PER_ITEM {
        return Err(CommerceError::InvalidQuantity(quantity).into());
    }
    Ok(())
}

impl<'a> CartApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn get(&self) -> Result<Cart, ClientError> {
        self.client.get("/cart").await
    }

    pub async fn add_item(
        &self,
        product_id: &ProductId,
        variant_id: Option<&VariantId>,
        quantity: i64,
    ) -> Result<Cart, ClientError> {
        check_quantity(quantity)?;
        let mut request = self
            .client
            .request(Method::Post, "/cart/items")
            .query("productId", product_id)
            .query("quantity", quantity);
        if let Some(variant) = variant_id {
            request = request.query("variantId", variant);
        }
        self.client.send(request).await
    }

    pub async fn update_quantity(
        &self,
        item_id: &CartItemId,
        quantity: i64,
    ) -> Result<Cart, ClientError> {
        check_quantity(quantity)?;
        let path = format!("/cart/items/{}", segment(item_id.as_str()));
        self.client
            .send(
                self.client
                    .request(Method::Put, &path)
                    .query("quantity", quantity),
            )
            .await
    }

    pub async fn remove_item(&self, item_id: &CartItemId) -> Result<Cart, ClientError> {
        let path = format!("/cart/items/{}", segment(item_id.as_str()));
        self.client.send(self.client.request(Method::Delete, &path)).await
    }

    /// Apply a voucher; the backend re-validates it against `order_value`.
    pub async fn apply_voucher(&self, code: &str, order_value: Money) -> Result<Cart, ClientError> {
        self.client
            .send(
                self.client
                    .request(Method::Post, "/cart/apply-voucher")
                    .query("code", code)
                    .query("orderValue", order_value.amount()),
            )
            .await
    }

    pub async fn clear_voucher(&self) -> Result<Cart, ClientError> {
        self.client
            .send(self.client.request(Method::Post, "/cart/clear-voucher"))
            .await
    }
}
