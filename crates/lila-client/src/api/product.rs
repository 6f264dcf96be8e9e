use super::{segment, ApiClient};
use crate::error::ClientError;
use lila_commerce::catalog::{Category, Product};
use lila_commerce::ProductId;

/// Storefront catalog reads.
pub struct ProductApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ProductApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, id: &ProductId) -> Result<Product, ClientError> {
        self.client
            .get(&format!("/products/{}", segment(id.as_str())))
            .await
    }

    /// Products currently on sale.
    pub async fn active(&self) -> Result<Vec<Product>, ClientError> {
        self.client.get_list("/products/active").await
    }

    pub async fn active_categories(&self) -> Result<Vec<Category>, ClientError> {
        self.client.get_list("/categories/active").await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use lila_commerce::{Money, ProductId};
    use lila_data::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_product() {
        let (client, mock) = client();
        mock.ok(
            Method::Get,
            &path("/products/p1"),
            json!({"id": "p1", "name": "Cushion", "price": 350000, "weight": 120.4}),
        );
        let product = client.products().get(&ProductId::new("p1")).await.unwrap();
        assert_eq!(product.price, Money::new(350_000));
        assert_eq!(product.weight, Some(120.4));
    }

    #[tokio::test]
    async fn test_missing_product() {
        let (client, mock) = client();
        mock.api_error(Method::Get, &path("/products/nope"), 404, 6001, "Product not existed");
        let err = client.products().get(&ProductId::new("nope")).await.unwrap_err();
        assert!(matches!(err, crate::ClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_active_list() {
        let (client, mock) = client();
        mock.ok(Method::Get, &path("/products/active"), json!(null));
        assert!(client.products().active().await.unwrap().is_empty());
    }
}
