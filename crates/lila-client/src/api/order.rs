use super::{segment, ApiClient};
use crate::error::ClientError;
use lila_commerce::checkout::{
    CartCheckoutRequest, CheckoutInfo, CheckoutResult, DirectCheckoutRequest, Order, PaymentMethod,
};
use lila_commerce::{AddressId, CartItemId, Money, OrderId, ProductId, VariantId};
use lila_data::Method;
use serde::Serialize;
use serde_json::Value;

/// Body for the MoMo return leg, `POST /orders/create-after-payment` or
/// `/orders/create-direct-after-payment`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidCheckoutRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub address_id: Option<AddressId>,
    pub shipping_address: String,
    pub note: String,
    pub shipping_fee: Money,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cart_item_ids: Vec<CartItemId>,
    pub payment_method: PaymentMethod,
    pub order_code: Option<String>,
}

impl From<&CheckoutInfo> for PaidCheckoutRequest {
    fn from(info: &CheckoutInfo) -> Self {
        let direct = info.direct_checkout;
        Self {
            product_id: info.product_id.clone().filter(|_| direct),
            quantity: info.quantity.filter(|_| direct),
            variant_id: info.variant_id.clone().filter(|_| direct),
            address_id: info.address_id.clone(),
            shipping_address: info.shipping_address.clone(),
            note: String::new(),
            shipping_fee: info.shipping_fee,
            cart_item_ids: if direct {
                Vec::new()
            } else {
                info.cart_item_ids.clone()
            },
            payment_method: info.payment_method,
            order_code: info.order_code.clone(),
        }
    }
}

/// Order placement and history.
pub struct OrderApi<'a> {
    client: &'a ApiClient,
}

impl<'a> OrderApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// `POST /orders/checkout` for selected cart items.
    pub async fn checkout(&self, body: &CartCheckoutRequest) -> Result<CheckoutResult, ClientError> {
        let result: Option<Value> = self
            .client
            .send_optional(self.client.request(Method::Post, "/orders/checkout").json(body))
            .await?;
        Ok(result.map(CheckoutResult::from_value).unwrap_or_default())
    }

    /// `POST /orders/checkout-direct` for a single product.
    pub async fn checkout_direct(
        &self,
        body: &DirectCheckoutRequest,
    ) -> Result<CheckoutResult, ClientError> {
        let result: Option<Value> = self
            .client
            .send_optional(
                self.client
                    .request(Method::Post, "/orders/checkout-direct")
                    .json(body),
            )
            .await?;
        Ok(result.map(CheckoutResult::from_value).unwrap_or_default())
    }

    /// Create the order once MoMo reports a successful payment.
    pub async fn create_after_payment(&self, info: &CheckoutInfo) -> Result<Order, ClientError> {
        let path = if info.direct_checkout {
            "/orders/create-direct-after-payment"
        } else {
            "/orders/create-after-payment"
        };
        let body = PaidCheckoutRequest::from(info);
        self.client
            .send(self.client.request(Method::Post, path).json(&body))
            .await
    }

    pub async fn my_orders(&self) -> Result<Vec<Order>, ClientError> {
        self.client.get_list("/orders/my-orders").await
    }

    pub async fn get(&self, id: &OrderId) -> Result<Order, ClientError> {
        self.client
            .get(&format!("/orders/{}", segment(id.as_str())))
            .await
    }
}
