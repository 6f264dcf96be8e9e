//! The MoMo return leg: the customer comes back from the hosted payment
//! page and the order is created from the stashed checkout state.

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::storage::{CHECKOUT_INFO_KEY, LATEST_ORDER_KEY};
use lila_commerce::checkout::{CheckoutInfo, LatestOrder, Order};
use tracing::{info, warn};

/// MoMo's result code for a successful payment.
pub const MOMO_SUCCESS: &str = "0";

/// Outcome of returning from the payment page.
#[derive(Debug, Clone, PartialEq)]
pub enum MomoReturn {
    /// Payment succeeded and the order now exists.
    Created(Order),
    /// MoMo reported a failure; nothing was created.
    Failed { result_code: String },
    /// No checkout is waiting for payment.
    NothingPending,
}

/// Finish a MoMo checkout given the `resultCode` MoMo redirected back with.
///
/// The stashed checkout state is kept after a failed payment and removed
/// once the order is created.
pub async fn complete_momo_payment(
    api: &ApiClient,
    result_code: &str,
) -> Result<MomoReturn, ClientError> {
    let result_code = result_code.trim();
    if result_code != MOMO_SUCCESS {
        warn!(result_code, "MoMo payment failed");
        return Ok(MomoReturn::Failed {
            result_code: result_code.to_string(),
        });
    }

    let store = api.store();
    let Some(info) = store.get::<CheckoutInfo>(CHECKOUT_INFO_KEY)? else {
        return Ok(MomoReturn::NothingPending);
    };

    let order = api.orders().create_after_payment(&info).await?;
    let code = order.code.clone().or_else(|| info.order_code.clone());

    match store.get::<LatestOrder>(LATEST_ORDER_KEY) {
        Ok(Some(mut latest)) => {
            latest.order_id = Some(order.id.clone());
            latest.code = code.clone();
            if let Err(e) = store.set(LATEST_ORDER_KEY, &latest) {
                warn!(error = %e, "could not update latest order");
            }
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "could not read latest order"),
    }
    if let Err(e) = store.remove(CHECKOUT_INFO_KEY) {
        warn!(error = %e, "could not clear checkout info");
    }

    info!(order_id = %order.id, code = ?code, direct = info.direct_checkout, "paid order created");
    Ok(MomoReturn::Created(order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{client, path};
    use lila_commerce::checkout::{CheckoutSummary, PaymentMethod, ShippingInfo};
    use lila_commerce::{CartItemId, Money, OrderId};
    use lila_data::Method;
    use serde_json::json;

    fn stash(api: &ApiClient) {
        let info = CheckoutInfo {
            payment_method: PaymentMethod::Momo,
            order_code: Some("LS0042".into()),
            direct_checkout: false,
            product_id: None,
            quantity: None,
            variant_id: None,
            address_id: None,
            shipping_address: "{}".into(),
            shipping_fee: Money::new(30_000),
            cart_item_ids: vec![CartItemId::new("ci1")],
            summary: CheckoutSummary::new(&[], Money::new(30_000), Money::ZERO),
            address: ShippingInfo {
                name: "Lan".into(),
                phone: "0901234567".into(),
                address: "12 Lê Lợi".into(),
            },
        };
        api.store().set(CHECKOUT_INFO_KEY, &info).unwrap();
    }

    #[tokio::test]
    async fn test_failed_payment_keeps_state() {
        let (api, mock) = client();
        stash(&api);
        let outcome = complete_momo_payment(&api, "1006").await.unwrap();
        assert_eq!(
            outcome,
            MomoReturn::Failed {
                result_code: "1006".into()
            }
        );
        assert!(api.store().contains(CHECKOUT_INFO_KEY));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_nothing_pending() {
        let (api, _mock) = client();
        assert_eq!(
            complete_momo_payment(&api, "0").await.unwrap(),
            MomoReturn::NothingPending
        );
    }

    #[tokio::test]
    async fn test_success_creates_order_and_clears_state() {
        let (api, mock) = client();
        stash(&api);
        mock.ok(
            Method::Post,
            &path("/orders/create-after-payment"),
            json!({"id": "o42", "code": "LS0042", "status": "PAID"}),
        );

        let outcome = complete_momo_payment(&api, " 0 ").await.unwrap();
        let MomoReturn::Created(order) = outcome else {
            panic!("expected an order");
        };
        assert_eq!(order.id, OrderId::new("o42"));
        assert!(!api.store().contains(CHECKOUT_INFO_KEY));

        let body = mock.requests()[0].json_body().unwrap();
        assert_eq!(body["orderCode"], "LS0042");
        assert_eq!(body["paymentMethod"], "MOMO");
        assert_eq!(body["cartItemIds"], json!(["ci1"]));
    }

    #[tokio::test]
    async fn test_create_failure_keeps_state() {
        let (api, mock) = client();
        stash(&api);
        mock.api_error(
            Method::Post,
            &path("/orders/create-after-payment"),
            400,
            5001,
            "Order already created",
        );
        assert!(complete_momo_payment(&api, "0").await.is_err());
        assert!(api.store().contains(CHECKOUT_INFO_KEY));
    }
}
