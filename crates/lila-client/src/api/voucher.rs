use super::{segment, ApiClient};
use crate::error::ClientError;
use lila_commerce::voucher::Voucher;
use lila_commerce::VoucherId;

/// Customer-facing voucher reads.
pub struct VoucherApi<'a> {
    client: &'a ApiClient,
}

impl<'a> VoucherApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Vouchers currently offered to customers.
    pub async fn active(&self) -> Result<Vec<Voucher>, ClientError> {
        self.client.get_list("/vouchers/active").await
    }

    pub async fn get(&self, id: &VoucherId) -> Result<Voucher, ClientError> {
        self.client
            .get(&format!("/vouchers/{}", segment(id.as_str())))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use lila_commerce::voucher::{ApplyScope, VoucherStatus};
    use lila_data::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_active_vouchers_decode() {
        let (client, mock) = client();
        mock.ok(
            Method::Get,
            &path("/vouchers/active"),
            json!([{
                "id": "v1",
                "code": "SALE10",
                "discountValueType": "PERCENTAGE",
                "discountValue": 10,
                "applyScope": "PRODUCT",
                "productApply": [{"id": "p1"}, 42],
                "status": "APPROVED",
                "isActive": 1
            }]),
        );
        let vouchers = client.vouchers().active().await.unwrap();
        assert_eq!(vouchers.len(), 1);
        assert_eq!(vouchers[0].apply_scope, ApplyScope::Product);
        assert_eq!(vouchers[0].status, VoucherStatus::Approved);
        assert_eq!(vouchers[0].product_apply, vec!["p1".to_string(), "42".to_string()]);
    }
}
