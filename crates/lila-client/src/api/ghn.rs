use super::ApiClient;
use crate::error::ClientError;
use lila_commerce::checkout::{
    normalize_districts, normalize_provinces, normalize_wards, District, FeeQuote, FeeRequest,
    LeadTimeQuote, LeadTimeRequest, Province, Ward,
};
use lila_data::Method;
use serde_json::Value;

/// GHN master data and quotes, proxied by the backend under `/ghn`.
pub struct GhnApi<'a> {
    client: &'a ApiClient,
}

impl<'a> GhnApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    async fn records(&self, request: lila_data::ClientRequestBuilder) -> Result<Value, ClientError> {
        Ok(self
            .client
            .send_optional::<Value>(request)
            .await?
            .unwrap_or(Value::Null))
    }

    pub async fn provinces(&self) -> Result<Vec<Province>, ClientError> {
        let payload = self
            .records(self.client.request(Method::Get, "/ghn/provinces"))
            .await?;
        Ok(normalize_provinces(&payload))
    }

    pub async fn districts(&self, province_id: i64) -> Result<Vec<District>, ClientError> {
        let payload = self
            .records(
                self.client
                    .request(Method::Get, "/ghn/districts")
                    .query("provinceId", province_id),
            )
            .await?;
        Ok(normalize_districts(&payload))
    }

    pub async fn wards(&self, district_id: i64) -> Result<Vec<Ward>, ClientError> {
        let payload = self
            .records(
                self.client
                    .request(Method::Get, "/ghn/wards")
                    .query("districtId", district_id),
            )
            .await?;
        Ok(normalize_wards(&payload))
    }

    pub async fn fee(&self, request: &FeeRequest) -> Result<FeeQuote, ClientError> {
        self.client
            .send(self.client.request(Method::Post, "/ghn/fee").json(request))
            .await
    }

    pub async fn lead_time(&self, request: &LeadTimeRequest) -> Result<LeadTimeQuote, ClientError> {
        self.client
            .send(self.client.request(Method::Post, "/ghn/leadtime").json(request))
            .await
    }
}
