use super::{segment, ApiClient};
use crate::error::ClientError;
use lila_commerce::checkout::{Address, AddressPayload};
use lila_commerce::AddressId;
use lila_data::Method;
use tracing::info;

/// The signed-in customer's address book.
pub struct AddressApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AddressApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Address>, ClientError> {
        self.client.get_list("/addresses").await
    }

    /// Create an address; the payload is trimmed and validated first.
    pub async fn create(&self, payload: AddressPayload) -> Result<Address, ClientError> {
        let payload = payload.validate()?;
        let address: Address = self
            .client
            .send(self.client.request(Method::Post, "/addresses").json(&payload))
            .await?;
        info!(address_id = %address.id, "address created");
        Ok(address)
    }

    pub async fn update(
        &self,
        id: &AddressId,
        payload: AddressPayload,
    ) -> Result<Address, ClientError> {
        let payload = payload.validate()?;
        let path = format!("/addresses/{}", segment(id.as_str()));
        self.client
            .send(self.client.request(Method::Put, &path).json(&payload))
            .await
    }

    pub async fn delete(&self, id: &AddressId) -> Result<(), ClientError> {
        let path = format!("/addresses/{}", segment(id.as_str()));
        self.client
            .send_unit(self.client.request(Method::Delete, &path))
            .await
    }

    pub async fn set_default(&self, id: &AddressId) -> Result<(), ClientError> {
        let path = format!("/addresses/{}/default", segment(id.as_str()));
        self.client
            .send_unit(self.client.request(Method::Put, &path))
            .await
    }
}
