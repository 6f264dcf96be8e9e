//! Typed services over the backend REST API.
//!
//! [`ApiClient`] owns the transport, the base URL and the local store the
//! bearer token is read from. Each service is a thin borrowing view over
//! it: `client.cart().get().await?`.

mod address;
mod auth;
pub mod backoffice;
mod cart;
mod chat;
mod ghn;
mod order;
mod product;
mod voucher;

pub use address::AddressApi;
pub use auth::{AuthApi, LoginResult};
pub use cart::CartApi;
pub use chat::ChatApi;
pub use ghn::GhnApi;
pub use order::{OrderApi, PaidCheckoutRequest};
pub use product::ProductApi;
pub use voucher::VoucherApi;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::storage::LocalStore;
use lila_data::{ClientRequestBuilder, FetchClient, Method, ReqwestTransport, Transport};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Backend client shared by every service.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: FetchClient,
    store: Arc<LocalStore>,
}

impl ApiClient {
    /// A client over `transport` rooted at `base_url`.
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: impl Into<String>,
        store: Arc<LocalStore>,
    ) -> Self {
        let http = FetchClient::from_arc(transport)
            .with_base_url(base_url)
            .with_default_header("Accept", "application/json");
        Self { http, store }
    }

    /// A `reqwest`-backed client with the configured timeout and storage file.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(config.timeout())?;
        let store = LocalStore::open(config.storage.resolved_path());
        Ok(Self::new(
            Arc::new(transport),
            config.api.base_url.trim(),
            Arc::new(store),
        ))
    }

    pub fn store(&self) -> &Arc<LocalStore> {
        &self.store
    }

    pub fn token(&self) -> Option<String> {
        self.store.token()
    }

    pub fn is_signed_in(&self) -> bool {
        self.token().is_some()
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn cart(&self) -> CartApi<'_> {
        CartApi::new(self)
    }

    pub fn products(&self) -> ProductApi<'_> {
        ProductApi::new(self)
    }

    pub fn addresses(&self) -> AddressApi<'_> {
        AddressApi::new(self)
    }

    pub fn vouchers(&self) -> VoucherApi<'_> {
        VoucherApi::new(self)
    }

    pub fn ghn(&self) -> GhnApi<'_> {
        GhnApi::new(self)
    }

    pub fn orders(&self) -> OrderApi<'_> {
        OrderApi::new(self)
    }

    pub fn chat(&self) -> ChatApi<'_> {
        ChatApi::new(self)
    }

    pub fn backoffice(&self) -> backoffice::BackOffice<'_> {
        backoffice::BackOffice::new(self)
    }

    /// A request carrying the stored bearer token, when there is one.
    pub(crate) fn request(&self, method: Method, path: &str) -> ClientRequestBuilder {
        self.http
            .request(method, path)
            .maybe_bearer(self.token().as_deref())
    }

    /// Send and decode the envelope's `result`, which must be present.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        request: ClientRequestBuilder,
    ) -> Result<T, ClientError> {
        Ok(request.send().await?.envelope_required()?)
    }

    /// Send and decode the envelope's `result`, which may be absent.
    pub(crate) async fn send_optional<T: DeserializeOwned>(
        &self,
        request: ClientRequestBuilder,
    ) -> Result<Option<T>, ClientError> {
        Ok(request.send().await?.envelope()?)
    }

    /// Send and only check for success.
    pub(crate) async fn send_unit(&self, request: ClientRequestBuilder) -> Result<(), ClientError> {
        request
            .send()
            .await?
            .envelope::<serde_json::Value>()
            .map(|_| ())
            .map_err(ClientError::from)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(self.request(Method::Get, path)).await
    }

    /// GET a list; a missing result is an empty list.
    pub(crate) async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Vec<T>, ClientError> {
        Ok(self
            .send_optional(self.request(Method::Get, path))
            .await?
            .unwrap_or_default())
    }
}

/// Percent-encode one path segment.
pub(crate) fn segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for b in raw.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_segment_encoding() {
        assert_eq!(segment("abc-123"), "abc-123");
        assert_eq!(segment("a b/c"), "a%20b%2Fc");
    }

    #[tokio::test]
    async fn test_request_carries_token() {
        let (client, mock) = client();
        mock.ok(Method::Get, &path("/users/my-info"), json!({"id": "u1"}));

        let _: serde_json::Value = client.get("/users/my-info").await.unwrap();
        let sent = mock.requests();
        assert_eq!(sent[0].url, format!("{BASE}/users/my-info"));
        assert_eq!(sent[0].header_value("Authorization"), Some("Bearer tok"));
    }

    #[tokio::test]
    async fn test_no_token_no_header() {
        let (client, mock) = client();
        client.store().clear_token().unwrap();
        let _ = client.get_list::<serde_json::Value>("/vouchers/active").await;
        assert_eq!(mock.requests()[0].header_value("Authorization"), None);
        assert!(!client.is_signed_in());
    }

    #[tokio::test]
    async fn test_unauthorized_maps() {
        let (client, mock) = client();
        mock.status(Method::Get, &path("/cart"), 401);
        let err = client.get::<serde_json::Value>("/cart").await.unwrap_err();
        assert!(err.is_unauthorized());
    }
}
