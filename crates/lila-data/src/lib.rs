//! HTTP client plumbing for the Lila Shop backend.
//!
//! Provides a small builder API over a pluggable [`Transport`], plus the
//! backend's `{ code, message, result }` envelope and error codes.
//!
//! # Example
//!
//! ```rust,ignore
//! use lila_data::{FetchClient, ReqwestTransport};
//! use std::time::Duration;
//!
//! let transport = ReqwestTransport::new(Duration::from_secs(15))?;
//! let client = FetchClient::new(transport).with_base_url("http://localhost:8080/lila_shop");
//!
//! let cart: serde_json::Value = client
//!     .get("/cart")
//!     .bearer_auth(token)
//!     .send()
//!     .await?
//!     .envelope_required()?;
//! ```

mod envelope;
mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod request;
mod response;
mod transport;

pub use envelope::{ApiResponse, ErrorCode, SUCCESS_CODE};
pub use error::FetchError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockTransport;
pub use request::{Method, RequestBuilder};
pub use response::Response;
pub use transport::{ReqwestTransport, Transport};

use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// HTTP client for the backend.
#[derive(Clone)]
pub struct FetchClient {
    transport: Arc<dyn Transport>,
    base_url: Option<String>,
    default_headers: HashMap<String, String>,
}

impl std::fmt::Debug for FetchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchClient")
            .field("base_url", &self.base_url)
            .field("default_headers", &self.default_headers.keys())
            .finish_non_exhaustive()
    }
}

impl FetchClient {
    /// Create a client over `transport`.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::from_arc(Arc::new(transport))
    }

    /// Create a client sharing an existing transport.
    pub fn from_arc(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            base_url: None,
            default_headers: HashMap::new(),
        }
    }

    /// Create a client with a base URL that will be prepended to all requests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Add a default header that will be included in all requests.
    pub fn with_default_header(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Create a GET request.
    pub fn get(&self, url: impl Into<String>) -> ClientRequestBuilder {
        self.request(Method::Get, url)
    }

    /// Create a POST request.
    pub fn post(&self, url: impl Into<String>) -> ClientRequestBuilder {
        self.request(Method::Post, url)
    }

    /// Create a PUT request.
    pub fn put(&self, url: impl Into<String>) -> ClientRequestBuilder {
        self.request(Method::Put, url)
    }

    /// Create a PATCH request.
    pub fn patch(&self, url: impl Into<String>) -> ClientRequestBuilder {
        self.request(Method::Patch, url)
    }

    /// Create a DELETE request.
    pub fn delete(&self, url: impl Into<String>) -> ClientRequestBuilder {
        self.request(Method::Delete, url)
    }

    /// Create a request with a custom method.
    pub fn request(&self, method: Method, url: impl Into<String>) -> ClientRequestBuilder {
        let url = url.into();
        let full_url = match &self.base_url {
            Some(base) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                format!("{}/{}", base.trim_end_matches('/'), url.trim_start_matches('/'))
            }
            _ => url,
        };

        let mut builder = RequestBuilder::new(method, full_url);
        for (key, value) in &self.default_headers {
            builder = builder.header(key.clone(), value.clone());
        }

        ClientRequestBuilder {
            transport: Arc::clone(&self.transport),
            builder,
            error: None,
        }
    }
}

/// A request builder bound to a client.
pub struct ClientRequestBuilder {
    transport: Arc<dyn Transport>,
    builder: RequestBuilder,
    error: Option<FetchError>,
}

impl ClientRequestBuilder {
    /// Add a header to the request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.header(key, value);
        self
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.builder = self.builder.query(key, value);
        self
    }

    /// Set the request body as JSON. Serialization failures surface from
    /// [`send`](Self::send).
    pub fn json<T: serde::Serialize + ?Sized>(mut self, value: &T) -> Self {
        match self.builder.clone().json(value) {
            Ok(builder) => self.builder = builder,
            Err(e) => self.error = Some(e),
        }
        self
    }

    /// Add a bearer token authorization header.
    pub fn bearer_auth(mut self, token: impl AsRef<str>) -> Self {
        self.builder = self.builder.bearer_auth(token);
        self
    }

    /// Add the bearer header when a token is present.
    pub fn maybe_bearer(self, token: Option<&str>) -> Self {
        match token {
            Some(token) if !token.trim().is_empty() => self.bearer_auth(token),
            _ => self,
        }
    }

    /// Inspect the request as built so far.
    pub fn build(&self) -> &RequestBuilder {
        &self.builder
    }

    /// Send the request and return the response.
    pub async fn send(self) -> Result<Response, FetchError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let method = self.builder.method;
        let url = self.builder.url.clone();
        self.transport.send(self.builder).await.inspect_err(|e| {
            warn!(%method, %url, error = %e, "request failed");
        })
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        ApiResponse, ErrorCode, FetchClient, FetchError, Method, Response, Transport,
    };
}
