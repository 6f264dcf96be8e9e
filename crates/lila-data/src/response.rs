//! HTTP response handling.

use crate::envelope::ApiResponse;
use crate::FetchError;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// An HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// The HTTP status code.
    pub status: u16,
    /// The response headers.
    pub headers: HashMap<String, String>,
    /// The response body.
    pub body: Vec<u8>,
}

impl Response {
    /// Create a new response.
    pub fn new(status: u16, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// A JSON response, as served by the backend.
    pub fn json_body(status: u16, value: &serde_json::Value) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self::new(status, headers, value.to_string().into_bytes())
    }

    /// Check if the response was successful (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the response was a client error (4xx status).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if the response was a server error (5xx status).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Get the response body as text.
    pub fn text(&self) -> Result<String, FetchError> {
        String::from_utf8(self.body.clone())
            .map_err(|e| FetchError::ParseError(format!("Invalid UTF-8: {}", e)))
    }

    /// Parse the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_slice(&self.body).map_err(|e| FetchError::ParseError(e.to_string()))
    }

    /// Get the raw response body.
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Get a header value.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// Decode the backend envelope and return its `result`.
    ///
    /// A non-2xx status or a non-success envelope code becomes an error
    /// carrying the backend's code and message when the body has them.
    /// Bodies that are not envelopes are decoded as the result itself.
    pub fn envelope<T: DeserializeOwned>(&self) -> Result<Option<T>, FetchError> {
        let envelope: Option<ApiResponse<serde_json::Value>> = if self.body.is_empty() {
            None
        } else {
            serde_json::from_slice::<ApiResponse<serde_json::Value>>(&self.body)
                .ok()
                .filter(|e| e.code.is_some() || e.result.is_some() || e.data.is_some())
        };

        match envelope {
            Some(env) if self.is_success() && env.is_success() => env
                .into_result()
                .map_err(|e| FetchError::ParseError(e.to_string())),
            Some(ApiResponse {
                code: Some(code),
                message,
                ..
            }) => Err(FetchError::Api {
                status: self.status,
                code,
                message: message.unwrap_or_else(|| format!("HTTP {}", self.status)),
            }),
            // Bare payloads (a JSON array, say) are taken as the result.
            _ if self.is_success() => {
                if self.body.is_empty() {
                    Ok(None)
                } else {
                    self.json().map(Some)
                }
            }
            _ => Err(self.http_error()),
        }
    }

    /// Like [`envelope`](Self::envelope) but a missing `result` is an error.
    pub fn envelope_required<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        self.envelope()?
            .ok_or_else(|| FetchError::ParseError("response has no result".into()))
    }

    /// Convert to a Result, returning an error for non-2xx status codes.
    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.http_error())
        }
    }

    fn http_error(&self) -> FetchError {
        let message = self
            .json::<serde_json::Value>()
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .or_else(|| self.text().ok().filter(|t| !t.trim().is_empty()))
            .unwrap_or_else(|| "Unknown error".to_string());
        FetchError::HttpError {
            status: self.status,
            message,
        }
    }
}
