//! HTTP client for the ARCA backend
//!
//! [`ApiClient`] wraps [`reqwest`] with the two behaviors every call
//! shares: the bearer token is attached automatically once a session is
//! active, and non-2xx responses are normalized into [`ApiError::Api`]
//! with the raw JSON body preserved so callers can inspect
//! backend-version-dependent error shapes (see [`crate::stock`]).

use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub mod auth;
pub mod commissions;
pub mod models;
pub mod orders;
pub mod payments;
pub mod payouts;
pub mod products;

/// Errors from the ARCA API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Best-effort human-readable message from the body.
        message: String,
        /// Raw response body, kept for error-shape probing.
        body: Value,
    },
}

impl ApiError {
    /// The raw error body, when the backend produced one.
    pub fn body(&self) -> Option<&Value> {
        match self {
            ApiError::Api { body, .. } => Some(body),
            ApiError::Request(_) => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Request(_) => None,
        }
    }
}

/// HTTP client for one ARCA backend.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Create a client for the given base URL, e.g. `https://api.arca.example`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`] (useful
    /// for connection pooling).
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url, token: RwLock::new(None) }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set or clear the bearer token attached to every request.
    pub fn set_token(&self, token: Option<String>) {
        if let Ok(mut slot) = self.token.write() {
            *slot = token;
        }
    }

    fn bearer(&self) -> Option<String> {
        self.token.read().ok().and_then(|slot| slot.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.http.get(self.url(path));
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    pub(crate) async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let request = self.http.get(self.url(path)).query(query);
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let request = self.http.post(self.url(path)).json(body);
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    /// Attach the bearer token, send, and normalize failure statuses.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let request = match self.bearer() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        Self::ensure_success(response).await
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));
        let message = error_message(&body, status.as_u16());
        tracing::debug!(status = status.as_u16(), message = %message, "API request rejected");
        Err(ApiError::Api { status: status.as_u16(), message, body })
    }
}

/// Pull a displayable message out of a backend error body: a string
/// `detail` (FastAPI convention), then `message`, then the bare status.
fn error_message(body: &Value, status: u16) -> String {
    for key in ["detail", "message"] {
        if let Some(text) = body.get(key).and_then(Value::as_str) {
            return text.to_string();
        }
    }
    if let Some(text) = body.as_str() {
        if !text.is_empty() {
            return text.to_string();
        }
    }
    format!("HTTP {status}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:8000/");
        assert_eq!(client.url("/products/"), "http://localhost:8000/products/");
    }

    #[test]
    fn test_error_message_prefers_detail() {
        let body = json!({"detail": "Sem stock", "message": "other"});
        assert_eq!(error_message(&body, 409), "Sem stock");
    }

    #[test]
    fn test_error_message_falls_back_to_status() {
        let body = json!({"detail": {"items": []}});
        assert_eq!(error_message(&body, 409), "HTTP 409");
    }

    #[test]
    fn test_api_error_exposes_body() {
        let err = ApiError::Api { status: 409, message: "Sem stock".into(), body: json!({"detail": "Sem stock"}) };
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.body().unwrap()["detail"], "Sem stock");
    }
}
