//! Low-level HTTP transport for the OpsGenie REST API.
//!
//! Wraps a shared `reqwest::Client` with GenieKey authentication, JSON
//! bodies, and the `{"data": ...}` response envelope. Non-success statuses
//! become [`ProviderError::Api`]; a 404 is surfaced that way too so callers
//! can treat it as drift via [`ProviderError::is_not_found`].

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::ProviderError;

const USER_AGENT: &str = concat!("terraform-provider-opsgenie/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP core used by every per-family API client.
#[derive(Debug, Clone)]
pub(crate) struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpClient {
    /// Build the transport. Fails fast on a malformed key or a reqwest
    /// builder error; no request is sent here.
    pub(crate) fn new(api_key: &str, base_url: &str) -> Result<Self, ProviderError> {
        if api_key.is_empty() {
            return Err(ProviderError::Configuration(
                "api_key must not be empty".to_string(),
            ));
        }
        if api_key.chars().any(|c| c.is_whitespace()) {
            return Err(ProviderError::Configuration(
                "api_key must not contain whitespace".to_string(),
            ));
        }

        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
        self.request(Method::GET, path, None::<&()>).await
    }

    pub(crate) async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ProviderError> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub(crate) async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ProviderError> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), ProviderError> {
        let _: Value = self.request(Method::DELETE, path, None::<&()>).await?;
        Ok(())
    }

    async fn request<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, "opsgenie api request");

        let mut req = self
            .http
            .request(method, &url)
            .header("Authorization", format!("GenieKey {}", self.api_key));
        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ProviderError::api(status.as_u16(), api_message(status, &text)));
        }

        // DELETEs and some updates return an empty or data-less body.
        let value: Value = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };
        let data = match value {
            Value::Object(mut obj) => obj.remove("data").unwrap_or(Value::Null),
            other => other,
        };

        serde_json::from_value(data).map_err(ProviderError::from)
    }
}

/// Extract the API's `message` field when the error body is JSON, otherwise
/// fall back to the raw body or the status reason.
fn api_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(body) {
        if let Some(Value::String(message)) = obj.get("message") {
            return message.clone();
        }
    }
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        body.to_string()
    }
}
