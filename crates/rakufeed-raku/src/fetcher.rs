//! META file fetcher: one GET, classified outcome, no retries

use std::future::Future;

use rakufeed_core::{FetchError, http_client};
use reqwest::StatusCode;
use serde_json::Value;

/// Source of authoritative module names, keyed by META URL.
pub trait MetaSource: Send + Sync + 'static {
    /// Fetch the `name` field of the META file at `meta_url`.
    fn fetch_name(&self, meta_url: &str)
    -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// HTTP implementation backed by the shared reqwest client
#[derive(Debug, Clone)]
pub struct MetaFetcher {
    client: reqwest::Client,
}

impl MetaFetcher {
    pub fn new() -> Self {
        Self::with_client(http_client().clone())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for MetaFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaSource for MetaFetcher {
    fn fetch_name(
        &self,
        meta_url: &str,
    ) -> impl Future<Output = Result<String, FetchError>> + Send {
        let request = self.client.get(meta_url);
        let url = meta_url.to_string();
        async move {
            let response = request
                .send()
                .await
                .map_err(|e| FetchError::from_reqwest(&e))?;
            match response.status() {
                StatusCode::OK => {}
                StatusCode::NOT_FOUND => return Err(FetchError::NotFound { url }),
                status => {
                    return Err(FetchError::Status {
                        status: status.as_u16(),
                        url,
                    });
                }
            }
            let body = response
                .bytes()
                .await
                .map_err(|e| FetchError::from_reqwest(&e))?;
            parse_name(&body)
        }
    }
}

/// Extract a non-empty `name` string from a META JSON object.
pub fn parse_name(body: &[u8]) -> Result<String, FetchError> {
    let meta: Value = serde_json::from_slice(body).map_err(|e| FetchError::Body(e.to_string()))?;
    let Some(meta) = meta.as_object() else {
        return Err(FetchError::Body("expected a JSON object".to_string()));
    };
    match meta.get("name") {
        None | Some(Value::Null) => Err(FetchError::MissingName),
        Some(Value::String(name)) if name.is_empty() => Err(FetchError::MissingName),
        Some(Value::String(name)) => Ok(name.clone()),
        Some(other) => Err(FetchError::Body(format!("'name' is not a string: {other}"))),
    }
}
