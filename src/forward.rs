//! JSON POST to caller-supplied destinations.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use tracing::{error, info};

use crate::error::{PipelineError, Result};

/// What the destination answered, kept for reporting back to our caller
#[derive(Debug, Clone, Serialize)]
pub struct DestinationReply {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    #[serde(skip)]
    pub body: String,
}

impl DestinationReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn is_json(&self) -> bool {
        self.headers
            .get("content-type")
            .map_or(false, |ct| ct.starts_with("application/json"))
    }

    /// Parsed body, only when the destination declared JSON
    pub fn json(&self) -> Option<serde_json::Value> {
        if !self.is_json() {
            return None;
        }
        serde_json::from_str(&self.body).ok()
    }

    /// First `max_chars` characters of the body
    pub fn preview(&self, max_chars: usize) -> String {
        self.body.chars().take(max_chars).collect()
    }
}

/// JSON content headers, overridden by whatever the caller supplied
pub fn build_headers(extra: &HashMap<String, String>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    for (name, value) in extra {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            PipelineError::InvalidRequestShape(format!("invalid header name: {}", name))
        })?;
        let value = HeaderValue::from_str(value).map_err(|_| {
            PipelineError::InvalidRequestShape(format!("invalid value for header {}", name))
        })?;
        headers.insert(name, value);
    }

    Ok(headers)
}

#[derive(Clone)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("skigraph/0.1")
            .build()?;
        Ok(Self { client })
    }

    /// POST `body` and return the reply whatever its status
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<DestinationReply> {
        let response = self
            .client
            .post(url)
            .headers(build_headers(headers)?)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!("Error posting to {}: {}", url, e);
                PipelineError::from_reqwest(e)
            })?;

        let status_code = response.status().as_u16();
        let reply_headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = response.text().await?;

        Ok(DestinationReply {
            status_code,
            headers: reply_headers,
            body,
        })
    }

    /// POST `body` and require a success status. Returns the parsed JSON
    /// answer, or `None` when the destination sent an empty body.
    pub async fn deliver<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<Option<serde_json::Value>> {
        let reply = self.post(url, body, headers, timeout).await?;

        if !reply.is_success() {
            let message = format!("{} answered HTTP {}", url, reply.status_code);
            error!("Error posting to {}: {}", url, message);
            return Err(PipelineError::UpstreamUnavailable(message));
        }

        info!("Data successfully posted to {}", url);

        if reply.body.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&reply.body)
            .map(Some)
            .map_err(|e| PipelineError::Internal(format!("non-JSON reply from {}: {}", url, e)))
    }
}
