//! Request bodies accepted by the fetch and process services.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::connectivity::DEFAULT_TOLERANCE;
use crate::error::{PipelineError, Result};
use crate::models::StationPayload;

/// Parse a JSON body. An empty body is `None`, malformed JSON an error.
pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<Option<T>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| PipelineError::InvalidRequestShape(e.to_string()))
}

/// Check that a destination is an absolute http(s) URL
pub fn validate_destination(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| PipelineError::InvalidRequestShape(format!("bad destination_url: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(PipelineError::InvalidRequestShape(format!(
            "unsupported destination scheme: {}",
            other
        ))),
    }
}

/// `POST /fetch-stations` and `POST /test-single-station`
#[derive(Debug, Default, Deserialize)]
pub struct ForwardRequest {
    pub destination_url: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// `POST /fetch-for-process`
#[derive(Debug, Default, Deserialize)]
pub struct FetchForProcessRequest {
    pub forward_to_url: Option<String>,
}

/// `POST /process`
#[derive(Debug, Default, Deserialize)]
pub struct ProcessRequest {
    pub data: Option<Vec<StationPayload>>,
    pub destination_url: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub tolerance: Option<f64>,
}

impl ProcessRequest {
    pub fn tolerance(&self) -> f64 {
        self.tolerance.unwrap_or(DEFAULT_TOLERANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_is_none() {
        let parsed: Option<ProcessRequest> = parse_body(b"  \n").unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn test_malformed_body_is_request_error() {
        let err = parse_body::<ProcessRequest>(b"{\"data\": [").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequestShape(_)));
    }

    #[test]
    fn test_process_request_defaults() {
        let req: ProcessRequest = parse_body(br#"{"data": [], "destination_url": "http://x"}"#)
            .unwrap()
            .unwrap();
        assert!(req.headers.is_empty());
        assert_eq!(req.tolerance(), DEFAULT_TOLERANCE);

        let req: ProcessRequest = parse_body(br#"{"tolerance": 0.001}"#).unwrap().unwrap();
        assert_eq!(req.tolerance(), 0.001);
        assert!(req.data.is_none());
    }

    #[test]
    fn test_validate_destination() {
        assert!(validate_destination("https://example.com/hook").is_ok());
        assert!(validate_destination("not a url").is_err());
        assert!(validate_destination("ftp://example.com").is_err());
    }
}
