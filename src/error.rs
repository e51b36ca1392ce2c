//! Error kinds surfaced by the pipeline collaborators.
//!
//! The connectivity engine itself never fails; everything here belongs to
//! the I/O layers around it (Overpass, Firebase, forwarding, request parsing).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("authentication failed: {0}")]
    AuthenticationFailure(String),

    #[error("upstream timed out: {0}")]
    UpstreamTimeout(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("invalid request: {0}")]
    InvalidRequestShape(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// Classify a reqwest failure. Nothing is retried, so the kind only
    /// decides what the caller gets told.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PipelineError::UpstreamTimeout(err.to_string())
        } else if err.is_connect() || err.is_status() || err.is_request() {
            PipelineError::UpstreamUnavailable(err.to_string())
        } else if err.is_decode() || err.is_body() {
            PipelineError::Internal(err.to_string())
        } else {
            PipelineError::UpstreamUnavailable(err.to_string())
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::AuthenticationFailure(_) => StatusCode::UNAUTHORIZED,
            PipelineError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            PipelineError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            PipelineError::InvalidRequestShape(_) => StatusCode::BAD_REQUEST,
            PipelineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::from_reqwest(err)
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
