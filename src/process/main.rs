//! Ski data processing service.
//!
//! Receives scraped resorts, infers slope/lift connectivity and forwards
//! each enriched resort to the caller's destination with a Firebase token.

mod station;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use skigraph::firebase::{FirebaseAuth, FirebaseCredentials};
use skigraph::forward::Forwarder;
use skigraph::models::StationPayload;
use skigraph::request::{parse_body, validate_destination, ProcessRequest};
use skigraph::server::listen_address;

use crate::station::{process_station, Outcomes};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "process")]
#[command(about = "Infer slope/lift connectivity and forward enriched resorts")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8081")]
    listen: String,

    /// Port override (Cloud Run style); keeps the listen host
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Timeout for each forwarded resort, in seconds
    #[arg(long, default_value = "30")]
    forward_timeout: u64,

    #[arg(long, env = "FIREBASE_EMAIL", hide_env_values = true)]
    firebase_email: Option<String>,

    #[arg(long, env = "FIREBASE_PASSWORD", hide_env_values = true)]
    firebase_password: Option<String>,

    #[arg(long, env = "FIREBASE_API_KEY", hide_env_values = true)]
    firebase_api_key: Option<String>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Application state shared across handlers
struct AppState {
    auth: FirebaseAuth,
    forwarder: Forwarder,
    forward_timeout: Duration,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let credentials = FirebaseCredentials {
        email: args.firebase_email,
        password: args.firebase_password,
        api_key: args.firebase_api_key,
    };
    if credentials.email.is_none()
        || credentials.password.is_none()
        || credentials.api_key.is_none()
    {
        tracing::warn!("Firebase credentials incomplete; /process will answer 401");
    }

    let state = Arc::new(AppState {
        auth: FirebaseAuth::new(credentials)?,
        forwarder: Forwarder::new()?,
        forward_timeout: Duration::from_secs(args.forward_timeout),
    });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/process", post(process_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listen = listen_address(&args.listen, args.port);
    info!("Starting server on {}", listen);

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Health check endpoint
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

/// Caller headers plus our bearer token, replacing any Authorization the
/// caller sent
fn authorized_headers(mut headers: HashMap<String, String>, token: &str) -> HashMap<String, String> {
    headers.retain(|k, _| !k.eq_ignore_ascii_case("authorization"));
    headers.insert("Authorization".to_string(), format!("Bearer {}", token));
    headers
}

/// Connect and forward every resort in the request
async fn process_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request: ProcessRequest = match parse_body(&body) {
        Ok(Some(request)) => request,
        Ok(None) => return bad_request("No JSON data provided"),
        Err(e) => return e.into_response(),
    };

    let data = match request.data.as_deref() {
        Some(data) if !data.is_empty() => data,
        _ => return bad_request("No 'data' field in JSON"),
    };
    let Some(destination) = request.destination_url.as_deref() else {
        return bad_request("No 'destination_url' provided");
    };
    if let Err(e) = validate_destination(destination) {
        return e.into_response();
    }

    let token = match state.auth.id_token().await {
        Ok(token) => token,
        Err(e) => {
            error!("Firebase sign-in failed: {}", e);
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "status": "error",
                    "message": "Failed to authenticate with Firebase"
                })),
            )
                .into_response();
        }
    };
    let headers = authorized_headers(request.headers.clone(), &token);

    let outcomes = forward_all(&state, data, destination, &headers, request.tolerance()).await;
    let status = outcomes.status_code();
    (status, Json(outcomes.into_summary())).into_response()
}

/// Process and forward resorts one after the other; a failing resort does
/// not stop the others
async fn forward_all(
    state: &AppState,
    data: &[StationPayload],
    destination: &str,
    headers: &HashMap<String, String>,
    tolerance: f64,
) -> Outcomes {
    let mut outcomes = Outcomes::default();

    for payload in data {
        let processed = process_station(payload, tolerance);

        match state
            .forwarder
            .deliver(destination, &processed, headers, state.forward_timeout)
            .await
        {
            Ok(response) => outcomes.success(&processed.station, response),
            Err(e) => outcomes.failure(&processed.station, e.to_string()),
        }
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_without_credentials() -> Arc<AppState> {
        Arc::new(AppState {
            auth: FirebaseAuth::new(FirebaseCredentials::default()).unwrap(),
            forwarder: Forwarder::new().unwrap(),
            forward_timeout: Duration::from_secs(1),
        })
    }

    async fn call(body: &str) -> (StatusCode, serde_json::Value) {
        let response = process_handler(
            State(state_without_credentials()),
            Bytes::from(body.to_string()),
        )
        .await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_empty_body_rejected() {
        let (status, body) = call("").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({ "error": "No JSON data provided" }));
    }

    #[tokio::test]
    async fn test_missing_or_empty_data_rejected() {
        let expected = serde_json::json!({ "error": "No 'data' field in JSON" });

        let (status, body) = call(r#"{"destination_url": "http://localhost/in"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, expected);

        let (status, body) = call(r#"{"data": [], "destination_url": "http://localhost/in"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, expected);
    }

    #[tokio::test]
    async fn test_missing_destination_rejected() {
        let (status, body) = call(r#"{"data": [{"station": "Vars"}]}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            serde_json::json!({ "error": "No 'destination_url' provided" })
        );
    }

    #[tokio::test]
    async fn test_data_checked_before_destination() {
        let (status, body) = call("{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({ "error": "No 'data' field in JSON" }));
    }

    #[tokio::test]
    async fn test_malformed_json_rejected() {
        let (status, body) = call(r#"{"data": ["#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_missing_credentials_answer_401() {
        let (status, body) = call(
            r#"{"data": [{"station": "Vars"}], "destination_url": "http://localhost/in"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            body,
            serde_json::json!({
                "status": "error",
                "message": "Failed to authenticate with Firebase"
            })
        );
    }

    #[tokio::test]
    async fn test_null_coordinates_do_not_reject_request() {
        // A bad feature must not fail request parsing; the request goes on
        // to authentication
        let (status, _) = call(
            r#"{
                "destination_url": "http://localhost/in",
                "data": [
                    {"station": "Good", "pistes": [{"name": "A", "coords": [[45.0, 6.0]]}]},
                    {"station": "Bad", "pistes": [{"name": "B", "coords": null}]}
                ]
            }"#,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_authorized_headers_replace_caller_auth() {
        let mut caller = HashMap::new();
        caller.insert("authorization".to_string(), "Basic abc".to_string());
        caller.insert("X-Resort-Batch".to_string(), "7".to_string());

        let headers = authorized_headers(caller, "tok");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["Authorization"], "Bearer tok");
        assert_eq!(headers["X-Resort-Batch"], "7");
    }
}
