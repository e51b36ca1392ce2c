//! Ski resort scraper service.
//!
//! Queries the Overpass API for pistes and lifts of every configured resort
//! and forwards the raw payload, either to an arbitrary destination or to
//! the process service.

mod config;
mod scrape;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use skigraph::error::PipelineError;
use skigraph::forward::{DestinationReply, Forwarder};
use skigraph::models::StationPayload;
use skigraph::request::{parse_body, validate_destination, FetchForProcessRequest, ForwardRequest};
use skigraph::server::listen_address;

use crate::config::Config;
use crate::scrape::Scraper;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

const DEFAULT_FORWARD_URL: &str = "http://httpbin.org/post";

#[derive(Parser, Debug)]
#[command(name = "fetch")]
#[command(about = "Scrape ski resort pistes and lifts from Overpass")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    listen: String,

    /// Port override (Cloud Run style); keeps the listen host
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// TOML config with Overpass mirrors and the resort list
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Process service endpoint used by /fetch-for-process
    #[arg(long, default_value = "http://localhost:8081/process")]
    process_url: String,

    /// Resort used by /test-single-station
    #[arg(long, default_value = "Vars")]
    test_station: String,

    /// Scrape once into this JSON file instead of serving
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Application state shared across handlers
struct AppState {
    config: Config,
    forwarder: Forwarder,
    process_url: String,
    test_station: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.config {
        Some(path) => {
            info!("Loading config from {}", path.display());
            Config::load_from_file(path)?
        }
        None => Config::default(),
    };
    info!(
        "{} stations, {} Overpass endpoints",
        config.stations.len(),
        config.global.overpass_endpoints.len()
    );

    if let Some(output) = &args.output {
        return dump_to_file(&config, output).await;
    }

    let state = Arc::new(AppState {
        config,
        forwarder: Forwarder::new()?,
        process_url: args.process_url,
        test_station: args.test_station,
    });

    // Build router
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/fetch-stations", post(fetch_stations_handler))
        .route("/test-single-station", post(test_single_station_handler))
        .route("/fetch-for-process", post(fetch_for_process_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listen = listen_address(&args.listen, args.port);
    info!("Starting server on {}", listen);

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// One-shot scrape written to disk
async fn dump_to_file(config: &Config, output: &Path) -> Result<()> {
    let stations = config.station_names();
    let scraper = Scraper::connect(&config.global).await?;

    let pb = ProgressBar::new(stations.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let results = scraper.all(&stations, Some(&pb)).await?;
    pb.finish_with_message("done");

    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &serde_json::json!({ "data": results }))
        .context("Failed to write payload")?;

    info!("Wrote {} stations to {}", results.len(), output.display());
    Ok(())
}

async fn index_handler() -> &'static str {
    "The ski data API is running"
}

#[derive(Serialize)]
struct DestinationReport {
    status_code: u16,
    headers: std::collections::BTreeMap<String, String>,
    response_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    json: Option<serde_json::Value>,
}

impl DestinationReport {
    fn from_reply(reply: &DestinationReply, max_chars: usize) -> Self {
        Self {
            status_code: reply.status_code,
            headers: reply.headers.clone(),
            response_text: reply.preview(max_chars),
            json: reply.json(),
        }
    }
}

#[derive(Serialize)]
struct ForwardReport {
    status: &'static str,
    data_sent_to: String,
    stations_count: usize,
    payload_size: usize,
    destination_response: DestinationReport,
    completed_at: DateTime<Utc>,
}

fn payload_size(payload: &serde_json::Value) -> usize {
    serde_json::to_vec(payload).map(|v| v.len()).unwrap_or(0)
}

fn required_destination(raw: Option<&str>) -> Result<String, PipelineError> {
    let raw = raw.ok_or_else(|| {
        PipelineError::InvalidRequestShape("Missing 'destination_url'".to_string())
    })?;
    validate_destination(raw)?;
    Ok(raw.to_string())
}

/// Scrape every resort and forward the raw payload
async fn fetch_stations_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ForwardReport>, PipelineError> {
    let request: ForwardRequest = parse_body(&body)?.unwrap_or_default();
    let destination = required_destination(request.destination_url.as_deref())?;

    let scraper = Scraper::connect(&state.config.global).await?;
    let results = scraper.all(&state.config.station_names(), None).await?;

    let payload = serde_json::json!({ "data": results });
    let size = payload_size(&payload);
    info!(
        "Sending {} stations ({} bytes) to {}",
        results.len(),
        size,
        destination
    );

    let reply = state
        .forwarder
        .post(&destination, &payload, &request.headers, Duration::from_secs(60))
        .await?;

    Ok(Json(ForwardReport {
        status: "success",
        data_sent_to: destination,
        stations_count: results.len(),
        payload_size: size,
        destination_response: DestinationReport::from_reply(&reply, 1000),
        completed_at: Utc::now(),
    }))
}

#[derive(Serialize)]
struct SingleStationReport {
    status: &'static str,
    station_tested: String,
    pistes: usize,
    remontees: usize,
    payload_size: usize,
    destination_response: DestinationReport,
}

/// Scrape the test resort only and forward it
async fn test_single_station_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, PipelineError> {
    let request: ForwardRequest = parse_body(&body)?.unwrap_or_default();

    let scraper = Scraper::connect(&state.config.global).await?;
    let Some(info) = scraper.station(&state.test_station).await? else {
        let message = format!("No data found for {}", state.test_station);
        return Ok((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": message })),
        )
            .into_response());
    };

    let destination = required_destination(request.destination_url.as_deref())?;
    let report = forward_single(&state, &destination, info).await?;
    Ok(Json(report).into_response())
}

async fn forward_single(
    state: &AppState,
    destination: &str,
    info: StationPayload,
) -> Result<SingleStationReport, PipelineError> {
    let (pistes, remontees) = (info.pistes.len(), info.remontees.len());
    let payload = serde_json::json!({ "data": [info] });
    let size = payload_size(&payload);
    info!(
        "Testing with {}: {} pistes, {} lifts, {} bytes",
        state.test_station, pistes, remontees, size
    );

    // Only the default JSON headers here
    let reply = state
        .forwarder
        .post(destination, &payload, &Default::default(), Duration::from_secs(15))
        .await?;

    Ok(SingleStationReport {
        status: "test_single_success",
        station_tested: state.test_station.clone(),
        pistes,
        remontees,
        payload_size: size,
        destination_response: DestinationReport::from_reply(&reply, 500),
    })
}

#[derive(Serialize)]
struct ProcessReport {
    status: &'static str,
    process_url: String,
    forward_to_url: String,
    stations_collected: usize,
    payload_size: usize,
    process_response: ProcessReply,
}

#[derive(Serialize)]
struct ProcessReply {
    status_code: u16,
    headers: std::collections::BTreeMap<String, String>,
    response: serde_json::Value,
}

/// Scrape every resort and hand the payload to the process service
async fn fetch_for_process_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ProcessReport>, PipelineError> {
    let request: FetchForProcessRequest = parse_body(&body)?.unwrap_or_default();
    let forward_to = request
        .forward_to_url
        .unwrap_or_else(|| DEFAULT_FORWARD_URL.to_string());
    validate_destination(&forward_to)?;

    let scraper = Scraper::connect(&state.config.global).await?;
    let results = scraper.all(&state.config.station_names(), None).await?;

    let payload = serde_json::json!({
        "data": results,
        "destination_url": forward_to,
    });
    let size = payload_size(&payload);
    info!(
        "Sending {} stations to {}, to be forwarded to {}",
        results.len(),
        state.process_url,
        forward_to
    );

    let reply = state
        .forwarder
        .post(
            &state.process_url,
            &payload,
            &Default::default(),
            Duration::from_secs(60),
        )
        .await?;

    let response = reply
        .json()
        .unwrap_or_else(|| serde_json::Value::String(reply.preview(1000)));

    Ok(Json(ProcessReport {
        status: "success",
        process_url: state.process_url.clone(),
        forward_to_url: forward_to,
        stations_collected: results.len(),
        payload_size: size,
        process_response: ProcessReply {
            status_code: reply.status_code,
            headers: reply.headers,
            response,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_destination() {
        assert!(matches!(
            required_destination(None),
            Err(PipelineError::InvalidRequestShape(_))
        ));
        assert_eq!(
            required_destination(Some("https://example.com/in")).unwrap(),
            "https://example.com/in"
        );
    }

    #[test]
    fn test_destination_report_truncates() {
        let mut headers = std::collections::BTreeMap::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());
        let reply = DestinationReply {
            status_code: 502,
            headers,
            body: "x".repeat(2000),
        };

        let report = DestinationReport::from_reply(&reply, 1000);
        assert_eq!(report.response_text.len(), 1000);
        assert!(report.json.is_none());
        assert_eq!(report.status_code, 502);
    }
}
