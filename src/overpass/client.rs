//! Overpass API client: mirror selection and per-resort queries.

use std::time::Duration;

use reqwest::{header::CONTENT_TYPE, Client};
use url::form_urlencoded;
use tracing::{debug, info, warn};

use super::dto::OverpassResponse;
use super::extract::extract_station;
use crate::error::{PipelineError, Result};
use crate::models::StationPayload;

/// Public Overpass mirrors, tried in order
pub const DEFAULT_ENDPOINTS: &[&str] = &[
    "https://overpass.kumi.systems/api/interpreter",
    "https://overpass-api.de/api/interpreter",
    "https://lz4.overpass-api.de/api/interpreter",
];

/// Cheap query used to check that a mirror answers at all
const PROBE_QUERY: &str = "[out:json][timeout:5];node(1);out;";
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Pistes and aerialways inside the area named after the resort
fn resort_query(station: &str) -> String {
    // Quotes would end the area filter early
    let station = station.replace('"', "\\\"");
    format!(
        r#"
    [out:json][timeout:25];
    area["name"="{station}"]->.a;
    (
      way(area.a)["piste:type"];
      relation(area.a)["piste:type"];
      node(area.a)["aerialway"];
      way(area.a)["aerialway"];
      relation(area.a)["aerialway"];
    );
    out body;
    >;
    out skel qt;
    "#
    )
}

/// `data=<query>` encoded as a form body
fn form_body(station: &str) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair("data", &resort_query(station))
        .finish()
}

/// Client bound to one responsive Overpass mirror
#[derive(Clone)]
pub struct OverpassClient {
    client: Client,
    endpoint: String,
}

impl OverpassClient {
    /// Bind to a known endpoint without probing it
    pub fn new(endpoint: &str, query_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent("skigraph/0.1 (ski area scraper)")
            .timeout(query_timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    /// Probe each endpoint once, in order, and bind to the first one that
    /// answers the test query with a success status.
    pub async fn discover(endpoints: &[String], query_timeout: Duration) -> Result<Self> {
        let probe = Client::builder().timeout(PROBE_TIMEOUT).build()?;

        for url in endpoints {
            debug!("Probing Overpass endpoint {}", url);
            match probe.post(url).body(PROBE_QUERY).send().await {
                Ok(response) if response.status().is_success() => {
                    info!("Using Overpass endpoint {}", url);
                    return Self::new(url, query_timeout);
                }
                Ok(response) => {
                    warn!("Overpass endpoint {} answered {}", url, response.status());
                }
                Err(e) => {
                    warn!("Overpass endpoint {} unreachable: {}", url, e);
                }
            }
        }

        Err(PipelineError::UpstreamUnavailable(
            "no Overpass API endpoint available".to_string(),
        ))
    }

    /// Run the resort query and return the raw answer
    pub async fn query_resort(&self, station: &str) -> Result<OverpassResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form_body(station))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<OverpassResponse>().await?)
    }

    /// Scrape one resort. `None` when Overpass returned no element list.
    pub async fn station_info(&self, station: &str) -> Result<Option<StationPayload>> {
        let response = self.query_resort(station).await?;
        Ok(extract_station(station, &response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resort_query_names_area() {
        let query = resort_query("Val d'Isère");
        assert!(query.contains(r#"area["name"="Val d'Isère"]->.a;"#));
        assert!(query.contains(r#"way(area.a)["piste:type"];"#));
        assert!(query.starts_with("\n    [out:json][timeout:25];"));
    }

    #[test]
    fn test_resort_query_escapes_quotes() {
        let query = resort_query(r#"Le "Grand" Domaine"#);
        assert!(query.contains(r#"area["name"="Le \"Grand\" Domaine"]"#));
    }

    #[test]
    fn test_form_body_is_encoded() {
        let body = form_body("Ax 3 Domaines");
        assert!(body.starts_with("data="));
        assert!(body.contains("Ax+3+Domaines"));
        assert!(!body.contains('\n'));
    }
}
