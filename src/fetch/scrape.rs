//! Sequential resort scraping against a single Overpass mirror.

use std::time::Duration;

use indicatif::ProgressBar;
use tracing::{info, warn};

use skigraph::error::Result;
use skigraph::models::StationPayload;
use skigraph::overpass::OverpassClient;

use crate::config::GlobalConfig;

pub struct Scraper {
    overpass: OverpassClient,
    pause: Duration,
}

impl Scraper {
    /// Pick a working mirror from the configured list
    pub async fn connect(global: &GlobalConfig) -> Result<Self> {
        let overpass =
            OverpassClient::discover(&global.overpass_endpoints, global.query_timeout()).await?;
        Ok(Self {
            overpass,
            pause: global.pause(),
        })
    }

    pub async fn station(&self, name: &str) -> Result<Option<StationPayload>> {
        self.overpass.station_info(name).await
    }

    /// Scrape every resort in order, pausing between queries to stay within
    /// the public mirrors' fair-use limits. The first failing query aborts
    /// the whole run.
    pub async fn all(
        &self,
        stations: &[String],
        progress: Option<&ProgressBar>,
    ) -> Result<Vec<StationPayload>> {
        let mut results = Vec::with_capacity(stations.len());

        for (i, name) in stations.iter().enumerate() {
            if i > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }

            match self.station(name).await? {
                Some(info) => results.push(info),
                None => warn!("No Overpass result set for {}", name),
            }

            if let Some(pb) = progress {
                pb.inc(1);
            }
        }

        info!(
            "Collected {} of {} stations",
            results.len(),
            stations.len()
        );
        Ok(results)
    }
}
