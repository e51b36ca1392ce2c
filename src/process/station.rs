//! Per-resort processing: build features, infer connectivity, collect outcomes.

use axum::http::StatusCode;
use serde::Serialize;
use tracing::info;

use skigraph::connectivity::find_connections;
use skigraph::models::{ProcessedStation, StationPayload};

/// Build slopes and lifts from a scraped resort and connect them
pub fn process_station(payload: &StationPayload, tolerance: f64) -> ProcessedStation {
    let mut slopes = payload.slopes();
    let mut chair_lifts = payload.lifts();

    let report = find_connections(&mut slopes, &mut chair_lifts, tolerance);
    info!(
        "{}: {} connections over {} slopes and {} lifts",
        payload.station_name(),
        report.total(),
        slopes.len(),
        chair_lifts.len()
    );

    ProcessedStation {
        station: payload.station_name().to_string(),
        slopes,
        chair_lifts,
    }
}

#[derive(Debug, Serialize)]
pub struct StationSuccess {
    pub station: String,
    pub status: &'static str,
    pub response: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct StationFailure {
    pub station: String,
    pub error: String,
}

/// Body returned by `POST /process`
#[derive(Debug, Serialize)]
pub struct ProcessSummary {
    pub status: &'static str,
    pub successful_stations: usize,
    pub failed_stations: usize,
    pub results: Vec<StationSuccess>,
    /// `null` when every station went through
    pub errors: Option<Vec<StationFailure>>,
}

#[derive(Debug, Default)]
pub struct Outcomes {
    results: Vec<StationSuccess>,
    errors: Vec<StationFailure>,
}

impl Outcomes {
    pub fn success(&mut self, station: &str, response: Option<serde_json::Value>) {
        self.results.push(StationSuccess {
            station: station.to_string(),
            status: "success",
            response,
        });
    }

    pub fn failure(&mut self, station: &str, error: String) {
        self.errors.push(StationFailure {
            station: station.to_string(),
            error,
        });
    }

    /// 200 when everything was forwarded, 207 otherwise
    pub fn status_code(&self) -> StatusCode {
        if self.errors.is_empty() {
            StatusCode::OK
        } else {
            StatusCode::MULTI_STATUS
        }
    }

    pub fn into_summary(self) -> ProcessSummary {
        ProcessSummary {
            status: "completed",
            successful_stations: self.results.len(),
            failed_stations: self.errors.len(),
            results: self.results,
            errors: if self.errors.is_empty() {
                None
            } else {
                Some(self.errors)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::Coord;
    use skigraph::models::{Connection, FeatureKind};

    fn payload(value: serde_json::Value) -> StationPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_process_station_swaps_then_connects() {
        // Slope ends at the lift base, lift top feeds the slope start
        let p = payload(serde_json::json!({
            "station": "Vars",
            "pistes": [
                { "name": "Olympique", "difficulty": "Noir", "coords": [[44.60, 6.70], [44.55, 6.65]] }
            ],
            "remontees": [
                { "name": "TSD Peynier", "type": "chair_lift", "coords": [[44.5501, 6.65], [44.60, 6.7002]] },
                { "name": "Tapis", "type": "magic_carpet", "coords": [[44.55, 6.65], [44.56, 6.66]] }
            ]
        }));

        let processed = process_station(&p, 0.0006);

        assert_eq!(processed.station, "Vars");
        assert_eq!(processed.chair_lifts.len(), 1);
        assert_eq!(
            processed.chair_lifts[0].connections,
            vec![Connection::slope("Olympique", Coord { x: 6.65, y: 44.55 })]
        );
        assert_eq!(processed.slopes[0].connections.len(), 1);
        assert_eq!(processed.slopes[0].connections[0].kind, FeatureKind::ChairLift);
        assert_eq!(
            processed.slopes[0].connections[0].coordinates,
            Coord { x: 6.7002, y: 44.60 }
        );
    }

    #[test]
    fn test_process_station_forwarded_shape() {
        let p = payload(serde_json::json!({
            "pistes": [{ "name": "Solo", "coords": [[1.0, 2.0]] }]
        }));

        let value = serde_json::to_value(process_station(&p, 0.0006)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "station": "Unknown Station",
                "slopes": [{
                    "name": "Solo",
                    "difficulty": "unknown",
                    "coordinates": [[2.0, 1.0]],
                    "connection": []
                }],
                "chair_lifts": []
            })
        );
    }

    #[test]
    fn test_outcomes_all_success() {
        let mut outcomes = Outcomes::default();
        outcomes.success("Tignes", None);
        assert_eq!(outcomes.status_code(), StatusCode::OK);

        let value = serde_json::to_value(outcomes.into_summary()).unwrap();
        assert_eq!(value["status"], "completed");
        assert_eq!(value["successful_stations"], 1);
        assert!(value["errors"].is_null());
    }

    #[test]
    fn test_outcomes_partial_failure() {
        let mut outcomes = Outcomes::default();
        outcomes.success("Tignes", Some(serde_json::json!({ "id": 3 })));
        outcomes.failure("Vars", "upstream timed out".to_string());
        assert_eq!(outcomes.status_code(), StatusCode::MULTI_STATUS);

        let summary = outcomes.into_summary();
        assert_eq!(summary.failed_stations, 1);
        assert_eq!(summary.errors.as_ref().unwrap()[0].station, "Vars");
    }
}
