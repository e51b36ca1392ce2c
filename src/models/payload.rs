//! Wire payloads exchanged between the fetch and process stages.
//!
//! The fetch stage emits coordinates in `[lat, lon]` order as Overpass hands
//! them out. The process stage swaps them to `[lon, lat]` while building
//! domain features, before any connectivity work runs.

use geo_types::{Coord, LineString};
use serde::{Deserialize, Deserializer, Serialize};

use super::{Lift, Slope};

/// Lift types that are never treated as real lifts
const IGNORED_LIFT_TYPES: &[&str] = &["magic_carpet", ""];

fn unnamed() -> String {
    "Unnamed".to_string()
}

fn unknown() -> String {
    "unknown".to_string()
}

// Scraped records carry explicit nulls as often as missing keys; both
// fall back to the field default.

fn null_as_unnamed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(unnamed))
}

fn null_as_unknown<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(unknown))
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A piste as scraped from Overpass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPiste {
    #[serde(default = "unnamed", deserialize_with = "null_as_unnamed")]
    pub name: String,
    #[serde(default = "unknown", deserialize_with = "null_as_unknown")]
    pub difficulty: String,
    /// `[lat, lon]` pairs
    #[serde(default, deserialize_with = "null_as_empty")]
    pub coords: Vec<[f64; 2]>,
}

/// A lift as scraped from Overpass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLift {
    #[serde(default = "unnamed", deserialize_with = "null_as_unnamed")]
    pub name: String,
    #[serde(rename = "type", default = "unknown", deserialize_with = "null_as_unknown")]
    pub kind: String,
    /// `[lat, lon]` pairs
    #[serde(default, deserialize_with = "null_as_empty")]
    pub coords: Vec<[f64; 2]>,
}

/// Everything scraped for one resort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub pistes: Vec<RawPiste>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub remontees: Vec<RawLift>,
}

/// Swap `[lat, lon]` into a `(lon, lat)` polyline
fn swapped_line(coords: &[[f64; 2]]) -> LineString<f64> {
    LineString::new(
        coords
            .iter()
            .map(|&[lat, lon]| Coord { x: lon, y: lat })
            .collect(),
    )
}

impl StationPayload {
    pub fn new(station: &str) -> Self {
        Self {
            station: Some(station.to_string()),
            pistes: Vec::new(),
            remontees: Vec::new(),
        }
    }

    pub fn station_name(&self) -> &str {
        self.station.as_deref().unwrap_or("Unknown Station")
    }

    /// Build slopes with swapped coordinates and empty connection lists
    pub fn slopes(&self) -> Vec<Slope> {
        self.pistes
            .iter()
            .map(|p| Slope::new(&p.name, &p.difficulty, swapped_line(&p.coords)))
            .collect()
    }

    /// Build lifts with swapped coordinates, dropping magic carpets and
    /// untyped entries
    pub fn lifts(&self) -> Vec<Lift> {
        self.remontees
            .iter()
            .filter(|l| !IGNORED_LIFT_TYPES.contains(&l.kind.as_str()))
            .map(|l| Lift::new(&l.name, &l.kind, swapped_line(&l.coords)))
            .collect()
    }
}

/// One resort after connectivity inference, as forwarded downstream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedStation {
    pub station: String,
    pub slopes: Vec<Slope>,
    pub chair_lifts: Vec<Lift>,
}
