//! Slopes, lifts and the connections inferred between them.

use geo_types::{Coord, LineString};
use serde::{Deserialize, Serialize};

use super::coords;

/// A coordinate pair in degrees. The axis order is whatever the caller
/// chose; comparisons only need both sides to agree.
pub type Coordinate = Coord<f64>;

/// Kind of the feature a connection points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Slope,
    ChairLift,
}

/// Directed adjacency recorded on the feature that owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Name of the feature found nearby
    pub name: String,
    /// Where proximity was detected
    #[serde(with = "coords::point")]
    pub coordinates: Coordinate,
    #[serde(rename = "type")]
    pub kind: FeatureKind,
}

impl Connection {
    pub fn slope(name: &str, at: Coordinate) -> Self {
        Self {
            name: name.to_string(),
            coordinates: at,
            kind: FeatureKind::Slope,
        }
    }

    pub fn chair_lift(name: &str, at: Coordinate) -> Self {
        Self {
            name: name.to_string(),
            coordinates: at,
            kind: FeatureKind::ChairLift,
        }
    }
}

/// A ski run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slope {
    pub name: String,
    pub difficulty: String,
    #[serde(with = "coords::line")]
    pub coordinates: LineString<f64>,
    #[serde(rename = "connection", default)]
    pub connections: Vec<Connection>,
}

impl Slope {
    pub fn new(name: &str, difficulty: &str, coordinates: LineString<f64>) -> Self {
        Self {
            name: name.to_string(),
            difficulty: difficulty.to_string(),
            coordinates,
            connections: Vec::new(),
        }
    }
}

/// A mechanical lift, oriented from its base (first coordinate) to its top
/// (last coordinate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lift {
    #[serde(rename = "station")]
    pub name: String,
    /// Aerialway type (chair_lift, gondola, drag_lift, ...)
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(with = "coords::line")]
    pub coordinates: LineString<f64>,
    #[serde(rename = "connection", default)]
    pub connections: Vec<Connection>,
}

impl Lift {
    pub fn new(name: &str, kind: &str, coordinates: LineString<f64>) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            coordinates,
            connections: Vec::new(),
        }
    }

    pub fn base(&self) -> Option<Coordinate> {
        self.start()
    }

    pub fn top(&self) -> Option<Coordinate> {
        self.end()
    }
}

/// Anything the connectivity engine can annotate.
pub trait Feature {
    fn name(&self) -> &str;

    fn polyline(&self) -> &LineString<f64>;

    fn connections(&self) -> &[Connection];

    fn connections_mut(&mut self) -> &mut Vec<Connection>;

    fn start(&self) -> Option<Coordinate> {
        self.polyline().0.first().copied()
    }

    fn end(&self) -> Option<Coordinate> {
        self.polyline().0.last().copied()
    }

    fn is_connected_to(&self, name: &str) -> bool {
        self.connections().iter().any(|c| c.name == name)
    }

    /// Append a connection unless one with the same name is already there.
    /// Returns whether it was added.
    fn connect(&mut self, connection: Connection) -> bool {
        if self.is_connected_to(&connection.name) {
            return false;
        }
        self.connections_mut().push(connection);
        true
    }
}

impl Feature for Slope {
    fn name(&self) -> &str {
        &self.name
    }

    fn polyline(&self) -> &LineString<f64> {
        &self.coordinates
    }

    fn connections(&self) -> &[Connection] {
        &self.connections
    }

    fn connections_mut(&mut self) -> &mut Vec<Connection> {
        &mut self.connections
    }
}

impl Feature for Lift {
    fn name(&self) -> &str {
        &self.name
    }

    fn polyline(&self) -> &LineString<f64> {
        &self.coordinates
    }

    fn connections(&self) -> &[Connection] {
        &self.connections
    }

    fn connections_mut(&mut self) -> &mut Vec<Connection> {
        &mut self.connections
    }
}
