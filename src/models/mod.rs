//! Core data models for the ski-area pipeline.

pub mod coords;
pub mod feature;
pub mod payload;

pub use feature::{Connection, Coordinate, Feature, FeatureKind, Lift, Slope};
pub use payload::{ProcessedStation, RawLift, RawPiste, StationPayload};
