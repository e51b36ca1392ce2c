//! skigraph - ski-area scraping and slope/lift connectivity inference
//!
//! This library provides shared types and modules for the fetch and process binaries.

pub mod connectivity;
pub mod error;
pub mod firebase;
pub mod forward;
pub mod models;
pub mod overpass;
pub mod request;
pub mod server;

pub use connectivity::{find_connections, find_connections_default, DEFAULT_TOLERANCE};
pub use error::PipelineError;
pub use models::{Connection, Feature, FeatureKind, Lift, Slope};
