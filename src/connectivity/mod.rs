//! Connectivity inference between slopes and lifts.
//!
//! Two features are connected when an endpoint of one lies within a
//! Manhattan tolerance (raw degrees) of a point of the other. Every
//! connection is written to one side only: the feature that "receives"
//! the skier.

mod engine;
mod proximity;

pub use engine::{find_connections, find_connections_default, ConnectivityReport};
pub use proximity::{manhattan_distance, Proximity, DEFAULT_TOLERANCE};
