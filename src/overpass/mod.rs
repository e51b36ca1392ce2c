//! OpenStreetMap ski-area scraping through the Overpass API.

mod client;
mod dto;
mod extract;

pub use client::{OverpassClient, DEFAULT_ENDPOINTS};
pub use dto::{Element, Member, OverpassResponse};
pub use extract::{difficulty_label, extract_station, normalize_name};
