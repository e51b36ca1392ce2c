//! Turns raw Overpass elements into per-resort pistes and lifts.

use hashbrown::{HashMap, HashSet};
use tracing::debug;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use super::dto::{Element, OverpassResponse};
use crate::models::{RawLift, RawPiste, StationPayload};

/// OSM `piste:difficulty` to the labels the downstream app displays
const DIFFICULTY_LABELS: &[(&str, &str)] = &[
    ("novice", "Vert"),
    ("easy", "Bleu"),
    ("intermediate", "Rouge"),
    ("advanced", "Noir"),
];

const PLACEHOLDER_NAMES: &[&str] = &["", "none", "null", "unknown", "(nom inconnu)"];

/// `aerialway=*` values that are not lifts people ride
const IGNORED_AERIALWAYS: &[&str] = &["pylon", "goods"];

/// Map an OSM difficulty to its colour label. Unknown values read as green.
pub fn difficulty_label(raw: &str) -> &'static str {
    let raw = raw.to_lowercase();
    DIFFICULTY_LABELS
        .iter()
        .find(|(osm, _)| *osm == raw)
        .map(|(_, label)| *label)
        .unwrap_or("Vert")
}

/// Case- and accent-insensitive key for grouping piste segments
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

fn is_placeholder(name: &str) -> bool {
    PLACEHOLDER_NAMES.contains(&name.to_lowercase().as_str())
}

/// Index node coordinates as `[lat, lon]`
fn node_index(elements: &[Element]) -> HashMap<i64, [f64; 2]> {
    let mut index = HashMap::new();
    for el in elements {
        if let Element::Node { id, lat, lon, .. } = el {
            index.entry(*id).or_insert([*lat, *lon]);
        }
    }
    index
}

/// Resolve an element's geometry, dropping repeated coordinates
fn extract_coords(el: &Element, nodes: &HashMap<i64, [f64; 2]>) -> Vec<[f64; 2]> {
    let mut coords = Vec::new();
    let mut seen = HashSet::new();

    let resolved: Vec<[f64; 2]> = match el {
        Element::Node { lat, lon, .. } => vec![[*lat, *lon]],
        _ => el
            .node_refs()
            .iter()
            .filter_map(|id| nodes.get(id).copied())
            .collect(),
    };

    for coord in resolved {
        if seen.insert((coord[0].to_bits(), coord[1].to_bits())) {
            coords.push(coord);
        }
    }

    coords
}

/// Build the resort payload from an Overpass answer.
///
/// Returns `None` when the answer carries no element list at all. Pistes
/// sharing a normalized name are merged into one, keeping the first
/// spelling and difficulty seen.
pub fn extract_station(station: &str, response: &OverpassResponse) -> Option<StationPayload> {
    let elements = response.elements.as_ref()?;
    let nodes = node_index(elements);

    let mut payload = StationPayload::new(station);
    let mut piste_slots: HashMap<String, usize> = HashMap::new();

    for el in elements {
        if !el.is_way_or_relation() {
            continue;
        }
        let Some(tags) = el.tags() else {
            continue;
        };

        let name = tags.get("name").map(|n| n.trim()).unwrap_or("");
        if is_placeholder(name) {
            continue;
        }

        let coords = extract_coords(el, &nodes);
        if coords.is_empty() {
            debug!("Skipping {:?} '{}': no resolvable nodes", el.id(), name);
            continue;
        }

        if tags.contains_key("piste:type") {
            let raw_difficulty = tags
                .get("piste:difficulty")
                .map(String::as_str)
                .unwrap_or("easy");
            let key = normalize_name(name);

            match piste_slots.get(&key) {
                Some(&slot) => {
                    let existing = &mut payload.pistes[slot].coords;
                    for c in coords {
                        if !existing.contains(&c) {
                            existing.push(c);
                        }
                    }
                }
                None => {
                    piste_slots.insert(key, payload.pistes.len());
                    payload.pistes.push(RawPiste {
                        name: name.to_string(),
                        difficulty: difficulty_label(raw_difficulty).to_string(),
                        coords,
                    });
                }
            }
        } else if let Some(aerialway) = tags.get("aerialway") {
            if IGNORED_AERIALWAYS.contains(&aerialway.as_str()) {
                continue;
            }
            payload.remontees.push(RawLift {
                name: name.to_string(),
                kind: aerialway.clone(),
                coords,
            });
        }
    }

    debug!(
        "{}: {} pistes, {} lifts",
        station,
        payload.pistes.len(),
        payload.remontees.len()
    );

    Some(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(value: serde_json::Value) -> OverpassResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_difficulty_labels() {
        assert_eq!(difficulty_label("novice"), "Vert");
        assert_eq!(difficulty_label("Intermediate"), "Rouge");
        assert_eq!(difficulty_label("advanced"), "Noir");
        assert_eq!(difficulty_label("freeride"), "Vert");
    }

    #[test]
    fn test_normalize_name_strips_accents() {
        assert_eq!(normalize_name("  Crête du Lac "), "crete du lac");
        assert_eq!(normalize_name("SAMOËNS"), "samoens");
    }

    #[test]
    fn test_no_elements_is_none() {
        let r = response(serde_json::json!({ "remark": "runtime error" }));
        assert!(extract_station("Vars", &r).is_none());
    }

    #[test]
    fn test_extract_pistes_and_lifts() {
        let r = response(serde_json::json!({
            "elements": [
                { "type": "way", "id": 100, "nodes": [1, 2, 2, 3],
                  "tags": { "name": "Chamois", "piste:type": "downhill", "piste:difficulty": "advanced" } },
                { "type": "way", "id": 101, "nodes": [3, 4],
                  "tags": { "name": "TSD Peyrol", "aerialway": "chair_lift" } },
                { "type": "way", "id": 102, "nodes": [1, 4],
                  "tags": { "name": "Pylône", "aerialway": "pylon" } },
                { "type": "way", "id": 103, "nodes": [1, 4],
                  "tags": { "name": "unknown", "piste:type": "downhill" } },
                { "type": "way", "id": 104, "nodes": [99],
                  "tags": { "name": "Ghost", "piste:type": "downhill" } },
                { "type": "node", "id": 1, "lat": 44.50, "lon": 6.70 },
                { "type": "node", "id": 2, "lat": 44.51, "lon": 6.71 },
                { "type": "node", "id": 3, "lat": 44.52, "lon": 6.72 },
                { "type": "node", "id": 4, "lat": 44.53, "lon": 6.73 }
            ]
        }));

        let payload = extract_station("Vars", &r).unwrap();
        assert_eq!(payload.station.as_deref(), Some("Vars"));
        assert_eq!(payload.pistes.len(), 1);
        assert_eq!(payload.pistes[0].name, "Chamois");
        assert_eq!(payload.pistes[0].difficulty, "Noir");
        assert_eq!(
            payload.pistes[0].coords,
            vec![[44.50, 6.70], [44.51, 6.71], [44.52, 6.72]]
        );
        assert_eq!(payload.remontees.len(), 1);
        assert_eq!(payload.remontees[0].kind, "chair_lift");
        assert_eq!(payload.remontees[0].coords, vec![[44.52, 6.72], [44.53, 6.73]]);
    }

    #[test]
    fn test_same_named_pistes_merge() {
        let r = response(serde_json::json!({
            "elements": [
                { "type": "way", "id": 1, "nodes": [1, 2],
                  "tags": { "name": "Crête", "piste:type": "downhill", "piste:difficulty": "easy" } },
                { "type": "way", "id": 2, "nodes": [2, 3],
                  "tags": { "name": "crete ", "piste:type": "downhill", "piste:difficulty": "advanced" } },
                { "type": "node", "id": 1, "lat": 1.0, "lon": 1.0 },
                { "type": "node", "id": 2, "lat": 2.0, "lon": 2.0 },
                { "type": "node", "id": 3, "lat": 3.0, "lon": 3.0 }
            ]
        }));

        let payload = extract_station("Flaine", &r).unwrap();
        assert_eq!(payload.pistes.len(), 1);
        assert_eq!(payload.pistes[0].name, "Crête");
        assert_eq!(payload.pistes[0].difficulty, "Bleu");
        assert_eq!(payload.pistes[0].coords, vec![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0]]);
    }

    #[test]
    fn test_relation_uses_node_members() {
        let r = response(serde_json::json!({
            "elements": [
                { "type": "relation", "id": 7, "members": [
                    { "type": "way", "ref": 55, "role": "" },
                    { "type": "node", "ref": 2, "role": "" },
                    { "type": "node", "ref": 1, "role": "" }
                  ],
                  "tags": { "name": "Télécabine", "aerialway": "gondola" } },
                { "type": "node", "id": 1, "lat": 1.0, "lon": 1.5 },
                { "type": "node", "id": 2, "lat": 2.0, "lon": 2.5 }
            ]
        }));

        let payload = extract_station("Tignes", &r).unwrap();
        assert_eq!(payload.remontees[0].coords, vec![[2.0, 2.5], [1.0, 1.5]]);
    }
}
