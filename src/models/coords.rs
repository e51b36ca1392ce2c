//! Serde adapters writing coordinates as bare `[a, b]` JSON arrays.
//!
//! `geo-types` serializes coordinates as `{"x": .., "y": ..}` objects, which is not what
//! the downstream consumers read.

use geo_types::{Coord, LineString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single coordinate as `[x, y]`
pub mod point {
    use super::*;

    pub fn serialize<S: Serializer>(coord: &Coord<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        [coord.x, coord.y].serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Coord<f64>, D::Error> {
        let [x, y] = <[f64; 2]>::deserialize(deserializer)?;
        Ok(Coord { x, y })
    }
}

/// A polyline as `[[x, y], ...]`
pub mod line {
    use super::*;

    pub fn serialize<S: Serializer>(
        line: &LineString<f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let pairs: Vec<[f64; 2]> = line.coords().map(|c| [c.x, c.y]).collect();
        pairs.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<LineString<f64>, D::Error> {
        let pairs = Vec::<[f64; 2]>::deserialize(deserializer)?;
        Ok(LineString::new(
            pairs.into_iter().map(|[x, y]| Coord { x, y }).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "point")]
        at: Coord<f64>,
        #[serde(with = "line")]
        path: LineString<f64>,
    }

    #[test]
    fn test_array_shape() {
        let w = Wrapper {
            at: Coord { x: 6.0, y: 45.0 },
            path: LineString::new(vec![Coord { x: 1.0, y: 2.0 }, Coord { x: 3.0, y: 4.0 }]),
        };
        let value = serde_json::to_value(&w).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "at": [6.0, 45.0], "path": [[1.0, 2.0], [3.0, 4.0]] })
        );
    }

    #[test]
    fn test_empty_line() {
        let w: Wrapper = serde_json::from_str(r#"{"at": [0.5, 1.5], "path": []}"#).unwrap();
        assert_eq!(w.at, Coord { x: 0.5, y: 1.5 });
        assert!(w.path.0.is_empty());
    }
}
