use crate::models::Coordinate;

/// Default proximity tolerance, in degrees
pub const DEFAULT_TOLERANCE: f64 = 0.0006;

/// Manhattan distance in raw coordinate units. Not geodesic: a degree of
/// longitude is treated the same at every latitude.
pub fn manhattan_distance(a: Coordinate, b: Coordinate) -> f64 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Endpoint proximity test with a fixed tolerance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proximity {
    tolerance: f64,
}

impl Proximity {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Strictly closer than the tolerance
    pub fn near(&self, a: Coordinate, b: Coordinate) -> bool {
        manhattan_distance(a, b) < self.tolerance
    }
}

impl Default for Proximity {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::Coord;

    #[test]
    fn test_manhattan_sums_axes() {
        let a = Coord { x: 45.0, y: 6.0 };
        let b = Coord { x: 45.0003, y: 5.9998 };
        assert!((manhattan_distance(a, b) - 0.0005).abs() < 1e-12);
    }

    #[test]
    fn test_near_is_strict() {
        let proximity = Proximity::new(1.0);
        let a = Coord { x: 0.0, y: 0.0 };
        assert!(proximity.near(a, Coord { x: 0.5, y: 0.25 }));
        assert!(!proximity.near(a, Coord { x: 0.5, y: 0.5 }));
    }

    #[test]
    fn test_not_euclidean() {
        // Euclidean distance ~0.00049 would pass, Manhattan 0.00068 does not
        let proximity = Proximity::default();
        let a = Coord { x: 46.0, y: 7.0 };
        let b = Coord { x: 46.00034, y: 7.00034 };
        assert!(!proximity.near(a, b));
    }
}
