//! The four-pass connectivity sweep.

use tracing::{debug, info};

use super::proximity::{Proximity, DEFAULT_TOLERANCE};
use crate::models::{Connection, Feature, Lift, Slope};

/// Connections added by each pass of a sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectivityReport {
    pub slope_to_slope: usize,
    pub slope_to_lift: usize,
    pub lift_to_lift: usize,
    pub lift_to_slope: usize,
}

impl ConnectivityReport {
    pub fn total(&self) -> usize {
        self.slope_to_slope + self.slope_to_lift + self.lift_to_lift + self.lift_to_slope
    }
}

/// Infer connections between `slopes` and `lifts` in place.
///
/// Passes run in a fixed order and each one only writes to its target side:
///
/// 1. slope -> slope: an endpoint of slope `i` near any point of slope `j`
///    is recorded on `j`, at the first matching point of `j`.
/// 2. slope -> lift: a slope ending at a lift's base, or starting at its top,
///    is recorded on the lift. The end/base match wins when both hold.
/// 3. lift -> lift: a lift top near another lift's base is recorded on the
///    second lift.
/// 4. lift -> slope: a lift top near a slope start is recorded on the slope.
///
/// A feature never holds two connections with the same name; the first one
/// written is kept. Features with empty polylines are skipped entirely.
pub fn find_connections(
    slopes: &mut [Slope],
    lifts: &mut [Lift],
    tolerance: f64,
) -> ConnectivityReport {
    info!(
        "Finding connections - slopes: {}, lifts: {}, tolerance: {}",
        slopes.len(),
        lifts.len(),
        tolerance
    );

    let proximity = Proximity::new(tolerance);
    let report = ConnectivityReport {
        slope_to_slope: link_slopes(slopes, &proximity),
        slope_to_lift: link_slopes_to_lifts(slopes, lifts, &proximity),
        lift_to_lift: link_lifts(lifts, &proximity),
        lift_to_slope: link_lifts_to_slopes(lifts, slopes, &proximity),
    };

    debug!(
        "Connections added - slope/slope: {}, slope/lift: {}, lift/lift: {}, lift/slope: {}",
        report.slope_to_slope, report.slope_to_lift, report.lift_to_lift, report.lift_to_slope
    );

    report
}

/// [`find_connections`] with [`DEFAULT_TOLERANCE`]
pub fn find_connections_default(slopes: &mut [Slope], lifts: &mut [Lift]) -> ConnectivityReport {
    find_connections(slopes, lifts, DEFAULT_TOLERANCE)
}

fn link_slopes(slopes: &mut [Slope], proximity: &Proximity) -> usize {
    let mut added = 0;

    for i in 0..slopes.len() {
        let (Some(start), Some(end)) = (slopes[i].start(), slopes[i].end()) else {
            continue;
        };
        let name = slopes[i].name().to_string();

        for (j, target) in slopes.iter_mut().enumerate() {
            if i == j {
                continue;
            }

            // Only the first matching point of the target counts
            let hit = target
                .coordinates
                .coords()
                .copied()
                .find(|&c| proximity.near(start, c) || proximity.near(end, c));

            if let Some(at) = hit {
                if target.connect(Connection::slope(&name, at)) {
                    added += 1;
                }
            }
        }
    }

    added
}

fn link_slopes_to_lifts(slopes: &[Slope], lifts: &mut [Lift], proximity: &Proximity) -> usize {
    let mut added = 0;

    for slope in slopes {
        let (Some(start), Some(end)) = (slope.start(), slope.end()) else {
            continue;
        };

        for lift in lifts.iter_mut() {
            let (Some(base), Some(top)) = (lift.base(), lift.top()) else {
                continue;
            };

            let at = if proximity.near(end, base) {
                end
            } else if proximity.near(start, top) {
                start
            } else {
                continue;
            };

            if lift.connect(Connection::slope(slope.name(), at)) {
                added += 1;
            }
        }
    }

    added
}

fn link_lifts(lifts: &mut [Lift], proximity: &Proximity) -> usize {
    let mut added = 0;

    for i in 0..lifts.len() {
        let Some(top) = lifts[i].top() else {
            continue;
        };
        let name = lifts[i].name().to_string();

        for (j, target) in lifts.iter_mut().enumerate() {
            if i == j {
                continue;
            }
            let Some(base) = target.base() else {
                continue;
            };

            if proximity.near(top, base) && target.connect(Connection::chair_lift(&name, top)) {
                added += 1;
            }
        }
    }

    added
}

fn link_lifts_to_slopes(lifts: &[Lift], slopes: &mut [Slope], proximity: &Proximity) -> usize {
    let mut added = 0;

    for lift in lifts {
        let Some(top) = lift.top() else {
            continue;
        };

        for slope in slopes.iter_mut() {
            let Some(start) = slope.start() else {
                continue;
            };

            if proximity.near(top, start)
                && slope.connect(Connection::chair_lift(lift.name(), top))
            {
                added += 1;
            }
        }
    }

    added
}
