//! # Waypoint heading estimation
//!
//! The stored orientation of a waypoint is not always trustworthy, so the heading the vehicle
//! should have at a waypoint is estimated from the path geometry instead. At interior waypoints
//! the headings of the segments either side are blended, which gives a smooth estimate through
//! turns.
//!
//! When the vehicle reverses along a segment it faces away from the direction the segment points
//! in. A segment leading into a waypoint with a negative target speed therefore has its bearing
//! rotated by pi before it is used.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::f64::consts::PI;

// Internal
use crate::path::{Path, Waypoint};
use util::maths::normalise_angle;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Estimate the vehicle heading at the waypoint with the given index, in the range (-pi, pi].
///
/// - Interior waypoints use the bisector of the incoming and outgoing segment headings. If the
///   two headings are opposed (a reversal of pi or more) the bisector would point sideways, so
///   the outgoing heading is used instead.
/// - The first and last waypoints use the single segment they belong to.
/// - A path with only one waypoint uses that waypoint's stored orientation.
///
/// Returns `None` if the index is outside the path.
pub fn waypoint_yaw(path: &Path, index: usize) -> Option<f64> {
    let current = path.waypoint(index)?;

    let incoming_rad = index
        .checked_sub(1)
        .and_then(|i| path.waypoint(i))
        .map(|behind| segment_heading(behind, current));
    let outgoing_rad = path
        .waypoint(index + 1)
        .map(|front| segment_heading(current, front));

    let yaw_rad = match (incoming_rad, outgoing_rad) {
        (Some(incoming_rad), Some(outgoing_rad)) => {
            let diff_rad = normalise_angle(outgoing_rad - incoming_rad);

            if diff_rad.abs() < PI {
                normalise_angle(incoming_rad + diff_rad / 2.0)
            } else {
                outgoing_rad
            }
        }
        (Some(incoming_rad), None) => incoming_rad,
        (None, Some(outgoing_rad)) => outgoing_rad,
        (None, None) => current.pose.yaw(),
    };

    Some(yaw_rad)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Heading of the vehicle while driving the segment `from` -> `to`.
fn segment_heading(from: &Waypoint, to: &Waypoint) -> f64 {
    let dx = to.position()[0] - from.position()[0];
    let dy = to.position()[1] - from.position()[1];
    let bearing_rad = dy.atan2(dx);

    if to.speed_ms < 0.0 {
        normalise_angle(bearing_rad + PI)
    } else {
        bearing_rad
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    const EPS: f64 = 1e-9;

    fn path_from(points: &[(f64, f64, f64)]) -> Path {
        Path::new(
            points
                .iter()
                .map(|&(x, y, v)| Waypoint::from_xy_yaw(x, y, 0.0, v))
                .collect(),
        )
    }

    fn assert_angle_eq(a: f64, b: f64) {
        assert!(
            normalise_angle(a - b).abs() < EPS,
            "angle {} != {}",
            a,
            b
        );
    }

    #[test]
    fn test_left_turn_bisector() {
        // Heading east, then turning 90 degrees left to head north
        let path = path_from(&[(0.0, 0.0, 1.0), (1.0, 0.0, 1.0), (1.0, 1.0, 1.0)]);

        assert_angle_eq(waypoint_yaw(&path, 1).unwrap(), 0.0 + FRAC_PI_4);
    }

    #[test]
    fn test_right_turn_bisector() {
        let path = path_from(&[(0.0, 0.0, 1.0), (1.0, 0.0, 1.0), (1.0, -1.0, 1.0)]);

        assert_angle_eq(waypoint_yaw(&path, 1).unwrap(), -FRAC_PI_4);
    }

    #[test]
    fn test_boundaries() {
        let path = path_from(&[(0.0, 0.0, 1.0), (1.0, 0.0, 1.0), (1.0, 1.0, 1.0)]);

        // First waypoint uses the outgoing segment, last uses the incoming one
        assert_angle_eq(waypoint_yaw(&path, 0).unwrap(), 0.0);
        assert_angle_eq(waypoint_yaw(&path, 2).unwrap(), FRAC_PI_2);

        assert_eq!(waypoint_yaw(&path, 3), None);
    }

    #[test]
    fn test_single_waypoint_uses_orientation() {
        let path = Path::new(vec![Waypoint::from_xy_yaw(3.0, 4.0, 1.2, 1.0)]);

        assert_angle_eq(waypoint_yaw(&path, 0).unwrap(), 1.2);
        assert_eq!(waypoint_yaw(&Path::new_empty(), 0), None);
    }

    #[test]
    fn test_reversal_uses_outgoing() {
        // Path doubles back on itself with positive speeds, the bisector would point sideways
        let path = path_from(&[(0.0, 0.0, 1.0), (1.0, 0.0, 1.0), (0.0, 0.0, 1.0)]);

        assert_angle_eq(waypoint_yaw(&path, 1).unwrap(), PI);
    }

    #[test]
    fn test_negative_speed_flips_heading() {
        // Reversing along +X, so the vehicle faces -X
        let path = path_from(&[(0.0, 0.0, -1.0), (1.0, 0.0, -1.0), (2.0, 0.0, -1.0)]);

        for i in 0..3 {
            assert_angle_eq(waypoint_yaw(&path, i).unwrap(), PI);
        }
    }

    #[test]
    fn test_speed_sign_applies_at_segment_end() {
        // Straight line where the speed changes sign between waypoints 1 and 2. The flip follows
        // the speed at the end of each segment, so waypoint 1 already takes the reversed heading
        // of its outgoing segment even though its own speed is positive.
        let path = path_from(&[
            (0.0, 0.0, 2.0),
            (1.0, 0.0, 2.0),
            (2.0, 0.0, -2.0),
            (3.0, 0.0, -2.0),
        ]);

        assert_angle_eq(waypoint_yaw(&path, 0).unwrap(), 0.0);
        assert_angle_eq(waypoint_yaw(&path, 1).unwrap(), PI);
        assert_angle_eq(waypoint_yaw(&path, 2).unwrap(), PI);
        assert_angle_eq(waypoint_yaw(&path, 3).unwrap(), PI);
    }

    #[test]
    fn test_switchback_keeps_vehicle_heading() {
        // Drive forward to x = 2, then reverse back towards the start. The vehicle keeps facing
        // +X the whole time.
        let path = path_from(&[
            (0.0, 0.0, 1.0),
            (1.0, 0.0, 1.0),
            (2.0, 0.0, 1.0),
            (1.0, 0.0, -1.0),
            (0.0, 0.0, -1.0),
        ]);

        for i in 0..5 {
            assert_angle_eq(waypoint_yaw(&path, i).unwrap(), 0.0);
        }
    }
}
