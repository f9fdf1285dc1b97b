//! # Cold start location
//!
//! Finds the vehicle's waypoint index when there is no previously resolved index to start from.
//!
//! The search is done in two passes. The first only accepts waypoints which are both near the
//! vehicle and face roughly the same way, so that a spatially close waypoint on an overlapping or
//! parallel part of the path isn't picked while the vehicle is driving the other way. If nothing
//! passes these gates the second pass takes the nearest waypoint regardless of heading.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};

// Internal
use super::{heading::waypoint_yaw, TrackError, TrackParams};
use crate::path::Path;
use util::{
    geom::{dist_squared_2d, plane_distance, Pose},
    maths::{ang_dist, normalise_angle},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tracks the index of the smallest value seen so far.
///
/// Ties keep the earliest index.
#[derive(Debug, Default, Clone, Copy)]
struct MinSearch {
    best: Option<(usize, f64)>,
}

impl MinSearch {
    fn update(&mut self, index: usize, value: f64) {
        match self.best {
            Some((_, min)) if value >= min => (),
            _ if value.is_nan() => (),
            _ => self.best = Some((index, value)),
        }
    }

    fn result(&self) -> Option<usize> {
        self.best.map(|(i, _)| i)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Find the index of the waypoint which best represents the vehicle's position, with no prior
/// knowledge of where it was.
///
/// The nearest waypoint closer than `closest_valid_distance_m` whose estimated heading is within
/// `closest_valid_angle_rad` of the vehicle's is chosen. If there is none the nearest waypoint is
/// chosen instead, so a result is always given for a valid path.
pub fn closest_index(path: &Path, pose: &Pose, params: &TrackParams) -> Result<usize, TrackError> {
    if path.len() < 2 {
        warn!(
            "Cannot locate vehicle on path, too few waypoints (size = {})",
            path.len()
        );
        return Err(TrackError::InsufficientPath(path.len()));
    }

    if !pose_is_finite(pose) {
        warn!("Cannot locate vehicle on path, pose is not finite: {:?}", pose);
        return Err(TrackError::NonFinitePosition(planar_position(pose)));
    }

    let robot_yaw_rad = pose.yaw();

    // ---- GATED SEARCH ----

    let mut gated = MinSearch::default();

    for (i, waypoint) in path.waypoints.iter().enumerate() {
        let distance_m = plane_distance(waypoint.position(), &pose.position_m);
        let waypoint_yaw_rad = waypoint_yaw(path, i).unwrap_or_else(|| waypoint.pose.yaw());
        let angle_diff_rad = ang_dist(robot_yaw_rad, waypoint_yaw_rad);

        if distance_m < params.closest_valid_distance_m
            && angle_diff_rad.abs() < params.closest_valid_angle_rad
        {
            gated.update(i, distance_m);
        } else if gated.result().is_none() {
            trace!(
                "Waypoint {} outside gate (distance: {:.3} m, waypoint yaw: {:.3} rad, robot yaw: \
                 {:.3} rad)",
                i,
                distance_m,
                waypoint_yaw_rad,
                robot_yaw_rad
            );
        }
    }

    if let Some(index) = gated.result() {
        return Ok(index);
    }

    // ---- NEAREST FALLBACK ----

    debug!("No waypoint passed the distance/heading gate, falling back to the nearest waypoint");

    let mut nearest = MinSearch::default();
    for (i, waypoint) in path.waypoints.iter().enumerate() {
        nearest.update(i, plane_distance(waypoint.position(), &pose.position_m));
    }

    // Only empty if every waypoint position was non-finite
    nearest
        .result()
        .ok_or_else(|| TrackError::NonFinitePosition(planar_position(pose)))
}

/// True if every component of the pose's position and attitude is finite.
pub(crate) fn pose_is_finite(pose: &Pose) -> bool {
    pose.position_m.iter().all(|v| v.is_finite())
        && pose.attitude_q.coords.iter().all(|v| v.is_finite())
}

/// Planar position of the pose, as reported in tracking errors.
pub(crate) fn planar_position(pose: &Pose) -> [f64; 2] {
    [pose.position_m[0], pose.position_m[1]]
}

/// Find the pose nearest to `pose` which is within `dist_thr_m` of it and whose own orientation
/// is within `angle_thr_rad` of the pose's heading. Both thresholds are inclusive.
///
/// Unlike [`closest_index`] the stored orientations are used directly rather than estimated
/// from the path geometry. Returns `None` if no pose passes both thresholds.
pub fn closest_index_with_dist_ang_thr(
    poses: &[Pose],
    pose: &Pose,
    dist_thr_m: f64,
    angle_thr_rad: f64,
) -> Option<usize> {
    let pose_yaw_rad = pose.yaw();
    let mut nearest = MinSearch::default();

    for (i, candidate) in poses.iter().enumerate() {
        let dist_sq = dist_squared_2d(&candidate.position_m, &pose.position_m);
        if dist_sq > dist_thr_m * dist_thr_m {
            continue;
        }

        let yaw_diff_rad = normalise_angle(pose_yaw_rad - candidate.yaw());
        if yaw_diff_rad.abs() > angle_thr_rad {
            continue;
        }

        nearest.update(i, dist_sq);
    }

    nearest.result()
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::path::Waypoint;
    use std::f64::consts::PI;

    fn straight_path(len: usize) -> Path {
        Path::new(
            (0..len)
                .map(|i| Waypoint::from_xy_yaw(i as f64, 0.0, 0.0, 2.0))
                .collect(),
        )
    }

    /// Out along y = 0 heading +X, then back along y = 1 heading -X.
    fn out_and_back_path() -> Path {
        let out = (0..10).map(|i| Waypoint::from_xy_yaw(i as f64, 0.0, 0.0, 2.0));
        let back = (0..10).map(|i| Waypoint::from_xy_yaw(9.0 - i as f64, 1.0, PI, 2.0));

        Path::new(out.chain(back).collect())
    }

    #[test]
    fn test_min_search() {
        let mut search = MinSearch::default();
        assert_eq!(search.result(), None);

        search.update(0, 3.0);
        search.update(1, 1.0);
        search.update(2, 1.0);
        search.update(3, f64::NAN);
        search.update(4, 2.0);
        assert_eq!(search.result(), Some(1));
    }

    #[test]
    fn test_insufficient_path() {
        let params = TrackParams::default();
        let pose = Pose::default();

        assert_eq!(
            closest_index(&Path::new_empty(), &pose, &params),
            Err(TrackError::InsufficientPath(0))
        );
        assert_eq!(
            closest_index(&straight_path(1), &pose, &params),
            Err(TrackError::InsufficientPath(1))
        );
        assert_eq!(closest_index(&straight_path(2), &pose, &params), Ok(0));
    }

    #[test]
    fn test_non_finite_position() {
        let params = TrackParams::default();
        let path = straight_path(5);

        // A NaN pose has no meaningful distance to any waypoint
        let pose = Pose::from_xy_yaw(f64::NAN, 0.0, 0.0);
        match closest_index(&path, &pose, &params) {
            Err(TrackError::NonFinitePosition(p)) => assert!(p[0].is_nan()),
            r => panic!("Expected a non-finite position error, got {:?}", r),
        }

        let pose = Pose::from_xy_yaw(1.0, f64::INFINITY, 0.0);
        assert!(matches!(
            closest_index(&path, &pose, &params),
            Err(TrackError::NonFinitePosition(_))
        ));

        // Every waypoint is unusable, so even the nearest fallback finds nothing
        let path = Path::new(
            (0..3)
                .map(|_| Waypoint::from_xy_yaw(f64::NAN, f64::NAN, 0.0, 2.0))
                .collect(),
        );
        let pose = Pose::from_xy_yaw(1.0, 2.0, 0.0);
        assert_eq!(
            closest_index(&path, &pose, &params),
            Err(TrackError::NonFinitePosition([1.0, 2.0]))
        );
    }

    #[test]
    fn test_gated_search() {
        let params = TrackParams::default();
        let path = straight_path(10);

        assert_eq!(
            closest_index(&path, &Pose::from_xy_yaw(4.2, 0.3, 0.1), &params),
            Ok(4)
        );
        assert_eq!(
            closest_index(&path, &Pose::from_xy_yaw(6.6, -0.3, -0.4), &params),
            Ok(7)
        );
    }

    #[test]
    fn test_heading_gate_rejects_opposite_lane() {
        let params = TrackParams::default();
        let path = out_and_back_path();

        // Closest waypoint is (5, 1) on the return leg, but the vehicle faces the outbound way
        let pose = Pose::from_xy_yaw(5.0, 0.9, 0.0);
        assert_eq!(closest_index(&path, &pose, &params), Ok(5));

        // Facing the other way the return leg is accepted
        let pose = Pose::from_xy_yaw(5.0, 0.9, PI);
        assert_eq!(closest_index(&path, &pose, &params), Ok(14));
    }

    #[test]
    fn test_fallback_to_nearest() {
        let params = TrackParams::default();
        let path = straight_path(5);

        // Far outside the distance gate of every waypoint
        let pose = Pose::from_xy_yaw(100.0, 0.0, 0.0);
        assert_eq!(closest_index(&path, &pose, &params), Ok(4));

        // Close by, but facing against the path
        let pose = Pose::from_xy_yaw(2.2, 0.0, PI);
        assert_eq!(closest_index(&path, &pose, &params), Ok(2));

        // Both gates failed, far behind and facing sideways
        let pose = Pose::from_xy_yaw(-50.0, 30.0, PI / 2.0);
        let index = closest_index(&path, &pose, &params).unwrap();
        assert!(index < path.len());
        assert_eq!(index, 0);
    }

    #[test]
    fn test_closest_index_with_dist_ang_thr() {
        let poses = out_and_back_path().poses();

        let pose = Pose::from_xy_yaw(3.1, 0.8, PI);
        assert_eq!(
            closest_index_with_dist_ang_thr(&poses, &pose, 1.0, PI / 4.0),
            Some(16)
        );

        let pose = Pose::from_xy_yaw(3.1, 0.2, 0.0);
        assert_eq!(
            closest_index_with_dist_ang_thr(&poses, &pose, 1.0, PI / 4.0),
            Some(3)
        );

        // Nothing within the distance threshold
        assert_eq!(
            closest_index_with_dist_ang_thr(&poses, &Pose::from_xy_yaw(50.0, 0.0, 0.0), 1.0, PI),
            None
        );

        // Nothing within the angle threshold
        assert_eq!(
            closest_index_with_dist_ang_thr(
                &poses,
                &Pose::from_xy_yaw(3.0, 0.0, PI / 2.0),
                1.0,
                PI / 4.0
            ),
            None
        );
    }
}
