//! # Lane direction
//!
//! Determines whether a path is driven forwards or backwards. Two independent pieces of evidence
//! are used:
//!
//! - Position: where each waypoint lies relative to the pose of the waypoint before it. A path
//!   whose waypoints lie ahead of each other is driven forwards.
//! - Velocity: the sign of the target speeds.
//!
//! If both are available but disagree the direction is [`LaneDirection::Error`], callers which
//! depend on the direction should then skip any direction based checks.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::TrackParams;
use crate::path::Path;
use util::geom::{relative_coordinate, Pose};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The direction a path is driven in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum LaneDirection {
    Forward,
    Backward,

    /// The direction can't be determined, either because there is no evidence or because the
    /// evidence conflicts.
    Error,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the direction the path is driven in.
///
/// The positional estimate takes precedence, the velocity estimate is only used when the
/// positional one is unavailable. Paths with fewer than two waypoints have no direction.
pub fn lane_direction(path: &Path, params: &TrackParams) -> LaneDirection {
    if path.len() < 2 {
        return LaneDirection::Error;
    }

    let pos_dir = lane_direction_by_position(path, params);
    let vel_dir = lane_direction_by_velocity(path, params);

    match (pos_dir, vel_dir) {
        (LaneDirection::Error, v) => v,
        (p, LaneDirection::Error) => p,
        (p, v) if p == v => p,
        (p, v) => {
            trace!(
                "Lane direction conflict: position says {:?}, velocity says {:?}",
                p,
                v
            );
            LaneDirection::Error
        }
    }
}

/// Estimate the lane direction from the positions of the waypoints.
///
/// The first waypoint which lies measurably ahead of or behind its predecessor (in the
/// predecessor's frame) decides the direction.
pub fn lane_direction_by_position(path: &Path, params: &TrackParams) -> LaneDirection {
    path.waypoints
        .windows(2)
        .map(|pair| relative_coordinate(pair[1].position(), &pair[0].pose)[0])
        .find(|rel_x_m| rel_x_m.abs() >= params.direction_position_threshold_m)
        .map(|rel_x_m| {
            if rel_x_m < 0.0 {
                LaneDirection::Backward
            } else {
                LaneDirection::Forward
            }
        })
        .unwrap_or(LaneDirection::Error)
}

/// Estimate the lane direction from the sign of the first non-zero target speed.
pub fn lane_direction_by_velocity(path: &Path, params: &TrackParams) -> LaneDirection {
    path.waypoints
        .iter()
        .map(|w| w.speed_ms)
        .find(|speed_ms| speed_ms.abs() >= params.direction_velocity_threshold_ms)
        .map(|speed_ms| {
            if speed_ms < 0.0 {
                LaneDirection::Backward
            } else {
                LaneDirection::Forward
            }
        })
        .unwrap_or(LaneDirection::Error)
}

/// Returns true if the third pose lies ahead of the second.
///
/// Returns `None` if fewer than three poses are given.
pub fn is_direction_forward(poses: &[Pose]) -> Option<bool> {
    if poses.len() < 3 {
        return None;
    }

    Some(relative_coordinate(&poses[2].position_m, &poses[1])[0] > 0.0)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
