//! # Path
//!
//! This module defines the waypoint path the vehicle is tracked along.
//!
//! A path is an ordered sequence of waypoints, each carrying a pose and a signed target speed.
//! The sign of the speed gives the intended direction of travel at that waypoint, so a path which
//! contains a switchback (the vehicle stops and reverses) has speeds of both signs.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

// Internal
use crate::track::{lane_direction, LaneDirection, TrackParams};
use util::geom::{plane_distance, relative_coordinate, Pose};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single point on the path.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Pose of the waypoint in the LM frame
    pub pose: Pose,

    /// Signed target speed at this waypoint. Negative speeds mean the vehicle reverses through
    /// the waypoint.
    pub speed_ms: f64,
}

/// A path the vehicle should follow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub waypoints: Vec<Waypoint>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Waypoint {
    pub fn new(pose: Pose, speed_ms: f64) -> Self {
        Self { pose, speed_ms }
    }

    /// Create a waypoint on the XY plane.
    pub fn from_xy_yaw(x_m: f64, y_m: f64, heading_rad: f64, speed_ms: f64) -> Self {
        Self::new(Pose::from_xy_yaw(x_m, y_m, heading_rad), speed_ms)
    }

    /// Position of the waypoint in the LM frame.
    pub fn position(&self) -> &Vector3<f64> {
        &self.pose.position_m
    }
}

impl Path {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    /// Create a new empty path
    pub fn new_empty() -> Self {
        Self::default()
    }

    /// Get the number of waypoints in the path
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Index of the last waypoint, or `None` if the path is empty.
    pub fn last_index(&self) -> Option<usize> {
        self.waypoints.len().checked_sub(1)
    }

    /// Planar distance between the first two waypoints.
    ///
    /// Paths are expected to be evenly spaced, so this is taken as the interval of the whole
    /// path. If there are fewer than two waypoints `None` is returned.
    pub fn interval(&self) -> Option<f64> {
        match self.waypoints.as_slice() {
            [first, second, ..] => Some(plane_distance(first.position(), second.position())),
            _ => None,
        }
    }

    /// Get the waypoint at the given index.
    pub fn waypoint(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    pub fn waypoint_position(&self, index: usize) -> Option<Vector3<f64>> {
        self.waypoint(index).map(|w| w.pose.position_m)
    }

    pub fn waypoint_orientation(&self, index: usize) -> Option<UnitQuaternion<f64>> {
        self.waypoint(index).map(|w| w.pose.attitude_q)
    }

    pub fn waypoint_pose(&self, index: usize) -> Option<Pose> {
        self.waypoint(index).map(|w| w.pose)
    }

    pub fn waypoint_speed_ms(&self, index: usize) -> Option<f64> {
        self.waypoint(index).map(|w| w.speed_ms)
    }

    /// Get the poses of all waypoints in the path.
    pub fn poses(&self) -> Vec<Pose> {
        self.waypoints.iter().map(|w| w.pose).collect()
    }

    /// Returns true if the waypoint at `index` lies on the side of `pose` the path is driven
    /// towards.
    ///
    /// For a forward path that is ahead of (or level with) the pose, for a backward path it is
    /// behind. If the lane direction can't be determined, or the index is invalid, `false` is
    /// returned.
    pub fn in_driving_direction(&self, index: usize, pose: &Pose, params: &TrackParams) -> bool {
        let position = match self.waypoint(index) {
            Some(w) => w.position(),
            None => return false,
        };

        let rel_x_m = relative_coordinate(position, pose)[0];

        match lane_direction(self, params) {
            LaneDirection::Forward => rel_x_m >= 0.0,
            LaneDirection::Backward => rel_x_m < 0.0,
            LaneDirection::Error => false,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
