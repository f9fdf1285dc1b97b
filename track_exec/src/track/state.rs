//! # Index tracking
//!
//! Updates a previously resolved waypoint index as the vehicle moves along the path.
//!
//! An update runs in two phases:
//!
//! 1. Offset search - starting at the previous index, walk along the path moving the search start
//!    forwards while the vehicle is approaching the next waypoint or a switchback is reached, or
//!    backwards while the vehicle has regressed. Each step of the walk is an [`OffsetStep`]. The
//!    offset only ever moves in one direction during a single update.
//! 2. Forward minimum scan - from the search start, walk forwards until the distance to the
//!    vehicle strictly increases. The waypoint before the increase is the new index.
//!
//! With no previous index the cold start search in [`super::locate`] is used instead.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{trace, warn};
use serde::Serialize;

// Internal
use super::{
    locate::{closest_index, planar_position, pose_is_finite},
    TrackError, TrackParams,
};
use crate::path::{Path, Waypoint};
use util::{
    geom::{plane_distance, Pose},
    maths::clamp,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The previously resolved index, owned by whoever is tracking the vehicle.
///
/// A new state is uninitialised, so the first update performs a cold start.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingState {
    index: Option<usize>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// One step of the offset search.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OffsetStep {
    /// The target speed changes sign between this waypoint and the next, so the next waypoint is
    /// on the far side of a switchback. Move the search start forward.
    AdvanceOnSwitchback,

    /// The vehicle is closer to the next waypoint than this one. Move the search start forward.
    AdvanceOnApproach,

    /// The vehicle is closer to the previous waypoint than this one. Move the search start back.
    RetreatOnRegression,

    /// None of the above, the search start is final.
    Stop,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrackingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current index, or `None` if no index has been resolved.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Forget the current index so that the next update performs a cold start.
    ///
    /// This must be called whenever the path being tracked is replaced.
    pub fn reset(&mut self) {
        self.index = None;
    }

    /// Resolve the vehicle's current index along the path.
    ///
    /// On error the state is reset.
    pub fn update(
        &mut self,
        path: &Path,
        pose: &Pose,
        params: &TrackParams,
    ) -> Result<usize, TrackError> {
        let result = update_current_index(path, pose, self.index, params);
        self.index = result.ok();
        result
    }
}

impl OffsetStep {
    /// The change this step makes to the offset, or `None` if the walk should stop.
    pub fn delta(&self) -> Option<isize> {
        match self {
            OffsetStep::AdvanceOnSwitchback | OffsetStep::AdvanceOnApproach => Some(1),
            OffsetStep::RetreatOnRegression => Some(-1),
            OffsetStep::Stop => None,
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the vehicle's current index along the path given the previously resolved index.
///
/// If `previous_index` is `None` a cold start is performed with [`closest_index`].
///
/// # Errors
/// - [`TrackError::InsufficientPath`] if the path has fewer than 2 waypoints.
/// - [`TrackError::IndexOutOfRange`] if the previous index is beyond the end of the path.
/// - [`TrackError::NonFinitePosition`] if the pose contains a NaN or infinite value.
pub fn update_current_index(
    path: &Path,
    pose: &Pose,
    previous_index: Option<usize>,
    params: &TrackParams,
) -> Result<usize, TrackError> {
    let path_len = path.len();

    if path_len < 2 {
        warn!(
            "Failed to update current index, too few waypoints (size = {})",
            path_len
        );
        return Err(TrackError::InsufficientPath(path_len));
    }

    if !pose_is_finite(pose) {
        warn!("Failed to update current index, pose is not finite: {:?}", pose);
        return Err(TrackError::NonFinitePosition(planar_position(pose)));
    }

    let previous_index = match previous_index {
        Some(i) => i,
        None => return closest_index(path, pose, params),
    };

    if previous_index >= path_len {
        warn!(
            "Failed to update current index, previous index is stale (size = {}, index = {})",
            path_len, previous_index
        );
        return Err(TrackError::IndexOutOfRange {
            index: previous_index,
            len: path_len,
        });
    }

    // ---- OFFSET SEARCH ----

    let offset = offset_search(path, pose, previous_index);
    let last_index = path_len as isize - 1;
    let start_index = clamp(previous_index as isize + offset, 0, last_index) as usize;

    // ---- FORWARD MINIMUM SCAN ----

    let index = min_distance_scan(path, pose, start_index);

    trace!(
        "Index updated {} -> {} (offset: {}, scan start: {})",
        previous_index,
        index,
        offset,
        start_index
    );

    Ok(index)
}

/// Classify the offset search step at `index`, given the offset accumulated so far.
///
/// `index` must be an interior waypoint, otherwise [`OffsetStep::Stop`] is returned.
pub fn offset_step(path: &Path, pose: &Pose, index: usize, offset: isize) -> OffsetStep {
    let (prev, current, next) = match (
        index.checked_sub(1).and_then(|i| path.waypoint(i)),
        path.waypoint(index),
        path.waypoint(index + 1),
    ) {
        (Some(p), Some(c), Some(n)) => (p, c, n),
        _ => return OffsetStep::Stop,
    };

    let distance_m = |waypoint: &Waypoint| plane_distance(&pose.position_m, waypoint.position());

    let prev_current_speed = prev.speed_ms * current.speed_ms;
    let current_next_speed = current.speed_ms * next.speed_ms;

    if current_next_speed < 0.0 && offset >= 0 {
        OffsetStep::AdvanceOnSwitchback
    } else if current_next_speed > 0.0 && distance_m(next) < distance_m(current) && offset >= 0 {
        OffsetStep::AdvanceOnApproach
    } else if prev_current_speed > 0.0 && distance_m(prev) < distance_m(current) && offset <= 0 {
        OffsetStep::RetreatOnRegression
    } else {
        OffsetStep::Stop
    }
}

/// Walk the path from `previous_index`, accumulating the offset to apply to the search start.
///
/// The search is only performed from interior waypoints, from the first or last waypoint the
/// offset is always zero. The magnitude of the offset is at most the number of steps walked.
pub fn offset_search(path: &Path, pose: &Pose, previous_index: usize) -> isize {
    let path_len = path.len();
    let mut offset = 0;

    if previous_index == 0 || previous_index + 1 >= path_len {
        return offset;
    }

    for i in previous_index..(path_len - 1) {
        let step = offset_step(path, pose, i, offset);

        match step.delta() {
            Some(delta) => {
                trace!("Offset search at {}: {:?}", i, step);
                offset += delta;
            }
            None => break,
        }
    }

    offset
}

/// Scan forward from `start_index` for the last waypoint before the distance to the vehicle
/// starts increasing.
///
/// If the distance never increases the last waypoint of the path is returned.
pub fn min_distance_scan(path: &Path, pose: &Pose, start_index: usize) -> usize {
    let last_index = path.len().saturating_sub(1);
    let mut prev_distance_m: Option<f64> = None;

    for (i, waypoint) in path.waypoints.iter().enumerate().skip(start_index) {
        let distance_m = plane_distance(waypoint.position(), &pose.position_m);

        match prev_distance_m {
            Some(prev) if distance_m > prev => return i - 1,
            _ => prev_distance_m = Some(distance_m),
        }
    }

    last_index
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
