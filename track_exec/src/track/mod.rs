//! # Tracking module
//!
//! Tracking resolves which waypoint of a path currently represents the vehicle's progress along
//! it. The resolved index is what a path-following controller steers towards.
//!
//! Tracking is split into four parts:
//! - [`lane_dir`] classifies the path as driven forwards or backwards, from the spatial ordering
//!   of the waypoints and from the sign of their target speeds.
//! - [`heading`] estimates the heading the vehicle should have at a given waypoint, accounting for
//!   switchbacks where the vehicle reverses.
//! - [`locate`] finds an initial index with no prior knowledge, preferring nearby waypoints that
//!   face the same way as the vehicle.
//! - [`state`] updates a previously resolved index as the vehicle moves, without rerunning the
//!   full search every cycle.
//!
//! None of these hold any internal state. The previous index is owned by the caller, either as a
//! plain `Option<usize>` or wrapped in a [`TrackingState`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod heading;
pub mod lane_dir;
pub mod locate;
pub mod params;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use heading::waypoint_yaw;
pub use lane_dir::*;
pub use locate::*;
pub use params::TrackParams;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which prevent an index from being resolved.
///
/// If either of these is returned no valid tracking is possible and the vehicle must not be
/// commanded from the result.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum TrackError {
    /// The path doesn't contain enough waypoints to track along.
    #[error("At least 2 waypoints are required for tracking, the path has {0}")]
    InsufficientPath(usize),

    /// The previous index doesn't exist in the path. This usually means the index is stale, having
    /// been resolved against a path which has since been replaced.
    #[error("Previous index {index} is beyond the end of the path (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// No finite distance could be measured between the vehicle and the path, either the pose or
    /// every waypoint position contains a NaN or infinite coordinate.
    #[error("Vehicle position {0:?} can't be compared against the path")]
    NonFinitePosition([f64; 2]),
}
