//! Tracking parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for waypoint tracking
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct TrackParams {
    /// Waypoints further than this from the vehicle are not considered during the gated pass of a
    /// cold start.
    pub closest_valid_distance_m: f64,

    /// Waypoints whose heading differs from the vehicle's by this much or more are not considered
    /// during the gated pass of a cold start.
    pub closest_valid_angle_rad: f64,

    /// Longitudinal separation between consecutive waypoints below which the pair gives no
    /// evidence of the lane direction.
    pub direction_position_threshold_m: f64,

    /// Target speed magnitude below which a waypoint gives no evidence of the lane direction.
    pub direction_velocity_threshold_ms: f64,
}

impl Default for TrackParams {
    fn default() -> Self {
        Self {
            closest_valid_distance_m: 5.0,
            closest_valid_angle_rad: std::f64::consts::FRAC_PI_2,
            direction_position_threshold_m: 1e-3,
            direction_velocity_threshold_ms: 0.01,
        }
    }
}
