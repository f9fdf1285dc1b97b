//! # Tracking library.
//!
//! This library allows other crates in the workspace to access the waypoint tracking items
//! defined inside the tracking crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Path module - the waypoint sequence the vehicle is tracked along
pub mod path;

/// Tracking module - resolves the vehicle's current waypoint index along a path
pub mod track;
