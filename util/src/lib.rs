//! Utility library for the waypoint tracking software.
//!
//! Provides the geometry primitives the tracker is built on, along with the logging, session and
//! parameter handling shared by every executable in the workspace.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod geom;
pub mod host;
pub mod logger;
pub mod maths;
pub mod params;
pub mod session;
pub mod time;
