//! # Tracking Executable
//!
//! Runs the waypoint tracker against a simulated traverse, without requiring localisation or a
//! planner. The vehicle drives forward along a straight leg, stops at a switchback and reverses
//! away along a second leg, while its current waypoint index is resolved every cycle.
//!
//! The resolved index of every cycle is archived in the session directory as `arch/track.json`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{thread, time::Duration};

use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use log::{debug, info, warn};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use track_lib::{
    path::{Path, Waypoint},
    track::{lane_direction, waypoint_yaw, TrackParams, TrackingState},
};
use util::{
    geom::Pose,
    logger::{logger_init, LevelFilter},
    maths::normalise_angle,
    session::{self, Session},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the simulated traverse.
#[derive(Debug, Deserialize)]
struct SimParams {
    /// Period of one cycle.
    cycle_period_s: f64,

    /// If true each cycle sleeps for the cycle period, otherwise cycles run back to back.
    realtime: bool,

    /// Separation between waypoints on both legs.
    point_sep_m: f64,

    /// Length of each leg.
    leg_length_m: f64,

    /// Angle between the forward leg and the reversing leg.
    reverse_leg_angle_rad: f64,

    /// Speed magnitude of the vehicle on both legs.
    speed_ms: f64,

    /// Amplitude of the lateral wobble added to the simulated pose, mimicking localisation noise.
    lateral_jitter_m: f64,
}

/// Archived data for a single cycle.
#[derive(Debug, Serialize)]
struct CycleRecord {
    cycle: usize,
    elapsed_s: f64,
    pose: Pose,
    index: Option<usize>,
    waypoint_yaw_rad: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("track_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("Waypoint Tracking Simulation\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let track_params: TrackParams =
        util::params::load("track.toml").wrap_err("Could not load tracking params")?;
    let sim_params: SimParams =
        util::params::load("track_sim.toml").wrap_err("Could not load simulation params")?;

    debug!("Tracking params: {:#?}", track_params);
    debug!("Simulation params: {:#?}", sim_params);

    // ---- BUILD PATH ----

    let (path, switchback_index) = build_switchback_path(&sim_params)?;

    info!(
        "Built path with {} waypoints, switchback at index {}",
        path.len(),
        switchback_index
    );
    info!(
        "Lane direction: {:?} (forward leg: {:?}, reverse leg: {:?})",
        lane_direction(&path, &track_params),
        lane_direction(
            &Path::new(path.waypoints[..=switchback_index].to_vec()),
            &track_params
        ),
        lane_direction(
            &Path::new(path.waypoints[switchback_index + 1..].to_vec()),
            &track_params
        )
    );

    // ---- MAIN LOOP ----

    let step_m = sim_params.speed_ms * sim_params.cycle_period_s;
    let total_length_m = 2.0 * sim_params.leg_length_m;
    let num_cycles = (total_length_m / step_m).ceil() as usize + 1;

    let mut state = TrackingState::new();
    let mut records = Vec::with_capacity(num_cycles);
    let mut prev_index: Option<usize> = None;
    let mut num_reversals = 0;

    for cycle in 0..num_cycles {
        let distance_m = (cycle as f64 * step_m).min(total_length_m);
        let jitter_m = sim_params.lateral_jitter_m * (cycle as f64 * 0.7).sin();

        let pose = match sim_pose(&path, distance_m, jitter_m) {
            Some(p) => p,
            None => {
                warn!("Could not simulate pose at {:.2} m along the path", distance_m);
                continue;
            }
        };

        let index = match state.update(&path, &pose, &track_params) {
            Ok(i) => Some(i),
            Err(e) => {
                warn!("Tracking failed in cycle {}: {}", cycle, e);
                None
            }
        };

        if let (Some(prev), Some(curr)) = (prev_index, index) {
            if curr < prev {
                num_reversals += 1;
                warn!("Index moved backwards in cycle {}: {} -> {}", cycle, prev, curr);
            }
            if prev <= switchback_index && curr > switchback_index {
                info!("Crossed switchback in cycle {} ({} -> {})", cycle, prev, curr);
            }
        }

        let waypoint_yaw_rad = index.and_then(|i| waypoint_yaw(&path, i));
        debug!(
            "Cycle {:4}: pose ({:7.3}, {:7.3}, {:6.3} rad) -> index {:?}",
            cycle,
            pose.position_m[0],
            pose.position_m[1],
            pose.yaw(),
            index
        );

        records.push(CycleRecord {
            cycle,
            elapsed_s: session::get_elapsed_seconds(),
            pose,
            index,
            waypoint_yaw_rad,
        });
        prev_index = index;

        if sim_params.realtime {
            thread::sleep(Duration::from_secs_f64(sim_params.cycle_period_s));
        }
    }

    // ---- SHUTDOWN ----

    info!(
        "Traverse complete: {} cycles, final index {:?} of {}, {} backward moves",
        records.len(),
        state.index(),
        path.len() - 1,
        num_reversals
    );

    session.save("arch/track.json", records);
    session.exit();

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build a path which drives forward along +X, then reverses away at an angle.
///
/// Returns the path and the index of the switchback waypoint, the last one with a positive speed.
fn build_switchback_path(params: &SimParams) -> Result<(Path, usize)> {
    if params.point_sep_m <= 0.0 || params.leg_length_m < params.point_sep_m {
        return Err(eyre!(
            "Invalid path geometry, separation {} m with leg length {} m",
            params.point_sep_m,
            params.leg_length_m
        ));
    }

    let num_leg_points = (params.leg_length_m / params.point_sep_m).floor() as usize;
    let mut waypoints = Vec::with_capacity(2 * num_leg_points + 1);

    // Forward leg, including the switchback point at the end
    for i in 0..=num_leg_points {
        waypoints.push(Waypoint::from_xy_yaw(
            i as f64 * params.point_sep_m,
            0.0,
            0.0,
            params.speed_ms,
        ));
    }
    let switchback_index = waypoints.len() - 1;
    let switchback_x_m = switchback_index as f64 * params.point_sep_m;

    // Reverse leg, the vehicle moves back and to the left while facing away from the motion
    let motion_rad = std::f64::consts::PI - params.reverse_leg_angle_rad;
    let vehicle_yaw_rad = normalise_angle(motion_rad + std::f64::consts::PI);
    for i in 1..=num_leg_points {
        let s_m = i as f64 * params.point_sep_m;
        waypoints.push(Waypoint::from_xy_yaw(
            switchback_x_m + s_m * motion_rad.cos(),
            s_m * motion_rad.sin(),
            vehicle_yaw_rad,
            -params.speed_ms,
        ));
    }

    Ok((Path::new(waypoints), switchback_index))
}

/// Simulate the vehicle pose `distance_m` along the path, shifted sideways by `jitter_m`.
///
/// The heading is the estimated waypoint heading at the end of the current segment.
fn sim_pose(path: &Path, distance_m: f64, jitter_m: f64) -> Option<Pose> {
    let mut remaining_m = distance_m;

    for (i, pair) in path.waypoints.windows(2).enumerate() {
        let start = pair[0].position();
        let diff = pair[1].position() - start;
        let length_m = diff.norm();

        if remaining_m <= length_m || i + 2 == path.len() {
            let frac = if length_m > 0.0 {
                (remaining_m / length_m).min(1.0)
            } else {
                1.0
            };
            let yaw_rad = waypoint_yaw(path, i + 1)?;

            // Offset perpendicular to the heading
            let lateral = Vector3::new(-yaw_rad.sin(), yaw_rad.cos(), 0.0) * jitter_m;

            return Some(Pose::new(start + diff * frac + lateral, yaw_rad));
        }

        remaining_m -= length_m;
    }

    None
}
