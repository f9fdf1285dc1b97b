//! # Geometry primitives
//!
//! Stateless frame transforms and distance/angle helpers used by the tracker. All functions in
//! this module are pure.
//!
//! Poses are expressed in the Local Map (LM) frame. A point "relative" to a pose is expressed in
//! the body frame of that pose, with +X pointing along the pose's heading and +Y to its left.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

// Internal
use crate::maths::{deg2rad, normalise_angle};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Radius substituted when the true radius would be infinite.
pub const RADIUS_MAX: f64 = 1e9;

/// Curvature substituted when the true curvature would be infinite.
pub const KAPPA_MAX: f64 = 1e9;

/// Below this separation in both axes two points are treated as coincident when building a line.
const LINE_POINT_EPSILON: f64 = 1e-5;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A position and attitude in the LM frame.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// The position in the LM frame
    pub position_m: Vector3<f64>,

    /// The attitude in the LM frame. This quaternion rotates a vector from the body frame into
    /// the LM frame.
    pub attitude_q: UnitQuaternion<f64>,
}

/// A line in the XY plane of the form `a*x + b*y + c = 0`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LineEquation {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Pose {
    fn default() -> Self {
        Self {
            position_m: Vector3::zeros(),
            attitude_q: UnitQuaternion::identity(),
        }
    }
}

impl Pose {
    /// Create a new pose from a position and a heading about the vertical axis.
    pub fn new(position_m: Vector3<f64>, heading_rad: f64) -> Self {
        Self {
            position_m,
            attitude_q: quaternion_from_yaw(heading_rad),
        }
    }

    /// Create a new pose on the XY plane.
    pub fn from_xy_yaw(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self::new(Vector3::new(x_m, y_m, 0.0), heading_rad)
    }

    /// Return the heading (angle to the positive LM_X axis) in radians, in the range (-pi, pi].
    pub fn yaw(&self) -> f64 {
        normalise_angle(self.attitude_q.euler_angles().2)
    }
}

impl LineEquation {
    /// Perpendicular distance between this line and the given point, ignoring the Z axis.
    pub fn distance_to(&self, point: &Vector3<f64>) -> f64 {
        (self.a * point[0] + self.b * point[1] + self.c).abs()
            / (self.a.powi(2) + self.b.powi(2)).sqrt()
    }
}

// ---------------------------------------------------------------------------
// FRAME TRANSFORMS
// ---------------------------------------------------------------------------

/// Express a point given in the LM frame in the body frame of `origin`.
pub fn relative_coordinate(point: &Vector3<f64>, origin: &Pose) -> Vector3<f64> {
    origin.attitude_q.inverse() * (point - origin.position_m)
}

/// Express a point given in the body frame of `origin` in the LM frame.
///
/// This is the inverse of [`relative_coordinate`].
pub fn absolute_coordinate(point: &Vector3<f64>, origin: &Pose) -> Vector3<f64> {
    origin.attitude_q * *point + origin.position_m
}

/// Planar version of [`relative_coordinate`] which only uses the heading of `origin`.
///
/// The Z component of the result is always zero.
pub fn relative_coordinate_2d(point: &Vector3<f64>, origin: &Pose) -> Vector3<f64> {
    let dx = point[0] - origin.position_m[0];
    let dy = point[1] - origin.position_m[1];
    let (sin_yaw, cos_yaw) = origin.yaw().sin_cos();

    Vector3::new(
        cos_yaw * dx + sin_yaw * dy,
        -sin_yaw * dx + cos_yaw * dy,
        0.0,
    )
}

/// Planar version of [`absolute_coordinate`] which only uses the heading of `origin`.
///
/// The Z component of the result is the height of `origin`.
pub fn absolute_coordinate_2d(point: &Vector3<f64>, origin: &Pose) -> Vector3<f64> {
    let (sin_yaw, cos_yaw) = origin.yaw().sin_cos();

    Vector3::new(
        cos_yaw * point[0] - sin_yaw * point[1] + origin.position_m[0],
        sin_yaw * point[0] + cos_yaw * point[1] + origin.position_m[1],
        origin.position_m[2],
    )
}

/// The pose of `target` expressed in the body frame of `current`.
pub fn relative_target_pose(current: &Pose, target: &Pose) -> Pose {
    let inv_q = current.attitude_q.inverse();

    Pose {
        position_m: inv_q * (target.position_m - current.position_m),
        attitude_q: inv_q * target.attitude_q,
    }
}

// ---------------------------------------------------------------------------
// DISTANCES
// ---------------------------------------------------------------------------

/// Squared distance between two points, ignoring the Z axis.
pub fn dist_squared_2d(p: &Vector3<f64>, q: &Vector3<f64>) -> f64 {
    let dx = p[0] - q[0];
    let dy = p[1] - q[1];
    dx * dx + dy * dy
}

/// Euclidian distance between two points, ignoring the Z axis.
pub fn plane_distance(p: &Vector3<f64>, q: &Vector3<f64>) -> f64 {
    dist_squared_2d(p, q).sqrt()
}

/// Signed lateral distance of `point` from the line passing through `line_s` and `line_e`.
///
/// Positive values are to the left of the line. If the line has zero length the error is zero.
pub fn lateral_error_2d(line_s: &Vector3<f64>, line_e: &Vector3<f64>, point: &Vector3<f64>) -> f64 {
    let a_vec = Vector3::new(line_e[0] - line_s[0], line_e[1] - line_s[1], 0.0);
    let b_vec = Vector3::new(point[0] - line_s[0], point[1] - line_s[1], 0.0);

    let length = a_vec.norm();
    if length > 0.0 {
        a_vec.cross(&b_vec)[2] / length
    } else {
        0.0
    }
}

/// Build the line passing through `start` and `end`.
///
/// Returns `None` if the two points are coincident, in which case no line can be defined.
pub fn linear_equation(start: &Vector3<f64>, end: &Vector3<f64>) -> Option<LineEquation> {
    let sub_x = (start[0] - end[0]).abs();
    let sub_y = (start[1] - end[1]).abs();

    if sub_x < LINE_POINT_EPSILON && sub_y < LINE_POINT_EPSILON {
        return None;
    }

    Some(LineEquation {
        a: end[1] - start[1],
        b: -(end[0] - start[0]),
        c: -(end[1] - start[1]) * start[0] + (end[0] - start[0]) * start[1],
    })
}

// ---------------------------------------------------------------------------
// ANGLES AND ROTATIONS
// ---------------------------------------------------------------------------

/// Build an attitude quaternion for a rotation about the vertical axis only.
pub fn quaternion_from_yaw(yaw_rad: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_euler_angles(0.0, 0.0, yaw_rad)
}

/// Rotate a point about the Z axis by the given angle in degrees. The Z component is dropped.
pub fn rotate_point(point: &Vector3<f64>, degree: f64) -> Vector3<f64> {
    let (sin_a, cos_a) = deg2rad(degree).sin_cos();

    Vector3::new(
        cos_a * point[0] - sin_a * point[1],
        sin_a * point[0] + cos_a * point[1],
        0.0,
    )
}

/// Rotate a unit vector about the Z axis by the given angle in degrees, projecting it onto the XY
/// plane.
pub fn rotate_unit_vector(unit_vector: &Unit<Vector3<f64>>, degree: f64) -> Unit<Vector3<f64>> {
    Unit::new_normalize(rotate_point(unit_vector, degree))
}

/// Angle in degrees between the heading of the vehicle and the heading of the waypoint.
///
/// The result is unsigned, in the range [0, 180].
pub fn relative_angle_deg(waypoint_pose: &Pose, vehicle_pose: &Pose) -> f64 {
    // Waypoint's forward axis expressed in the vehicle's body frame
    let waypoint_x = vehicle_pose.attitude_q.inverse() * (waypoint_pose.attitude_q * Vector3::x());

    Vector3::x().angle(&waypoint_x).to_degrees()
}

// ---------------------------------------------------------------------------
// CURVATURE
// ---------------------------------------------------------------------------

/// Radius of the arc which starts at `current_pose`, tangent to its heading, and passes through
/// `target`.
///
/// If the target lies on the pose's longitudinal axis the radius is infinite and [`RADIUS_MAX`]
/// is returned instead.
pub fn calc_radius(target: &Vector3<f64>, current_pose: &Pose) -> f64 {
    let denominator = 2.0 * relative_coordinate_2d(target, current_pose)[1];
    let numerator = dist_squared_2d(target, &current_pose.position_m);

    if denominator.abs() > 0.0 {
        numerator / denominator
    } else {
        RADIUS_MAX
    }
}

/// Curvature of the arc described in [`calc_radius`].
///
/// A zero radius substitutes [`KAPPA_MAX`].
pub fn calc_curvature(target: &Vector3<f64>, current_pose: &Pose) -> f64 {
    let radius = calc_radius(target, current_pose);

    if radius.abs() > 0.0 {
        1.0 / radius
    } else {
        KAPPA_MAX
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const EPS: f64 = 1e-9;

    fn assert_vec_eq(a: &Vector3<f64>, b: &Vector3<f64>) {
        assert!((a - b).norm() < EPS, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_relative_absolute_coordinate() {
        let origin = Pose::from_xy_yaw(1.0, 2.0, FRAC_PI_2);

        // A point one metre "north" of the origin is straight ahead when facing north
        let rel = relative_coordinate(&Vector3::new(1.0, 3.0, 0.0), &origin);
        assert_vec_eq(&rel, &Vector3::new(1.0, 0.0, 0.0));

        // A point to the east is on the right
        let rel = relative_coordinate(&Vector3::new(2.0, 2.0, 0.0), &origin);
        assert_vec_eq(&rel, &Vector3::new(0.0, -1.0, 0.0));

        // Round trip through both transforms
        let point = Vector3::new(-4.0, 0.5, 1.5);
        let back = absolute_coordinate(&relative_coordinate(&point, &origin), &origin);
        assert_vec_eq(&back, &point);
    }

    #[test]
    fn test_coordinate_2d_matches_3d_on_plane() {
        let origin = Pose::from_xy_yaw(-3.0, 0.5, 2.4);
        let point = Vector3::new(1.0, -2.0, 0.0);

        assert_vec_eq(
            &relative_coordinate_2d(&point, &origin),
            &relative_coordinate(&point, &origin),
        );
        assert_vec_eq(
            &absolute_coordinate_2d(&point, &origin),
            &absolute_coordinate(&point, &origin),
        );
    }

    #[test]
    fn test_plane_distance_ignores_z() {
        let p = Vector3::new(0.0, 0.0, 10.0);
        let q = Vector3::new(3.0, 4.0, -2.0);

        assert!((plane_distance(&p, &q) - 5.0).abs() < EPS);
        assert!((dist_squared_2d(&p, &q) - 25.0).abs() < EPS);
    }

    #[test]
    fn test_pose_yaw() {
        assert!((Pose::from_xy_yaw(0.0, 0.0, 0.3).yaw() - 0.3).abs() < EPS);
        assert!((Pose::from_xy_yaw(0.0, 0.0, -2.0).yaw() + 2.0).abs() < EPS);
        assert!((Pose::from_xy_yaw(0.0, 0.0, PI).yaw().abs() - PI).abs() < EPS);
        assert_eq!(Pose::default().yaw(), 0.0);
    }

    #[test]
    fn test_linear_equation() {
        let start = Vector3::new(0.0, 0.0, 0.0);
        let end = Vector3::new(2.0, 0.0, 0.0);

        let line = linear_equation(&start, &end).unwrap();
        assert!((line.distance_to(&Vector3::new(1.0, 3.0, 0.0)) - 3.0).abs() < EPS);
        assert!((line.distance_to(&Vector3::new(5.0, -0.5, 0.0)) - 0.5).abs() < EPS);

        // Coincident points can't define a line
        assert!(linear_equation(&start, &Vector3::new(1e-6, -1e-6, 0.0)).is_none());
    }

    #[test]
    fn test_lateral_error() {
        let s = Vector3::new(0.0, 0.0, 0.0);
        let e = Vector3::new(1.0, 0.0, 0.0);

        assert!((lateral_error_2d(&s, &e, &Vector3::new(0.5, 2.0, 0.0)) - 2.0).abs() < EPS);
        assert!((lateral_error_2d(&s, &e, &Vector3::new(0.5, -1.0, 0.0)) + 1.0).abs() < EPS);
        assert_eq!(lateral_error_2d(&s, &s, &Vector3::new(0.5, -1.0, 0.0)), 0.0);
    }

    #[test]
    fn test_rotations() {
        let rotated = rotate_point(&Vector3::new(1.0, 0.0, 0.0), 90.0);
        assert_vec_eq(&rotated, &Vector3::new(0.0, 1.0, 0.0));

        let unit = rotate_unit_vector(&Vector3::x_axis(), 180.0);
        assert_vec_eq(&unit, &Vector3::new(-1.0, 0.0, 0.0));
        assert!((unit.norm() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_relative_angle_and_pose() {
        let vehicle = Pose::from_xy_yaw(1.0, 1.0, 0.0);
        let waypoint = Pose::from_xy_yaw(2.0, 1.0, FRAC_PI_2);

        assert!((relative_angle_deg(&waypoint, &vehicle) - 90.0).abs() < 1e-6);
        assert!(relative_angle_deg(&vehicle, &vehicle).abs() < 1e-6);

        let rel = relative_target_pose(&vehicle, &waypoint);
        assert_vec_eq(&rel.position_m, &Vector3::new(1.0, 0.0, 0.0));
        assert!((rel.yaw() - FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn test_radius_and_curvature() {
        let pose = Pose::from_xy_yaw(0.0, 0.0, 0.0);

        // Point on a circle of radius 1 centred at (0, 1)
        let target = Vector3::new(1.0, 1.0, 0.0);
        assert!((calc_radius(&target, &pose) - 1.0).abs() < EPS);
        assert!((calc_curvature(&target, &pose) - 1.0).abs() < EPS);

        // Straight ahead has no finite radius
        let ahead = Vector3::new(5.0, 0.0, 0.0);
        assert_eq!(calc_radius(&ahead, &pose), RADIUS_MAX);
        assert!((calc_curvature(&ahead, &pose) - 1.0 / RADIUS_MAX).abs() < EPS);

        // Target on top of the pose
        assert!(calc_curvature(&pose.position_m, &pose).is_finite());
    }
}
