//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::{Float, FloatConst};

/// Normalise an angle into the range (-pi, pi].
///
/// Angles exactly on -pi are mapped onto +pi so that the boundary is only ever represented once.
pub fn normalise_angle<T>(angle: T) -> T
where
    T: Float + FloatConst,
{
    let pi_t = T::PI();
    let tau_t = pi_t + pi_t;

    // Non-finite values can't be wrapped, the loops below would never exit
    if !angle.is_finite() {
        return angle;
    }

    let mut res = angle;
    while res > pi_t {
        res = res - tau_t;
    }
    while res <= -pi_t {
        res = res + tau_t;
    }

    res
}

/// Get the signed shortest angular distance from `a` to `b`, in the range (-pi, pi].
pub fn ang_dist<T>(a: T, b: T) -> T
where
    T: Float + FloatConst,
{
    normalise_angle(b - a)
}

/// Clamp a value between the given limits.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: PartialOrd,
{
    if value > max {
        max
    } else if value < min {
        min
    } else {
        value
    }
}

/// Convert degrees into radians.
pub fn deg2rad<T>(deg: T) -> T
where
    T: Float,
{
    deg.to_radians()
}

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;
    const TAU: f64 = std::f64::consts::TAU;

    #[test]
    fn test_normalise_angle() {
        assert_eq!(normalise_angle(0f64), 0f64);
        assert_eq!(normalise_angle(PI), PI);
        assert_eq!(normalise_angle(-PI), PI);
        assert!((normalise_angle(TAU + 1f64) - 1f64).abs() < 1e-12);
        assert!((normalise_angle(-TAU - 1f64) + 1f64).abs() < 1e-12);
        assert!((normalise_angle(3f64 * PI / 2f64) + PI / 2f64).abs() < 1e-12);
        assert!(normalise_angle(f64::NAN).is_nan());
    }

    #[test]
    fn test_ang_dist() {
        assert!((ang_dist(1f64, 2f64) - 1f64).abs() < 1e-12);
        assert!((ang_dist(2f64, 1f64) + 1f64).abs() < 1e-12);
        assert!((ang_dist(PI - 0.1, -PI + 0.1) - 0.2).abs() < 1e-12);
        assert!((ang_dist(0f64, PI) - PI).abs() < 1e-12);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5, 0, 3), 3);
        assert_eq!(clamp(-5, 0, 3), 0);
        assert_eq!(clamp(1.5f64, 0f64, 3f64), 1.5f64);
    }
}
