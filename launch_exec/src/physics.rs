//! # Launch physics
//!
//! Converts the two sensor trigger times into the car's speed, and the speed and ramp angle into
//! a landing distance assuming a projectile launched from and landing at the same height.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;
use util::maths;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Breakdown of a projectile landing calculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Landing {
    /// Units: meters/second
    pub vx_ms: f64,

    /// Units: meters/second
    pub vy_ms: f64,

    /// Units: seconds
    pub flight_time_s: f64,

    /// Horizontal distance from the launch point.
    ///
    /// Units: meters
    pub distance_m: f64,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Speed of the car between the two sensors.
///
/// Returns exactly `0.0` if `t2` is not after `t1`, which is the case when the car has not been
/// detected.
pub fn calc_speed(sensor_spacing_m: f64, t1: f64, t2: f64) -> f64 {
    if t2 > t1 {
        sensor_spacing_m / (t2 - t1)
    }
    else {
        0.0
    }
}

/// Landing point of a projectile launched at `speed_ms` and `angle_deg` above horizontal.
pub fn calc_landing(speed_ms: f64, angle_deg: f64, gravity_mss: f64) -> Landing {
    let angle_rad = angle_deg.to_radians();
    let vx_ms = speed_ms * angle_rad.cos();
    let vy_ms = speed_ms * angle_rad.sin();
    let flight_time_s = 2.0 * vy_ms / gravity_mss;

    Landing {
        vx_ms,
        vy_ms,
        flight_time_s,
        distance_m: vx_ms * flight_time_s
    }
}

/// Constrain a landing distance to the catcher's rail.
pub fn clamp_to_rail(distance_m: f64, rail_length_m: f64) -> f64 {
    maths::clamp(distance_m, 0.0, rail_length_m)
}

#[cfg(test)]
mod test {
    use super::*;

    const G: f64 = 9.81;

    #[test]
    fn test_speed_not_increasing() {
        assert_eq!(calc_speed(0.1, 0.5, 0.5), 0.0);
        assert_eq!(calc_speed(0.1, 0.7, 0.2), 0.0);
        assert_eq!(calc_speed(0.1, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_speed() {
        assert!((calc_speed(0.1, 0.0, 0.1) - 1.0).abs() < 1e-12);
        assert!((calc_speed(0.1, 1.0, 1.05) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_landing_45_deg() {
        let landing = calc_landing(1.0, 45.0, G);

        assert!((landing.vx_ms - 0.7071).abs() < 1e-4);
        assert!((landing.vy_ms - 0.7071).abs() < 1e-4);
        assert!((landing.flight_time_s - 0.1442).abs() < 1e-4);
        assert!((landing.distance_m - 0.1019).abs() < 1e-4);
    }

    #[test]
    fn test_landing_flat() {
        for speed in [0.5, 1.0, 10.0].iter() {
            let landing = calc_landing(*speed, 0.0, G);
            assert_eq!(landing.vy_ms, 0.0);
            assert_eq!(landing.flight_time_s, 0.0);
            assert_eq!(landing.distance_m, 0.0);
        }
    }

    #[test]
    fn test_landing_vertical() {
        for speed in [0.5, 1.0, 10.0].iter() {
            let landing = calc_landing(*speed, 90.0, G);
            assert!(landing.vx_ms.abs() < 1e-12);
            assert!(landing.distance_m.abs() < 1e-12);
        }
    }

    #[test]
    fn test_landing_scales_with_speed_squared() {
        let base = calc_landing(1.0, 30.0, G).distance_m;
        let double = calc_landing(2.0, 30.0, G).distance_m;
        let triple = calc_landing(3.0, 30.0, G).distance_m;

        assert!((double - 4.0 * base).abs() < 1e-12);
        assert!((triple - 9.0 * base).abs() < 1e-12);
    }

    #[test]
    fn test_clamp_to_rail() {
        assert_eq!(clamp_to_rail(1.7, 1.0), 1.0);
        assert_eq!(clamp_to_rail(-0.1, 1.0), 0.0);
        assert_eq!(clamp_to_rail(0.42, 1.0), 0.42);
    }
}
