//! Look-at orientation in the host's yaw/pitch convention

use crate::core::types::DVec3;

/// Orientation in degrees.
///
/// Yaw 0 looks toward +Z and -90 toward +X. Negative pitch looks up.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Facing {
    pub yaw: f32,
    pub pitch: f32,
}

impl Facing {
    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self { yaw, pitch }
    }

    /// Orientation for an observer at `from` looking at `target`.
    ///
    /// When both points share X and Z the pitch is clamped to straight up or down
    /// (or level if the points coincide).
    pub fn looking_at(from: DVec3, target: DVec3) -> Self {
        let delta = target - from;
        let (dx, dy, dz) = (delta.x, delta.y, delta.z);

        let yaw = if dx != 0.0 {
            let base = if dx < 0.0 {
                1.5 * std::f64::consts::PI
            } else {
                0.5 * std::f64::consts::PI
            };
            base - (dz / dx).atan()
        } else if dz < 0.0 {
            std::f64::consts::PI
        } else {
            0.0
        };

        let horizontal = (dx * dx + dz * dz).sqrt();
        let pitch = if horizontal > 0.0 {
            -(dy / horizontal).atan()
        } else if dy > 0.0 {
            -std::f64::consts::FRAC_PI_2
        } else if dy < 0.0 {
            std::f64::consts::FRAC_PI_2
        } else {
            0.0
        };

        Self {
            yaw: (-yaw.to_degrees()) as f32,
            pitch: pitch.to_degrees() as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_cardinal_yaw() {
        let origin = DVec3::ZERO;
        assert!(approx(Facing::looking_at(origin, DVec3::new(10.0, 0.0, 0.0)).yaw, -90.0));
        assert!(approx(Facing::looking_at(origin, DVec3::new(-10.0, 0.0, 0.0)).yaw, -270.0));
        assert!(approx(Facing::looking_at(origin, DVec3::new(0.0, 0.0, 10.0)).yaw, 0.0));
        assert!(approx(Facing::looking_at(origin, DVec3::new(0.0, 0.0, -10.0)).yaw, -180.0));
    }

    #[test]
    fn test_diagonal_yaw() {
        let facing = Facing::looking_at(DVec3::ZERO, DVec3::new(5.0, 0.0, 5.0));
        assert!(approx(facing.yaw, -45.0));
    }

    #[test]
    fn test_pitch_up_and_level() {
        let up = Facing::looking_at(DVec3::ZERO, DVec3::new(10.0, 10.0, 0.0));
        assert!(approx(up.pitch, -45.0));

        let level = Facing::looking_at(DVec3::ZERO, DVec3::new(3.0, 0.0, -4.0));
        assert!(approx(level.pitch, 0.0));
    }

    #[test]
    fn test_zero_horizontal_distance_clamps() {
        let above = Facing::looking_at(DVec3::ZERO, DVec3::new(0.0, 5.0, 0.0));
        assert!(approx(above.pitch, -90.0));

        let below = Facing::looking_at(DVec3::ZERO, DVec3::new(0.0, -5.0, 0.0));
        assert!(approx(below.pitch, 90.0));

        let same = Facing::looking_at(DVec3::ONE, DVec3::ONE);
        assert!(!same.pitch.is_nan() && !same.yaw.is_nan());
        assert_eq!(same.pitch, 0.0);
    }
}
