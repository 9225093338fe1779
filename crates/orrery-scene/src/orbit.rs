//! Orbital transform engine.
//!
//! A body's world transform is its parent's transform followed by, in this
//! order: revolution about the parent's Y axis, translation out to the orbit
//! radius, axial tilt about X and spin about the tilted Y axis. The order is
//! significant; swapping any two steps changes where the body ends up.

use glam::{Mat4, Vec3};

use crate::error::SceneError;

/// Sense of a body's self-rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationDirection {
    #[default]
    Prograde,
    Retrograde,
}

impl RotationDirection {
    /// `+1.0` for prograde, `-1.0` for retrograde.
    pub fn sign(self) -> f32 {
        match self {
            RotationDirection::Prograde => 1.0,
            RotationDirection::Retrograde => -1.0,
        }
    }
}

impl TryFrom<f32> for RotationDirection {
    type Error = SceneError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        if value == 1.0 {
            Ok(RotationDirection::Prograde)
        } else if value == -1.0 {
            Ok(RotationDirection::Retrograde)
        } else {
            Err(SceneError::InvalidRotationDirection(value))
        }
    }
}

/// Time-varying motion of one body relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrbitalParams {
    /// Distance from the parent, scene units.
    pub orbit_radius: f32,
    /// Revolution speed, degrees per simulated day.
    pub orbit_speed: f32,
    /// Spin speed, degrees per simulated day.
    pub rotation_speed: f32,
    pub rotation_direction: RotationDirection,
    /// Axial tilt, degrees.
    pub axis_tilt: f32,
}

impl OrbitalParams {
    /// Revolution angle in radians after `day` simulated days.
    pub fn orbit_angle(&self, day: f64) -> f32 {
        degrees_at(day, self.orbit_speed as f64).to_radians()
    }

    /// Spin angle in radians after `day` simulated days, signed by direction.
    pub fn spin_angle(&self, day: f64) -> f32 {
        let rate = self.rotation_speed as f64 * self.rotation_direction.sign() as f64;
        degrees_at(day, rate).to_radians()
    }
}

/// `day * rate` wrapped into `[0, 360)` before narrowing to `f32`, so the
/// angle keeps its precision after long runs.
fn degrees_at(day: f64, degrees_per_day: f64) -> f32 {
    (day * degrees_per_day).rem_euclid(360.0) as f32
}

/// World transform of a body at `simulation_day`.
///
/// `parent_transform` is the parent's full world transform (including its
/// spin), or [`Mat4::IDENTITY`] for a root body. A zero orbit radius is not
/// special-cased: the star still revolves around itself and spins.
pub fn compute_world_transform(
    params: &OrbitalParams,
    simulation_day: f64,
    parent_transform: Mat4,
) -> Mat4 {
    parent_transform
        * Mat4::from_rotation_y(params.orbit_angle(simulation_day))
        * Mat4::from_translation(Vec3::X * params.orbit_radius)
        * Mat4::from_rotation_x(params.axis_tilt.to_radians())
        * Mat4::from_rotation_y(params.spin_angle(simulation_day))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn earth() -> OrbitalParams {
        OrbitalParams {
            orbit_radius: 1.0,
            orbit_speed: 15.8,
            rotation_speed: 36.5,
            rotation_direction: RotationDirection::Prograde,
            axis_tilt: 23.44,
        }
    }

    fn moon() -> OrbitalParams {
        OrbitalParams {
            orbit_radius: 0.3,
            orbit_speed: 13.0,
            rotation_speed: 0.0,
            rotation_direction: RotationDirection::Prograde,
            axis_tilt: 6.68,
        }
    }

    #[test]
    fn test_stationary_body_at_day_zero_is_identity() {
        let params = OrbitalParams {
            rotation_speed: 10.0,
            ..Default::default()
        };
        let m = compute_world_transform(&params, 0.0, Mat4::IDENTITY);
        assert!(m.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn test_zero_radius_body_only_spins() {
        let params = OrbitalParams {
            rotation_speed: 10.0,
            ..Default::default()
        };
        let m = compute_world_transform(&params, 4.5, Mat4::IDENTITY);
        assert!(m.w_axis.truncate().abs_diff_eq(Vec3::ZERO, 1e-6));
        let expected = Mat4::from_rotation_y(45f32.to_radians());
        assert!(m.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn test_earth_stays_on_orbit() {
        let m = compute_world_transform(&earth(), 36.0, Mat4::IDENTITY);
        let distance = m.w_axis.truncate().length();
        assert!((distance - 1.0).abs() < 1e-5, "distance {distance}");
        // Orbit lies in the XZ plane.
        assert!(m.w_axis.y.abs() < 1e-6);
    }

    #[test]
    fn test_explicit_composition_order() {
        let day = 36.0;
        let parent = compute_world_transform(&earth(), day, Mat4::IDENTITY);
        let m = moon();
        let expected = parent
            * Mat4::from_rotation_y((13.0f32 * 36.0).to_radians())
            * Mat4::from_translation(Vec3::new(0.3, 0.0, 0.0))
            * Mat4::from_rotation_x(6.68f32.to_radians())
            * Mat4::from_rotation_y(0.0);
        let actual = compute_world_transform(&m, day, parent);
        assert!(actual.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn test_satellite_inherits_parent_spin() {
        // A moon is parented to the planet's full transform, so it sits at
        // orbit_radius from the planet centre in the planet's tilted frame.
        let day = 12.0;
        let planet = compute_world_transform(&earth(), day, Mat4::IDENTITY);
        let sat = compute_world_transform(&moon(), day, planet);
        let offset = sat.w_axis.truncate() - planet.w_axis.truncate();
        assert!((offset.length() - 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_order_matters() {
        let p = earth();
        let day = 3.0;
        let swapped = Mat4::from_translation(Vec3::X * p.orbit_radius)
            * Mat4::from_rotation_y(p.orbit_angle(day))
            * Mat4::from_rotation_x(p.axis_tilt.to_radians())
            * Mat4::from_rotation_y(p.spin_angle(day));
        let actual = compute_world_transform(&p, day, Mat4::IDENTITY);
        assert!(!actual.abs_diff_eq(swapped, 1e-3));
    }

    #[test]
    fn test_retrograde_spins_backwards() {
        let prograde = OrbitalParams {
            rotation_speed: 22.5,
            ..Default::default()
        };
        let retrograde = OrbitalParams {
            rotation_direction: RotationDirection::Retrograde,
            ..prograde
        };
        assert!((prograde.spin_angle(2.0) - 45f32.to_radians()).abs() < 1e-6);
        assert!((retrograde.spin_angle(2.0) - 315f32.to_radians()).abs() < 1e-5);
    }

    #[test]
    fn test_angles_wrap_for_long_runs() {
        let p = earth();
        let early = compute_world_transform(&p, 1.0, Mat4::IDENTITY);
        // After 3600 days both 15.8 and 36.5 deg/day complete whole turns.
        let period = 3600.0;
        let late = compute_world_transform(&p, 1.0 + period, Mat4::IDENTITY);
        assert!(early.abs_diff_eq(late, 1e-4));
    }

    #[test]
    fn test_rotation_direction_from_sign() {
        assert_eq!(
            RotationDirection::try_from(-1.0),
            Ok(RotationDirection::Retrograde)
        );
        assert_eq!(
            RotationDirection::try_from(1.0),
            Ok(RotationDirection::Prograde)
        );
        assert_eq!(
            RotationDirection::try_from(0.5),
            Err(SceneError::InvalidRotationDirection(0.5))
        );
    }
}
