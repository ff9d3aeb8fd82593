use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::utils::math::{rotate, safe_inverse};

/// Position and orientation of a body in the plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    pub position: Vec2,
    /// Counter-clockwise rotation in radians.
    pub rotation: f32,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
        }
    }
}

impl Transform2D {
    pub fn new(position: Vec2, rotation: f32) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec2) -> Self {
        Self::new(position, 0.0)
    }

    /// Maps a body-local point into world space.
    pub fn transform_point(&self, local: Vec2) -> Vec2 {
        self.position + rotate(local, self.rotation)
    }

    /// Maps a world point into body-local space.
    pub fn inverse_transform_point(&self, world: Vec2) -> Vec2 {
        rotate(world - self.position, -self.rotation)
    }

    /// Rotates a body-local direction (or lever arm) into world orientation.
    pub fn transform_vector(&self, local: Vec2) -> Vec2 {
        rotate(local, self.rotation)
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }
}

/// Linear and angular velocity of a body in the plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity2D {
    pub linear: Vec2,
    pub angular: f32,
}

impl Default for Velocity2D {
    fn default() -> Self {
        Self {
            linear: Vec2::ZERO,
            angular: 0.0,
        }
    }
}

/// Mass and rotational inertia about the center of mass.
///
/// A zero mass (or inertia) means the body is immovable along that
/// degree of freedom; its inverse is reported as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassProperties {
    pub mass: f32,
    pub inertia: f32,
}

impl Default for MassProperties {
    fn default() -> Self {
        Self {
            mass: 1.0,
            inertia: 1.0,
        }
    }
}

impl MassProperties {
    pub fn new(mass: f32, inertia: f32) -> Self {
        Self { mass, inertia }
    }

    /// Immovable in both translation and rotation.
    pub fn infinite() -> Self {
        Self {
            mass: 0.0,
            inertia: 0.0,
        }
    }

    pub fn for_solid_box(half_extents: Vec2, mass: f32) -> Self {
        let w = half_extents.x * 2.0;
        let h = half_extents.y * 2.0;
        Self::new(mass, mass * (w * w + h * h) / 12.0)
    }

    pub fn for_solid_disk(radius: f32, mass: f32) -> Self {
        Self::new(mass, 0.5 * mass * radius * radius)
    }

    pub fn inverse_mass(&self) -> f32 {
        safe_inverse(self.mass)
    }

    pub fn inverse_inertia(&self) -> f32 {
        safe_inverse(self.inertia)
    }

    pub fn is_infinite(&self) -> bool {
        self.inverse_mass() == 0.0 && self.inverse_inertia() == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn local_world_round_trip_under_rotation() {
        let transform = Transform2D::new(Vec2::new(2.0, -1.0), 0.7);
        let world = Vec2::new(3.5, 4.0);
        let local = transform.inverse_transform_point(world);
        let back = transform.transform_point(local);
        assert_abs_diff_eq!(back.x, world.x, epsilon = 1e-5);
        assert_abs_diff_eq!(back.y, world.y, epsilon = 1e-5);
    }

    #[test]
    fn zero_mass_reports_zero_inverse() {
        let props = MassProperties::infinite();
        assert_eq!(props.inverse_mass(), 0.0);
        assert_eq!(props.inverse_inertia(), 0.0);
        assert!(props.is_infinite());
        assert!(!MassProperties::default().is_infinite());
    }

    #[test]
    fn disk_and_box_inertia() {
        assert_abs_diff_eq!(MassProperties::for_solid_disk(2.0, 3.0).inertia, 6.0);
        let boxed = MassProperties::for_solid_box(Vec2::new(0.5, 1.0), 12.0);
        assert_abs_diff_eq!(boxed.inertia, 5.0);
    }
}
