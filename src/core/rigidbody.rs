use std::any::Any;

use super::body::PhysicsBody;
use super::types::{MassProperties, Transform2D, Velocity2D};
use glam::Vec2;

/// Stock 2D rigid body storing kinematic state and mass properties.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub transform: Transform2D,
    pub velocity: Velocity2D,
    pub mass_properties: MassProperties,
    pub gravity_scale: f32,
    pub is_enabled: bool,
    pub is_at_rest: bool,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            transform: Transform2D::default(),
            velocity: Velocity2D::default(),
            mass_properties: MassProperties::default(),
            gravity_scale: 1.0,
            is_enabled: true,
            is_at_rest: false,
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }
}

impl RigidBody {
    pub fn new(position: Vec2) -> Self {
        Self {
            transform: Transform2D::from_position(position),
            ..Self::default()
        }
    }

    /// Immovable body at `position`.
    pub fn fixed(position: Vec2) -> Self {
        Self {
            mass_properties: MassProperties::infinite(),
            ..Self::new(position)
        }
    }

    pub fn with_mass(mut self, props: MassProperties) -> Self {
        self.mass_properties = props;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.transform.rotation = rotation;
        self
    }

    pub fn with_velocity(mut self, linear: Vec2) -> Self {
        self.velocity.linear = linear;
        self
    }

    pub fn is_static(&self) -> bool {
        self.mass_properties.is_infinite()
    }
}

impl PhysicsBody for RigidBody {
    fn mass_properties(&self) -> MassProperties {
        self.mass_properties
    }

    fn transform(&self) -> Transform2D {
        self.transform
    }

    fn set_transform(&mut self, transform: Transform2D) {
        self.transform = transform;
    }

    fn velocity(&self) -> Velocity2D {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Velocity2D) {
        self.velocity = velocity;
    }

    fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    fn gravity_scale(&self) -> f32 {
        self.gravity_scale
    }

    fn damping(&self) -> (f32, f32) {
        (self.linear_damping, self.angular_damping)
    }

    fn is_at_rest(&self) -> bool {
        self.is_at_rest
    }

    fn set_at_rest(&mut self, at_rest: bool) {
        self.is_at_rest = at_rest;
    }

    fn clone_body(&self) -> Box<dyn PhysicsBody> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
