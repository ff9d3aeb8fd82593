use glam::Vec2;

use crate::core::body::{BodySet, PhysicsBody};

/// Semi-implicit Euler integrator for planar bodies.
#[derive(Debug, Clone)]
pub struct Integrator {
    pub gravity: Vec2,
}

impl Integrator {
    pub fn new(gravity: Vec2) -> Self {
        Self { gravity }
    }

    fn is_simulated(body: &dyn PhysicsBody) -> bool {
        body.is_enabled() && !body.is_at_rest()
    }

    pub fn integrate_velocity(&self, body: &mut dyn PhysicsBody, dt: f32) {
        if !Self::is_simulated(body) || body.inverse_mass() == 0.0 {
            return;
        }

        let mut velocity = body.velocity();
        velocity.linear += self.gravity * body.gravity_scale() * dt;

        let (linear_damping, angular_damping) = body.damping();
        velocity.linear *= (1.0 - linear_damping * dt).max(0.0);
        velocity.angular *= (1.0 - angular_damping * dt).max(0.0);

        body.set_velocity(velocity);
    }

    pub fn integrate_position(&self, body: &mut dyn PhysicsBody, dt: f32) {
        if !Self::is_simulated(body) {
            return;
        }

        let velocity = body.velocity();
        let mut transform = body.transform();
        transform.position += velocity.linear * dt;
        transform.rotation += velocity.angular * dt;
        body.set_transform(transform);
    }

    pub fn integrate_velocities(&self, bodies: &mut BodySet, dt: f32) {
        for (_, body) in bodies.iter_mut() {
            self.integrate_velocity(body, dt);
        }
    }

    pub fn integrate_positions(&self, bodies: &mut BodySet, dt: f32) {
        for (_, body) in bodies.iter_mut() {
            self.integrate_position(body, dt);
        }
    }
}
