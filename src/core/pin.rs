//! Soft point constraint pulling one body anchor toward a world target.

use std::any::Any;
use std::f32::consts::TAU;
use std::fmt;
use std::marker::PhantomData;

use glam::{Mat2, Vec2};
use log::{debug, warn};

use super::body::{BodySet, PhysicsBody};
use super::error::{JointError, JointResult};
use super::joint::{Joint, JointCore, JointType, SingleBodyJoint};
use super::rigidbody::RigidBody;
use crate::config::Settings;
use crate::dynamics::step::TimeStep;
use crate::utils::{allocator::EntityId, math::cross_scalar, math::safe_inverse};

pub const DEFAULT_FREQUENCY: f32 = 8.0;
pub const DEFAULT_DAMPING_RATIO: f32 = 0.3;
pub const DEFAULT_MAXIMUM_FORCE: f32 = 1000.0;

/// Spring-like pin between a body anchor and a movable world target.
pub struct PinJoint<B: PhysicsBody = RigidBody> {
    base: SingleBodyJoint,
    local_anchor: Vec2,
    target: Vec2,
    frequency: f32,
    damping_ratio: f32,
    maximum_force: f32,
    r: Vec2,
    gamma: f32,
    bias: Vec2,
    effective_mass: Mat2,
    impulse: Vec2,
    _body: PhantomData<fn() -> B>,
}

impl<B: PhysicsBody> fmt::Debug for PinJoint<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinJoint")
            .field("body", &self.base.body())
            .field("target", &self.target)
            .field("frequency", &self.frequency)
            .field("damping_ratio", &self.damping_ratio)
            .field("maximum_force", &self.maximum_force)
            .field("impulse", &self.impulse)
            .finish()
    }
}

impl<B: PhysicsBody> PinJoint<B> {
    /// Pins the world point `anchor` on `body`. The target starts at the anchor.
    pub fn new(bodies: &BodySet, body: EntityId, anchor: Vec2) -> JointResult<Self> {
        let base = SingleBodyJoint::new(body)?;
        if !anchor.is_finite() {
            return Err(JointError::invalid_argument(format!(
                "pin anchor must be finite, got {anchor}"
            )));
        }
        let resolved = bodies.resolve_as::<B>(body)?;
        if resolved.inverse_mass() == 0.0 {
            warn!("pin joint on immovable body {body} will have no effect");
        }
        debug!("pin joint created on {body} at {anchor}");

        Ok(Self {
            base,
            local_anchor: resolved.local_point(anchor),
            target: anchor,
            frequency: DEFAULT_FREQUENCY,
            damping_ratio: DEFAULT_DAMPING_RATIO,
            maximum_force: DEFAULT_MAXIMUM_FORCE,
            r: Vec2::ZERO,
            gamma: 0.0,
            bias: Vec2::ZERO,
            effective_mass: Mat2::ZERO,
            impulse: Vec2::ZERO,
            _body: PhantomData,
        })
    }

    pub fn body(&self) -> EntityId {
        self.base.body()
    }

    pub fn local_anchor(&self) -> Vec2 {
        self.local_anchor
    }

    pub fn anchor(&self, bodies: &BodySet) -> JointResult<Vec2> {
        Ok(bodies.resolve(self.body())?.world_point(self.local_anchor))
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    pub fn set_target(&mut self, bodies: &mut BodySet, target: Vec2) -> JointResult<()> {
        if !target.is_finite() {
            return Err(JointError::invalid_argument(format!(
                "pin target must be finite, got {target}"
            )));
        }
        if target != self.target {
            self.target = target;
            self.wake_body(bodies);
        }
        Ok(())
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn set_frequency(&mut self, bodies: &mut BodySet, frequency: f32) -> JointResult<()> {
        if !(frequency > 0.0) || !frequency.is_finite() {
            return Err(JointError::invalid_argument(format!(
                "pin frequency must be positive, got {frequency}"
            )));
        }
        if frequency != self.frequency {
            self.frequency = frequency;
            self.wake_body(bodies);
        }
        Ok(())
    }

    pub fn damping_ratio(&self) -> f32 {
        self.damping_ratio
    }

    pub fn set_damping_ratio(&mut self, bodies: &mut BodySet, ratio: f32) -> JointResult<()> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(JointError::invalid_argument(format!(
                "pin damping ratio must be within [0, 1], got {ratio}"
            )));
        }
        if ratio != self.damping_ratio {
            self.damping_ratio = ratio;
            self.wake_body(bodies);
        }
        Ok(())
    }

    pub fn maximum_force(&self) -> f32 {
        self.maximum_force
    }

    pub fn set_maximum_force(&mut self, bodies: &mut BodySet, force: f32) -> JointResult<()> {
        if !(force >= 0.0) || !force.is_finite() {
            return Err(JointError::invalid_argument(format!(
                "pin maximum force must be non-negative, got {force}"
            )));
        }
        if force != self.maximum_force {
            self.maximum_force = force;
            self.wake_body(bodies);
        }
        Ok(())
    }

    pub fn impulse(&self) -> Vec2 {
        self.impulse
    }

    pub fn copy(&self, bodies: &BodySet) -> JointResult<Self> {
        self.copy_with(bodies, None)
    }

    /// Copy optionally bound to another body of type `B`, without owner or user data.
    pub fn copy_with(&self, bodies: &BodySet, body: Option<EntityId>) -> JointResult<Self> {
        let base = self.base.with_body(body)?;
        bodies.resolve_as::<B>(base.body())?;

        Ok(Self {
            base,
            local_anchor: self.local_anchor,
            target: self.target,
            frequency: self.frequency,
            damping_ratio: self.damping_ratio,
            maximum_force: self.maximum_force,
            r: self.r,
            gamma: self.gamma,
            bias: self.bias,
            effective_mass: self.effective_mass,
            impulse: self.impulse,
            _body: PhantomData,
        })
    }

    fn wake_body(&self, bodies: &mut BodySet) {
        if let Some(body) = bodies.get_mut(self.body()) {
            body.wake_up();
        }
    }
}

impl<B: PhysicsBody> Joint for PinJoint<B> {
    fn joint_type(&self) -> JointType {
        JointType::Pin
    }

    fn core(&self) -> &JointCore {
        self.base.core()
    }

    fn core_mut(&mut self) -> &mut JointCore {
        self.base.core_mut()
    }

    fn bodies(&self) -> &[EntityId] {
        self.base.bodies()
    }

    fn initialize_constraints(
        &mut self,
        step: &TimeStep,
        settings: &Settings,
        bodies: &mut BodySet,
    ) {
        let Some(body) = bodies.get_mut(self.body()) else {
            warn!("pin joint skipped: body {} is gone", self.body());
            return;
        };

        let transform = body.transform();
        let mass = body.mass_properties().mass;
        let inv_mass = body.inverse_mass();
        let inv_inertia = body.inverse_inertia();
        self.r = transform.transform_vector(self.local_anchor);

        if inv_mass == 0.0 {
            self.effective_mass = Mat2::ZERO;
            self.impulse = Vec2::ZERO;
            return;
        }

        // spring and damper equivalent to the requested frequency and ratio
        let omega = TAU * self.frequency;
        let damping = 2.0 * mass * self.damping_ratio * omega;
        let stiffness = mass * omega * omega;
        let dt = step.dt;
        self.gamma = safe_inverse(dt * (damping + dt * stiffness));
        let beta = dt * stiffness * self.gamma;

        let r = self.r;
        let k11 = inv_mass + inv_inertia * r.y * r.y + self.gamma;
        let k12 = -inv_inertia * r.x * r.y;
        let k22 = inv_mass + inv_inertia * r.x * r.x + self.gamma;
        let k = Mat2::from_cols(Vec2::new(k11, k12), Vec2::new(k12, k22));
        self.effective_mass = if k.determinant().abs() > f32::EPSILON {
            k.inverse()
        } else {
            Mat2::ZERO
        };

        self.bias = (transform.position + r - self.target) * beta;

        if settings.warm_starting {
            self.impulse *= step.dt_ratio;
            body.apply_impulse(self.impulse, r);
        } else {
            self.impulse = Vec2::ZERO;
        }
    }

    fn solve_velocity_constraints(
        &mut self,
        step: &TimeStep,
        _settings: &Settings,
        bodies: &mut BodySet,
    ) {
        let Some(body) = bodies.get_mut(self.body()) else {
            return;
        };
        if body.inverse_mass() == 0.0 {
            return;
        }

        let velocity = body.velocity();
        let c_dot = velocity.linear + cross_scalar(velocity.angular, self.r);
        let delta = self.effective_mass * -(c_dot + self.bias + self.impulse * self.gamma);

        let previous = self.impulse;
        self.impulse += delta;
        let max_impulse = self.maximum_force * step.dt;
        if self.impulse.length_squared() > max_impulse * max_impulse {
            self.impulse = self.impulse.normalize_or_zero() * max_impulse;
        }

        body.apply_impulse(self.impulse - previous, self.r);
    }

    fn solve_position_constraints(
        &mut self,
        _step: &TimeStep,
        _settings: &Settings,
        _bodies: &mut BodySet,
    ) -> bool {
        // soft constraint: drift is handled through the velocity bias
        true
    }

    fn shift(&mut self, delta: Vec2) {
        self.target += delta;
    }

    fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        self.impulse * inv_dt
    }

    fn reaction_torque(&self, _inv_dt: f32) -> f32 {
        0.0
    }

    fn clone_remapped(
        &self,
        bodies: &BodySet,
        remap: &dyn Fn(EntityId) -> EntityId,
    ) -> JointResult<Box<dyn Joint>> {
        Ok(Box::new(self.copy_with(bodies, Some(remap(self.body())))?))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn force_is_capped_per_step() {
        let mut bodies = BodySet::new();
        let id = bodies.insert(RigidBody::new(Vec2::ZERO));
        let mut joint = PinJoint::<RigidBody>::new(&bodies, id, Vec2::ZERO).unwrap();
        joint.set_target(&mut bodies, Vec2::new(100.0, 0.0)).unwrap();
        joint.set_maximum_force(&mut bodies, 6.0).unwrap();

        let step = TimeStep::new(0.5);
        let settings = Settings::default();
        joint.initialize_constraints(&step, &settings, &mut bodies);
        for _ in 0..settings.velocity_iterations {
            joint.solve_velocity_constraints(&step, &settings, &mut bodies);
        }

        assert_abs_diff_eq!(joint.impulse().length(), 3.0, epsilon = 1e-4);
        let velocity = bodies.get(id).unwrap().velocity().linear;
        assert_abs_diff_eq!(velocity.x, 3.0, epsilon = 1e-4);
        assert_abs_diff_eq!(velocity.y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn setters_validate_and_wake() {
        let mut bodies = BodySet::new();
        let id = bodies.insert(RigidBody {
            is_at_rest: true,
            ..RigidBody::new(Vec2::ZERO)
        });
        let mut joint = PinJoint::<RigidBody>::new(&bodies, id, Vec2::ZERO).unwrap();

        assert!(joint.set_frequency(&mut bodies, 0.0).is_err());
        assert!(joint.set_damping_ratio(&mut bodies, 1.5).is_err());
        assert!(joint.set_maximum_force(&mut bodies, -1.0).is_err());
        assert!(joint.set_target(&mut bodies, Vec2::NAN).is_err());
        assert!(bodies.get(id).unwrap().is_at_rest());

        joint.set_frequency(&mut bodies, DEFAULT_FREQUENCY).unwrap();
        assert!(bodies.get(id).unwrap().is_at_rest());

        joint.set_frequency(&mut bodies, 2.0).unwrap();
        assert!(!bodies.get(id).unwrap().is_at_rest());
    }
}
