//! Rope-and-pulley constraint between two bodies.
//!
//! Each body hangs from its own fixed pulley point. The rope is taut once the
//! segment sum `l1 + l2` reaches the joint's length. Tension acts on body 1
//! at full strength and on body 2 scaled by `1 / ratio`. With slack enabled
//! the rope only pulls, and only once it is taut. With slack disabled the
//! segment sum is held at exactly the length.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use glam::Vec2;
use log::{debug, trace, warn};

use super::body::{BodySet, PhysicsBody};
use super::error::{JointError, JointResult};
use super::joint::{Joint, JointCore, JointType, TwoBodyJoint};
use super::rigidbody::RigidBody;
use crate::config::Settings;
use crate::dynamics::step::TimeStep;
use crate::utils::{
    allocator::EntityId,
    math::{cross, cross_scalar, normalize_with_length},
};

/// Pulley joint over bodies of concrete type `B`.
pub struct PulleyJoint<B: PhysicsBody = RigidBody> {
    base: TwoBodyJoint,
    pulley_anchor1: Vec2,
    pulley_anchor2: Vec2,
    local_anchor1: Vec2,
    local_anchor2: Vec2,
    ratio: f32,
    length: f32,
    slack_enabled: bool,
    over_length: bool,
    // solver state, rebuilt by initialize_constraints
    r1: Vec2,
    r2: Vec2,
    n1: Vec2,
    n2: Vec2,
    inv_k: f32,
    impulse: f32,
    _body: PhantomData<fn() -> B>,
}

impl<B: PhysicsBody> fmt::Debug for PulleyJoint<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PulleyJoint")
            .field("body1", &self.base.body1())
            .field("body2", &self.base.body2())
            .field("pulley_anchor1", &self.pulley_anchor1)
            .field("pulley_anchor2", &self.pulley_anchor2)
            .field("ratio", &self.ratio)
            .field("length", &self.length)
            .field("slack_enabled", &self.slack_enabled)
            .field("over_length", &self.over_length)
            .field("impulse", &self.impulse)
            .finish()
    }
}

fn ensure_finite(name: &str, point: Vec2) -> JointResult<()> {
    if point.is_finite() {
        Ok(())
    } else {
        Err(JointError::invalid_argument(format!(
            "{name} must be finite, got {point}"
        )))
    }
}

impl<B: PhysicsBody> PulleyJoint<B> {
    /// Creates a pulley joint from world-space points.
    ///
    /// `anchor1`/`anchor2` are where the rope attaches to each body and are
    /// stored in body-local space. The initial length is the sum of both
    /// anchor-to-pulley distances, and the ratio starts at 1.
    pub fn new(
        bodies: &BodySet,
        body1: EntityId,
        body2: EntityId,
        pulley_anchor1: Vec2,
        pulley_anchor2: Vec2,
        anchor1: Vec2,
        anchor2: Vec2,
    ) -> JointResult<Self> {
        let base = TwoBodyJoint::new(body1, body2)?;
        ensure_finite("pulley_anchor1", pulley_anchor1)?;
        ensure_finite("pulley_anchor2", pulley_anchor2)?;
        ensure_finite("anchor1", anchor1)?;
        ensure_finite("anchor2", anchor2)?;
        let b1 = bodies.resolve_as::<B>(body1)?;
        let b2 = bodies.resolve_as::<B>(body2)?;

        if b1.inverse_mass() == 0.0 && b2.inverse_mass() == 0.0 {
            warn!("pulley joint between {body1} and {body2}: both bodies are immovable");
        }

        let length = anchor1.distance(pulley_anchor1) + anchor2.distance(pulley_anchor2);
        debug!("pulley joint created between {body1} and {body2}, length {length:.4}");

        Ok(Self {
            base,
            pulley_anchor1,
            pulley_anchor2,
            local_anchor1: b1.local_point(anchor1),
            local_anchor2: b2.local_point(anchor2),
            ratio: 1.0,
            length,
            slack_enabled: false,
            over_length: false,
            r1: Vec2::ZERO,
            r2: Vec2::ZERO,
            n1: Vec2::ZERO,
            n2: Vec2::ZERO,
            inv_k: 0.0,
            impulse: 0.0,
            _body: PhantomData,
        })
    }

    pub fn body1(&self) -> EntityId {
        self.base.body1()
    }

    pub fn body2(&self) -> EntityId {
        self.base.body2()
    }

    pub fn other_body(&self, body: EntityId) -> Option<EntityId> {
        self.base.other_body(body)
    }

    pub fn pulley_anchor1(&self) -> Vec2 {
        self.pulley_anchor1
    }

    pub fn pulley_anchor2(&self) -> Vec2 {
        self.pulley_anchor2
    }

    pub fn local_anchor1(&self) -> Vec2 {
        self.local_anchor1
    }

    pub fn local_anchor2(&self) -> Vec2 {
        self.local_anchor2
    }

    /// World-space rope attachment on the first body.
    pub fn anchor1(&self, bodies: &BodySet) -> JointResult<Vec2> {
        Ok(bodies.resolve(self.body1())?.world_point(self.local_anchor1))
    }

    /// World-space rope attachment on the second body.
    pub fn anchor2(&self, bodies: &BodySet) -> JointResult<Vec2> {
        Ok(bodies.resolve(self.body2())?.world_point(self.local_anchor2))
    }

    /// Sum of both segment lengths for the bodies' present poses.
    pub fn current_length(&self, bodies: &BodySet) -> JointResult<f32> {
        let l1 = self.anchor1(bodies)?.distance(self.pulley_anchor1);
        let l2 = self.anchor2(bodies)?.distance(self.pulley_anchor2);
        Ok(l1 + l2)
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    /// Sets the mechanical advantage. Wakes both bodies if the value changes.
    pub fn set_ratio(&mut self, bodies: &mut BodySet, ratio: f32) -> JointResult<()> {
        if !(ratio > 0.0) || !ratio.is_finite() {
            return Err(JointError::invalid_argument(format!(
                "pulley ratio must be positive, got {ratio}"
            )));
        }
        if ratio != self.ratio {
            debug!("pulley ratio {} -> {ratio}", self.ratio);
            self.ratio = ratio;
            self.wake_bodies(bodies);
        }
        Ok(())
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    /// Sets the rope length budget. Wakes both bodies if the value changes.
    pub fn set_length(&mut self, bodies: &mut BodySet, length: f32) -> JointResult<()> {
        if !(length >= 0.0) || !length.is_finite() {
            return Err(JointError::invalid_argument(format!(
                "pulley length must be non-negative, got {length}"
            )));
        }
        if length != self.length {
            debug!("pulley length {} -> {length}", self.length);
            self.length = length;
            self.wake_bodies(bodies);
        }
        Ok(())
    }

    pub fn is_slack_enabled(&self) -> bool {
        self.slack_enabled
    }

    /// Lets the rope go slack when shorter than its length. Does not wake bodies.
    pub fn set_slack_enabled(&mut self, enabled: bool) {
        self.slack_enabled = enabled;
    }

    /// Whether the rope was taut at the last initialization.
    pub fn is_over_length(&self) -> bool {
        self.over_length
    }

    /// Accumulated rope tension impulse carried between steps.
    pub fn impulse(&self) -> f32 {
        self.impulse
    }

    /// `1 / K` from the last initialization. Zero when the joint is inert.
    pub fn inv_k(&self) -> f32 {
        self.inv_k
    }

    /// Unit directions from each anchor toward its pulley point.
    pub fn directions(&self) -> (Vec2, Vec2) {
        (self.n1, self.n2)
    }

    /// Copy bound to the same bodies, validated against `bodies`.
    pub fn copy(&self, bodies: &BodySet) -> JointResult<Self> {
        self.copy_with(bodies, None, None)
    }

    /// Copy with either body optionally replaced.
    ///
    /// A `None` slot keeps the original handle. Both resulting handles must
    /// resolve in `bodies` to a `B`. The copy has no owner or user data.
    pub fn copy_with(
        &self,
        bodies: &BodySet,
        body1: Option<EntityId>,
        body2: Option<EntityId>,
    ) -> JointResult<Self> {
        let base = self.base.with_bodies(body1, body2)?;
        bodies.resolve_as::<B>(base.body1())?;
        bodies.resolve_as::<B>(base.body2())?;

        Ok(Self {
            base,
            pulley_anchor1: self.pulley_anchor1,
            pulley_anchor2: self.pulley_anchor2,
            local_anchor1: self.local_anchor1,
            local_anchor2: self.local_anchor2,
            ratio: self.ratio,
            length: self.length,
            slack_enabled: self.slack_enabled,
            over_length: self.over_length,
            r1: self.r1,
            r2: self.r2,
            n1: self.n1,
            n2: self.n2,
            inv_k: self.inv_k,
            impulse: self.impulse,
            _body: PhantomData,
        })
    }

    /// Taut, or slack not allowed: the constraint transmits force.
    fn is_active(&self) -> bool {
        self.over_length || !self.slack_enabled
    }

    fn wake_bodies(&self, bodies: &mut BodySet) {
        for id in self.base.bodies() {
            if let Some(body) = bodies.get_mut(*id) {
                body.wake_up();
            }
        }
    }

    /// Refreshes lever arms and directions; returns the two segment lengths.
    fn update_geometry(
        &mut self,
        b1: &dyn PhysicsBody,
        b2: &dyn PhysicsBody,
        tolerance: f32,
    ) -> (f32, f32) {
        let t1 = b1.transform();
        let t2 = b2.transform();
        self.r1 = t1.transform_vector(self.local_anchor1);
        self.r2 = t2.transform_vector(self.local_anchor2);

        let (n1, l1) =
            normalize_with_length(self.pulley_anchor1 - (t1.position + self.r1), tolerance);
        let (n2, l2) =
            normalize_with_length(self.pulley_anchor2 - (t2.position + self.r2), tolerance);
        self.n1 = n1;
        self.n2 = n2;
        (l1, l2)
    }

    /// `kᵢ = 1/mᵢ + (rᵢ × nᵢ)² / Iᵢ` for each segment.
    fn segment_masses(&self, b1: &dyn PhysicsBody, b2: &dyn PhysicsBody) -> (f32, f32) {
        let rn1 = cross(self.r1, self.n1);
        let rn2 = cross(self.r2, self.n2);
        (
            b1.inverse_mass() + b1.inverse_inertia() * rn1 * rn1,
            b2.inverse_mass() + b2.inverse_inertia() * rn2 * rn2,
        )
    }

    /// `K = k1 + k2 / ratio²`, the inverse effective mass of the tension.
    fn constraint_mass(&self, b1: &dyn PhysicsBody, b2: &dyn PhysicsBody) -> f32 {
        let (k1, k2) = self.segment_masses(b1, b2);
        k1 + k2 / (self.ratio * self.ratio)
    }

    /// Change in `l1 + l2` per unit position impulse: `k1 + k2 / ratio`.
    fn correction_mass(&self, b1: &dyn PhysicsBody, b2: &dyn PhysicsBody) -> f32 {
        let (k1, k2) = self.segment_masses(b1, b2);
        k1 + k2 / self.ratio
    }

    fn apply_tension(&self, b1: &mut dyn PhysicsBody, b2: &mut dyn PhysicsBody, lambda: f32) {
        b1.apply_impulse(self.n1 * lambda, self.r1);
        b2.apply_impulse(self.n2 * (lambda / self.ratio), self.r2);
    }
}

impl<B: PhysicsBody> Joint for PulleyJoint<B> {
    fn joint_type(&self) -> JointType {
        JointType::Pulley
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
        let Some((b1, b2)) = bodies.get2_mut(self.body1(), self.body2()) else {
            warn!("pulley joint skipped: body {} or {} is gone", self.body1(), self.body2());
            return;
        };

        let (l1, l2) = self.update_geometry(b1, b2, settings.linear_tolerance);
        self.over_length = l1 + l2 >= self.length;

        if !self.is_active() {
            self.inv_k = 0.0;
            self.impulse = 0.0;
            return;
        }

        let k = self.constraint_mass(b1, b2);
        self.inv_k = if k > f32::EPSILON { 1.0 / k } else { 0.0 };

        if settings.warm_starting && self.inv_k > 0.0 {
            self.impulse *= step.dt_ratio;
            self.apply_tension(b1, b2, self.impulse);
        } else {
            self.impulse = 0.0;
        }
    }

    fn solve_velocity_constraints(
        &mut self,
        _step: &TimeStep,
        _settings: &Settings,
        bodies: &mut BodySet,
    ) {
        if !self.is_active() || self.inv_k == 0.0 {
            return;
        }
        let Some((b1, b2)) = bodies.get2_mut(self.body1(), self.body2()) else {
            return;
        };

        let v1 = b1.velocity();
        let v2 = b2.velocity();
        let vp1 = v1.linear + cross_scalar(v1.angular, self.r1);
        let vp2 = v2.linear + cross_scalar(v2.angular, self.r2);
        // stretch rate along the tension directions, segment 2 scaled by the ratio
        let c_dot = -self.n1.dot(vp1) - self.n2.dot(vp2) / self.ratio;

        let mut lambda = self.inv_k * c_dot;
        if self.slack_enabled {
            let previous = self.impulse;
            self.impulse = (previous + lambda).max(0.0);
            lambda = self.impulse - previous;
        } else {
            self.impulse += lambda;
        }

        self.apply_tension(b1, b2, lambda);
    }

    fn solve_position_constraints(
        &mut self,
        _step: &TimeStep,
        settings: &Settings,
        bodies: &mut BodySet,
    ) -> bool {
        if !self.is_active() {
            return true;
        }
        let Some((b1, b2)) = bodies.get2_mut(self.body1(), self.body2()) else {
            return true;
        };

        let (l1, l2) = self.update_geometry(b1, b2, settings.linear_tolerance);
        let c = l1 + l2 - self.length;
        if self.slack_enabled && c <= 0.0 {
            return true;
        }
        let linear_error = c.abs();

        let max = settings.max_linear_correction;
        let correction = if self.slack_enabled {
            // a pull-only rope keeps a little stretch so it is still taut next step
            let slop = 0.5 * settings.linear_tolerance;
            (c - slop).clamp(0.0, max)
        } else {
            c.clamp(-max, max)
        };

        let k = self.correction_mass(b1, b2);
        if k > f32::EPSILON && correction != 0.0 {
            let lambda = correction / k;
            b1.apply_position_impulse(self.n1 * lambda, self.r1);
            b2.apply_position_impulse(self.n2 * (lambda / self.ratio), self.r2);
        }

        trace!("pulley {}-{} position error {linear_error:.5}", self.body1(), self.body2());
        linear_error < settings.linear_tolerance
    }

    fn shift(&mut self, delta: Vec2) {
        self.pulley_anchor1 += delta;
        self.pulley_anchor2 += delta;
    }

    /// Force on body 1 only. Body 2 receives `n2 * impulse / ratio` times `inv_dt`.
    fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        self.n1 * (self.impulse * inv_dt)
    }

    fn reaction_torque(&self, _inv_dt: f32) -> f32 {
        0.0
    }

    fn clone_remapped(
        &self,
        bodies: &BodySet,
        remap: &dyn Fn(EntityId) -> EntityId,
    ) -> JointResult<Box<dyn Joint>> {
        let copy = self.copy_with(bodies, Some(remap(self.body1())), Some(remap(self.body2())))?;
        Ok(Box::new(copy))
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
    use crate::core::types::MassProperties;
    use approx::assert_abs_diff_eq;

    fn set_velocity(bodies: &mut BodySet, id: EntityId, linear: Vec2) {
        bodies.get_as_mut::<RigidBody>(id).unwrap().velocity.linear = linear;
    }

    fn rig(mass1: f32, mass2: f32) -> (BodySet, PulleyJoint) {
        let mut bodies = BodySet::new();
        let a = bodies.insert(
            RigidBody::new(Vec2::new(-1.0, 0.0)).with_mass(MassProperties::new(mass1, 1.0)),
        );
        let b = bodies.insert(
            RigidBody::new(Vec2::new(1.0, 0.0)).with_mass(MassProperties::new(mass2, 1.0)),
        );
        let joint = PulleyJoint::new(
            &bodies,
            a,
            b,
            Vec2::new(-1.0, 2.0),
            Vec2::new(1.0, 2.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
        )
        .unwrap();
        (bodies, joint)
    }

    #[test]
    fn inv_k_combines_both_segments() {
        let (mut bodies, mut joint) = rig(2.0, 2.0);
        joint.initialize_constraints(&TimeStep::new(1.0 / 60.0), &Settings::default(), &mut bodies);

        // anchors sit at the centers, so only the linear terms remain
        assert_abs_diff_eq!(joint.inv_k(), 1.0, epsilon = 1e-6);
        assert_eq!(joint.directions(), (Vec2::Y, Vec2::Y));
        assert!(joint.is_over_length());
    }

    #[test]
    fn ratio_scales_second_segment_by_inverse_square() {
        let (mut bodies, mut joint) = rig(1.0, 1.0);
        joint.set_ratio(&mut bodies, 2.0).unwrap();
        joint.set_length(&mut bodies, 0.0).unwrap();
        joint.initialize_constraints(&TimeStep::new(1.0 / 60.0), &Settings::default(), &mut bodies);
        // K = 1 + 1/4
        assert_abs_diff_eq!(joint.inv_k(), 0.8, epsilon = 1e-6);
    }

    #[test]
    fn velocity_pass_stops_rope_growth() {
        let (mut bodies, mut joint) = rig(1.0, 1.0);
        set_velocity(&mut bodies, joint.body1(), Vec2::new(0.0, -1.0));

        let step = TimeStep::new(1.0 / 60.0);
        let settings = Settings::default();
        joint.initialize_constraints(&step, &settings, &mut bodies);
        joint.solve_velocity_constraints(&step, &settings, &mut bodies);

        let v1 = bodies.get(joint.body1()).unwrap().velocity().linear;
        let v2 = bodies.get(joint.body2()).unwrap().velocity().linear;
        // body1 falling drags body2 up at the same speed
        assert_abs_diff_eq!(v1.y, -0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(v2.y, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(joint.impulse(), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn slack_rope_applies_nothing() {
        let (mut bodies, mut joint) = rig(1.0, 1.0);
        joint.set_slack_enabled(true);
        joint.set_length(&mut bodies, 10.0).unwrap();
        set_velocity(&mut bodies, joint.body1(), Vec2::new(0.0, -1.0));

        let step = TimeStep::new(1.0 / 60.0);
        let settings = Settings::default();
        joint.initialize_constraints(&step, &settings, &mut bodies);
        joint.solve_velocity_constraints(&step, &settings, &mut bodies);

        assert!(!joint.is_over_length());
        assert_eq!(joint.inv_k(), 0.0);
        assert_eq!(joint.impulse(), 0.0);
        assert_eq!(bodies.get(joint.body1()).unwrap().velocity().linear, Vec2::new(0.0, -1.0));
        assert!(joint.solve_position_constraints(&step, &settings, &mut bodies));
    }

    #[test]
    fn taut_slack_rope_never_pushes() {
        let (mut bodies, mut joint) = rig(1.0, 1.0);
        joint.set_slack_enabled(true);
        // bodies approaching their pulleys: the rope would have to push to resist
        set_velocity(&mut bodies, joint.body1(), Vec2::new(0.0, 1.0));

        let step = TimeStep::new(1.0 / 60.0);
        let settings = Settings::default();
        joint.initialize_constraints(&step, &settings, &mut bodies);
        joint.solve_velocity_constraints(&step, &settings, &mut bodies);

        assert!(joint.is_over_length());
        assert_eq!(joint.impulse(), 0.0);
        assert_eq!(bodies.get(joint.body1()).unwrap().velocity().linear, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn warm_start_scales_with_dt_ratio() {
        let (mut bodies, mut joint) = rig(1.0, 1.0);
        joint.impulse = 1.0;
        let mut step = TimeStep::new(1.0 / 60.0);
        step.update(1.0 / 120.0);

        joint.initialize_constraints(&step, &Settings::default(), &mut bodies);
        assert_abs_diff_eq!(joint.impulse(), 0.5, epsilon = 1e-6);
        // tension pulls both bodies toward their pulleys
        let v1 = bodies.get(joint.body1()).unwrap().velocity().linear;
        assert_abs_diff_eq!(v1.y, 0.5, epsilon = 1e-6);

        let settings = Settings {
            warm_starting: false,
            ..Settings::default()
        };
        joint.initialize_constraints(&step, &settings, &mut bodies);
        assert_eq!(joint.impulse(), 0.0);
    }

    #[test]
    fn immovable_bodies_make_joint_inert() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(RigidBody::fixed(Vec2::new(-1.0, 0.0)));
        let b = bodies.insert(RigidBody::fixed(Vec2::new(1.0, 0.0)));
        let mut joint = PulleyJoint::<RigidBody>::new(
            &bodies,
            a,
            b,
            Vec2::new(-1.0, 2.0),
            Vec2::new(1.0, 2.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
        )
        .unwrap();
        joint.impulse = 3.0;

        let step = TimeStep::new(1.0 / 60.0);
        let settings = Settings::default();
        joint.initialize_constraints(&step, &settings, &mut bodies);
        joint.solve_velocity_constraints(&step, &settings, &mut bodies);

        assert_eq!(joint.inv_k(), 0.0);
        assert_eq!(joint.impulse(), 0.0);
    }

    #[test]
    fn segment_sum_decides_tautness_at_any_ratio() {
        let (mut bodies, mut joint) = rig(1.0, 1.0);
        joint.set_slack_enabled(true);
        joint.set_ratio(&mut bodies, 2.0).unwrap();

        let step = TimeStep::new(1.0 / 60.0);
        let settings = Settings::default();
        // l1 = l2 = 2 against a length of 4
        joint.initialize_constraints(&step, &settings, &mut bodies);
        assert!(joint.is_over_length());
        assert_abs_diff_eq!(joint.inv_k(), 0.8, epsilon = 1e-6);

        joint.set_length(&mut bodies, 4.001).unwrap();
        joint.initialize_constraints(&step, &settings, &mut bodies);
        assert!(!joint.is_over_length());
        assert_eq!(joint.inv_k(), 0.0);
    }

    #[test]
    fn second_body_receives_tension_over_ratio() {
        let (mut bodies, mut joint) = rig(1.0, 1.0);
        joint.set_ratio(&mut bodies, 2.0).unwrap();
        set_velocity(&mut bodies, joint.body1(), Vec2::new(0.0, -1.0));

        let step = TimeStep::new(1.0 / 60.0);
        let settings = Settings::default();
        joint.initialize_constraints(&step, &settings, &mut bodies);
        joint.solve_velocity_constraints(&step, &settings, &mut bodies);

        // K = 1 + 1/4, stretch rate 1
        assert_abs_diff_eq!(joint.impulse(), 0.8, epsilon = 1e-6);
        let v1 = bodies.get(joint.body1()).unwrap().velocity().linear;
        let v2 = bodies.get(joint.body2()).unwrap().velocity().linear;
        assert_abs_diff_eq!(v1.y, -0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(v2.y, 0.4, epsilon = 1e-6);

        let (_, n2) = joint.directions();
        let force2 = n2 * joint.impulse() / joint.ratio() * step.inv_dt;
        assert_abs_diff_eq!(force2.y, joint.reaction_force(step.inv_dt).y / 2.0, epsilon = 1e-4);
    }

    #[test]
    fn pull_only_rope_settles_just_past_its_length() {
        let (mut bodies, mut joint) = rig(1.0, 1.0);
        joint.set_slack_enabled(true);
        bodies.get_as_mut::<RigidBody>(joint.body1()).unwrap().transform.position.y = -0.1;

        let step = TimeStep::new(1.0 / 60.0);
        let settings = Settings::default();
        joint.initialize_constraints(&step, &settings, &mut bodies);
        assert!(!joint.solve_position_constraints(&step, &settings, &mut bodies));
        assert!(joint.solve_position_constraints(&step, &settings, &mut bodies));

        let stretch = joint.current_length(&bodies).unwrap() - joint.length();
        assert_abs_diff_eq!(stretch, 0.5 * settings.linear_tolerance, epsilon = 1e-5);
        joint.initialize_constraints(&step, &settings, &mut bodies);
        assert!(joint.is_over_length());
    }

    #[test]
    fn position_pass_pulls_stretched_rope_back() {
        let (mut bodies, mut joint) = rig(1.0, 1.0);
        bodies.get_as_mut::<RigidBody>(joint.body1()).unwrap().transform.position.y = -0.1;

        let step = TimeStep::new(1.0 / 60.0);
        let settings = Settings::default();
        joint.initialize_constraints(&step, &settings, &mut bodies);
        assert!(!joint.solve_position_constraints(&step, &settings, &mut bodies));
        // a single Newton step is exact for vertical segments
        assert!(joint.solve_position_constraints(&step, &settings, &mut bodies));
        assert_abs_diff_eq!(joint.current_length(&bodies).unwrap(), joint.length(), epsilon = 1e-4);
    }
}
