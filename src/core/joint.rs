//! Joint contract shared by every constraint, plus the single-body and
//! two-body building blocks concrete joints are composed from.

use std::any::Any;
use std::fmt;
use std::iter::Copied;
use std::slice;
use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{BodySet, PhysicsBody};
use super::error::{JointError, JointResult};
use crate::config::Settings;
use crate::dynamics::step::TimeStep;
use crate::utils::allocator::EntityId;

/// Caller-attached value a joint stores but never interprets.
pub type Opaque = Arc<dyn Any + Send + Sync>;

/// Forward-only iterator over a joint's bodies, in slot order.
pub type BodyIter<'a> = Copied<slice::Iter<'a, EntityId>>;

/// Kind tag for the concrete joint types in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JointType {
    Pulley,
    Pin,
}

/// State every joint carries regardless of how many bodies it binds.
#[derive(Clone, Default)]
pub struct JointCore {
    collision_allowed: bool,
    owner: Option<Opaque>,
    user_data: Option<Opaque>,
}

impl fmt::Debug for JointCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JointCore")
            .field("collision_allowed", &self.collision_allowed)
            .field("has_owner", &self.owner.is_some())
            .field("has_user_data", &self.user_data.is_some())
            .finish()
    }
}

impl JointCore {
    /// Same flags, owner and user data dropped. Used when copying joints.
    pub fn detached(&self) -> Self {
        Self {
            collision_allowed: self.collision_allowed,
            owner: None,
            user_data: None,
        }
    }
}

/// Polymorphic constraint driven by the outer simulation loop.
///
/// Each step the loop calls [`Joint::initialize_constraints`] once, then
/// [`Joint::solve_velocity_constraints`] for every velocity pass, then
/// [`Joint::solve_position_constraints`] for every position pass, visiting
/// joints in the same order in each phase.
pub trait Joint: Send + Sync {
    fn joint_type(&self) -> JointType;

    fn core(&self) -> &JointCore;
    fn core_mut(&mut self) -> &mut JointCore;

    /// Read-only view of the joint's bodies, in slot order.
    fn bodies(&self) -> &[EntityId];

    fn body_count(&self) -> usize {
        self.bodies().len()
    }

    fn body(&self, index: usize) -> JointResult<EntityId> {
        let bodies = self.bodies();
        bodies
            .get(index)
            .copied()
            .ok_or(JointError::IndexOutOfRange {
                index,
                count: bodies.len(),
            })
    }

    /// Fresh iterator over the bodies on every call.
    fn body_iter(&self) -> BodyIter<'_> {
        self.bodies().iter().copied()
    }

    /// True iff `body` is one of this joint's own handles. Null is never a member.
    fn is_member(&self, body: EntityId) -> bool {
        !body.is_null() && self.bodies().contains(&body)
    }

    /// True iff every body exists and is enabled. Computed on every call.
    fn is_enabled(&self, bodies: &BodySet) -> bool {
        self.bodies()
            .iter()
            .all(|id| bodies.get(*id).is_some_and(|body| body.is_enabled()))
    }

    fn is_collision_allowed(&self) -> bool {
        self.core().collision_allowed
    }

    fn set_collision_allowed(&mut self, allowed: bool) {
        self.core_mut().collision_allowed = allowed;
    }

    fn owner(&self) -> Option<&Opaque> {
        self.core().owner.as_ref()
    }

    fn set_owner(&mut self, owner: Option<Opaque>) {
        self.core_mut().owner = owner;
    }

    fn user_data(&self) -> Option<&Opaque> {
        self.core().user_data.as_ref()
    }

    fn set_user_data(&mut self, user_data: Option<Opaque>) {
        self.core_mut().user_data = user_data;
    }

    /// Effective mass of the joint's bodies seen as one system.
    fn reduced_mass(&self, bodies: &BodySet) -> f32 {
        reduce(self.bodies(), bodies, |body| {
            (body.mass_properties().mass, body.inverse_mass())
        })
    }

    /// Effective rotational inertia of the joint's bodies seen as one system.
    fn reduced_inertia(&self, bodies: &BodySet) -> f32 {
        reduce(self.bodies(), bodies, |body| {
            (body.mass_properties().inertia, body.inverse_inertia())
        })
    }

    fn initialize_constraints(
        &mut self,
        step: &TimeStep,
        settings: &Settings,
        bodies: &mut BodySet,
    );

    fn solve_velocity_constraints(
        &mut self,
        step: &TimeStep,
        settings: &Settings,
        bodies: &mut BodySet,
    );

    /// Returns true when the positional error is within tolerance.
    fn solve_position_constraints(
        &mut self,
        step: &TimeStep,
        settings: &Settings,
        bodies: &mut BodySet,
    ) -> bool;

    /// Moves any world-space geometry the joint owns by `delta`.
    fn shift(&mut self, delta: Vec2);

    /// Constraint force applied to the first body over the last step.
    fn reaction_force(&self, inv_dt: f32) -> Vec2;

    /// Constraint torque applied to the first body over the last step.
    fn reaction_torque(&self, inv_dt: f32) -> f32;

    /// Copies this joint onto `bodies`, mapping each of its handles through `remap`.
    ///
    /// The copy keeps all solver state but starts with no owner or user data.
    fn clone_remapped(
        &self,
        bodies: &BodySet,
        remap: &dyn Fn(EntityId) -> EntityId,
    ) -> JointResult<Box<dyn Joint>>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Harmonic combination of one or two bodies' mass-like values.
///
/// `measure` yields `(value, inverse)`; a zero inverse marks an infinite body.
/// Bodies that no longer resolve count as infinite.
fn reduce<F>(ids: &[EntityId], bodies: &BodySet, measure: F) -> f32
where
    F: Fn(&dyn PhysicsBody) -> (f32, f32),
{
    let sample = |id: &EntityId| bodies.get(*id).map(&measure).unwrap_or((0.0, 0.0));
    match ids {
        [single] => {
            let (value, inverse) = sample(single);
            if inverse > 0.0 {
                value
            } else {
                0.0
            }
        }
        [first, second] => reduced_value(sample(first), sample(second)),
        _ => 0.0,
    }
}

/// `1/(1/a + 1/b)`, with infinite entries (zero inverse) dropping out.
pub fn reduced_value((a, inv_a): (f32, f32), (b, inv_b): (f32, f32)) -> f32 {
    match (inv_a > 0.0, inv_b > 0.0) {
        (true, true) => 1.0 / (inv_a + inv_b),
        (true, false) => a,
        (false, true) => b,
        (false, false) => 0.0,
    }
}

/// Body slot and shared state of a joint anchored to exactly one body.
#[derive(Debug, Clone)]
pub struct SingleBodyJoint {
    body: [EntityId; 1],
    core: JointCore,
}

impl SingleBodyJoint {
    pub fn new(body: EntityId) -> JointResult<Self> {
        if body.is_null() {
            return Err(JointError::NullReference("body"));
        }
        Ok(Self {
            body: [body],
            core: JointCore::default(),
        })
    }

    pub fn body(&self) -> EntityId {
        self.body[0]
    }

    pub fn bodies(&self) -> &[EntityId] {
        &self.body
    }

    pub fn core(&self) -> &JointCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut JointCore {
        &mut self.core
    }

    /// Copy bound to `body` instead, with owner and user data cleared.
    pub fn with_body(&self, body: Option<EntityId>) -> JointResult<Self> {
        let mut copy = Self::new(body.unwrap_or(self.body()))?;
        copy.core = self.core.detached();
        Ok(copy)
    }
}

/// Body slots and shared state of a joint between two distinct bodies.
#[derive(Debug, Clone)]
pub struct TwoBodyJoint {
    bodies: [EntityId; 2],
    core: JointCore,
}

impl TwoBodyJoint {
    pub fn new(body1: EntityId, body2: EntityId) -> JointResult<Self> {
        if body1.is_null() {
            return Err(JointError::NullReference("body1"));
        }
        if body2.is_null() {
            return Err(JointError::NullReference("body2"));
        }
        if body1 == body2 {
            return Err(JointError::invalid_argument(format!(
                "a two-body joint needs distinct bodies, got {body1} twice"
            )));
        }
        Ok(Self {
            bodies: [body1, body2],
            core: JointCore::default(),
        })
    }

    pub fn body1(&self) -> EntityId {
        self.bodies[0]
    }

    pub fn body2(&self) -> EntityId {
        self.bodies[1]
    }

    pub fn bodies(&self) -> &[EntityId] {
        &self.bodies
    }

    /// The body on the other end from `body`, or `None` if `body` is not attached.
    pub fn other_body(&self, body: EntityId) -> Option<EntityId> {
        match self.bodies {
            [first, second] if first == body => Some(second),
            [first, second] if second == body => Some(first),
            _ => None,
        }
    }

    pub fn core(&self) -> &JointCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut JointCore {
        &mut self.core
    }

    /// Copy with either slot optionally replaced, owner and user data cleared.
    pub fn with_bodies(
        &self,
        body1: Option<EntityId>,
        body2: Option<EntityId>,
    ) -> JointResult<Self> {
        let mut copy = Self::new(
            body1.unwrap_or(self.body1()),
            body2.unwrap_or(self.body2()),
        )?;
        copy.core = self.core.detached();
        Ok(copy)
    }
}
