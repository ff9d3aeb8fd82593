//! Body capability interface consumed by joints, and the arena that stores bodies.

use std::any::Any;

use glam::Vec2;

use super::error::{JointError, JointResult};
use super::types::{MassProperties, Transform2D, Velocity2D};
use crate::utils::{
    allocator::{Arena, EntityId},
    math::cross,
};

/// What the joint layer needs from a rigid body.
///
/// Joints read mass properties and kinematic state, push impulses and
/// position corrections back, and wake sleeping bodies when their constraint
/// geometry changes. Everything else about a body is opaque to them.
pub trait PhysicsBody: Any + Send + Sync {
    fn mass_properties(&self) -> MassProperties;

    fn inverse_mass(&self) -> f32 {
        self.mass_properties().inverse_mass()
    }

    fn inverse_inertia(&self) -> f32 {
        self.mass_properties().inverse_inertia()
    }

    fn transform(&self) -> Transform2D;
    fn set_transform(&mut self, transform: Transform2D);

    fn velocity(&self) -> Velocity2D;
    fn set_velocity(&mut self, velocity: Velocity2D);

    fn is_enabled(&self) -> bool;

    /// Multiplier on world gravity during velocity integration.
    fn gravity_scale(&self) -> f32 {
        1.0
    }

    /// `(linear, angular)` damping rates per second.
    fn damping(&self) -> (f32, f32) {
        (0.0, 0.0)
    }

    fn is_at_rest(&self) -> bool;
    fn set_at_rest(&mut self, at_rest: bool);

    fn wake_up(&mut self) {
        self.set_at_rest(false);
    }

    /// Body-local point in world space.
    fn world_point(&self, local: Vec2) -> Vec2 {
        self.transform().transform_point(local)
    }

    /// World point in body-local space.
    fn local_point(&self, world: Vec2) -> Vec2 {
        self.transform().inverse_transform_point(world)
    }

    /// Applies a linear impulse at lever arm `r` from the center of mass.
    fn apply_impulse(&mut self, impulse: Vec2, r: Vec2) {
        let mut velocity = self.velocity();
        velocity.linear += impulse * self.inverse_mass();
        velocity.angular += self.inverse_inertia() * cross(r, impulse);
        self.set_velocity(velocity);
    }

    /// Position-level counterpart of [`PhysicsBody::apply_impulse`].
    fn apply_position_impulse(&mut self, impulse: Vec2, r: Vec2) {
        let mut transform = self.transform();
        transform.position += impulse * self.inverse_mass();
        transform.rotation += self.inverse_inertia() * cross(r, impulse);
        self.set_transform(transform);
    }

    /// Moves the body by `delta` when the world origin is re-centered.
    fn shift(&mut self, delta: Vec2) {
        let mut transform = self.transform();
        transform.translate(delta);
        self.set_transform(transform);
    }

    fn clone_body(&self) -> Box<dyn PhysicsBody>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Heterogeneous body storage addressed by [`EntityId`].
#[derive(Default)]
pub struct BodySet {
    bodies: Arena<Box<dyn PhysicsBody>>,
}

impl BodySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<B: PhysicsBody>(&mut self, body: B) -> EntityId {
        self.bodies.insert(Box::new(body))
    }

    pub fn insert_boxed(&mut self, body: Box<dyn PhysicsBody>) -> EntityId {
        self.bodies.insert(body)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Box<dyn PhysicsBody>> {
        self.bodies.remove(id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.bodies.contains(id)
    }

    pub fn get(&self, id: EntityId) -> Option<&dyn PhysicsBody> {
        self.bodies.get(id).map(|body| body.as_ref())
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut (dyn PhysicsBody + 'static)> {
        self.bodies.get_mut(id).map(|body| body.as_mut())
    }

    #[allow(clippy::type_complexity)]
    pub fn get2_mut(
        &mut self,
        id_a: EntityId,
        id_b: EntityId,
    ) -> Option<(
        &mut (dyn PhysicsBody + 'static),
        &mut (dyn PhysicsBody + 'static),
    )> {
        self.bodies
            .get2_mut(id_a, id_b)
            .map(|(a, b)| (a.as_mut(), b.as_mut()))
    }

    /// Typed view of a body, if it is a `B`.
    pub fn get_as<B: PhysicsBody>(&self, id: EntityId) -> Option<&B> {
        self.get(id)?.as_any().downcast_ref::<B>()
    }

    pub fn get_as_mut<B: PhysicsBody>(&mut self, id: EntityId) -> Option<&mut B> {
        self.get_mut(id)?.as_any_mut().downcast_mut::<B>()
    }

    /// Resolves a handle, distinguishing a null handle from a missing body.
    pub fn resolve(&self, id: EntityId) -> JointResult<&dyn PhysicsBody> {
        if id.is_null() {
            return Err(JointError::NullReference("body"));
        }
        self.get(id).ok_or(JointError::BodyNotFound(id))
    }

    /// Resolves a handle and checks that the body is a `B`.
    pub fn resolve_as<B: PhysicsBody>(&self, id: EntityId) -> JointResult<&B> {
        let body = self.resolve(id)?;
        body.as_any()
            .downcast_ref::<B>()
            .ok_or_else(|| JointError::TypeMismatch {
                body: id,
                expected: std::any::type_name::<B>(),
                found: body.type_name(),
            })
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.bodies.ids()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &dyn PhysicsBody)> + '_ {
        self.bodies.iter().map(|(id, body)| (id, body.as_ref()))
    }

    pub fn iter_mut(
        &mut self,
    ) -> impl Iterator<Item = (EntityId, &mut (dyn PhysicsBody + 'static))> + '_ {
        self.bodies.iter_mut().map(|(id, body)| (id, body.as_mut()))
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}
