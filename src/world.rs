use std::collections::HashMap;

use crate::{
    config::{Settings, DEFAULT_GRAVITY, DEFAULT_TIME_STEP},
    core::{
        body::{BodySet, PhysicsBody},
        error::{JointError, JointResult},
        joint::Joint,
    },
    dynamics::{
        integrator::Integrator,
        solver::{JointSolver, SolverStepMetrics},
        step::TimeStep,
    },
    utils::{
        allocator::{Arena, EntityId},
        logging::ScopedTimer,
    },
};
use glam::Vec2;
use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Minimal simulation container: bodies, the joints between them, and the
/// fixed-step loop that drives the joint solver.
pub struct PhysicsWorld {
    bodies: BodySet,
    joints: Arena<Box<dyn Joint>>,
    pub integrator: Integrator,
    pub settings: Settings,
    solver: JointSolver,
    frame_metrics: SolverStepMetrics,
    timing: TimeStep,
    time_step: f32,
    time_accumulated: f32,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_STEP)
    }
}

impl PhysicsWorld {
    pub fn new(time_step: f32) -> Self {
        let ts = if time_step > 0.0 && time_step.is_finite() {
            time_step
        } else {
            DEFAULT_TIME_STEP
        };

        Self {
            bodies: BodySet::new(),
            joints: Arena::new(),
            integrator: Integrator::new(Vec2::from_array(DEFAULT_GRAVITY)),
            settings: Settings::default(),
            solver: JointSolver::new(),
            frame_metrics: SolverStepMetrics::default(),
            timing: TimeStep::new(ts),
            time_step: ts,
            time_accumulated: 0.0,
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings.validated();
        self
    }

    pub fn gravity(&self) -> Vec2 {
        self.integrator.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.integrator.gravity = gravity;
    }

    pub fn time_step(&self) -> f32 {
        self.time_step
    }

    /// Changes the fixed step. Warm-start impulses are rescaled on the next step.
    pub fn set_time_step(&mut self, time_step: f32) {
        if time_step > 0.0 && time_step.is_finite() {
            self.time_step = time_step;
        }
    }

    pub fn add_body<B: PhysicsBody>(&mut self, body: B) -> EntityId {
        self.bodies.insert(body)
    }

    /// Removes a body together with every joint attached to it.
    pub fn remove_body(&mut self, id: EntityId) -> Option<Box<dyn PhysicsBody>> {
        let body = self.bodies.remove(id)?;
        let attached: Vec<EntityId> = self.joints_of(id).collect();
        for joint in &attached {
            self.joints.remove(*joint);
        }
        if !attached.is_empty() {
            debug!("removed body {id} and {} attached joint(s)", attached.len());
        }
        Some(body)
    }

    pub fn body(&self, id: EntityId) -> Option<&dyn PhysicsBody> {
        self.bodies.get(id)
    }

    pub fn body_mut(&mut self, id: EntityId) -> Option<&mut (dyn PhysicsBody + 'static)> {
        self.bodies.get_mut(id)
    }

    pub fn body_as<B: PhysicsBody>(&self, id: EntityId) -> Option<&B> {
        self.bodies.get_as(id)
    }

    pub fn body_as_mut<B: PhysicsBody>(&mut self, id: EntityId) -> Option<&mut B> {
        self.bodies.get_as_mut(id)
    }

    pub fn bodies(&self) -> &BodySet {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut BodySet {
        &mut self.bodies
    }

    /// Adds a joint after checking that all of its bodies live in this world.
    pub fn add_joint<J: Joint + 'static>(&mut self, joint: J) -> JointResult<EntityId> {
        self.add_joint_boxed(Box::new(joint))
    }

    pub fn add_joint_boxed(&mut self, joint: Box<dyn Joint>) -> JointResult<EntityId> {
        if let Some(missing) = joint.body_iter().find(|id| !self.bodies.contains(*id)) {
            return Err(JointError::BodyNotFound(missing));
        }
        let id = self.joints.insert(joint);
        debug!("added joint {id}");
        Ok(id)
    }

    pub fn remove_joint(&mut self, id: EntityId) -> Option<Box<dyn Joint>> {
        self.joints.remove(id)
    }

    pub fn joint(&self, id: EntityId) -> Option<&dyn Joint> {
        self.joints.get(id).map(|joint| joint.as_ref())
    }

    pub fn joint_mut(&mut self, id: EntityId) -> Option<&mut (dyn Joint + 'static)> {
        self.joints.get_mut(id).map(|joint| joint.as_mut())
    }

    /// Typed view of a joint, if it is a `J`.
    pub fn joint_as<J: Joint + 'static>(&self, id: EntityId) -> Option<&J> {
        self.joints.get(id)?.as_any().downcast_ref::<J>()
    }

    /// A typed joint together with the bodies its setters need to wake.
    pub fn joint_with_bodies_mut<J: Joint + 'static>(
        &mut self,
        id: EntityId,
    ) -> Option<(&mut J, &mut BodySet)> {
        let joint = self.joints.get_mut(id)?.as_any_mut().downcast_mut::<J>()?;
        Some((joint, &mut self.bodies))
    }

    pub fn joints(&self) -> impl Iterator<Item = (EntityId, &dyn Joint)> + '_ {
        self.joints.iter().map(|(id, joint)| (id, joint.as_ref()))
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Joints that have `body` as one of their bodies.
    pub fn joints_of(&self, body: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.joints
            .iter()
            .filter(move |(_, joint)| joint.is_member(body))
            .map(|(id, _)| id)
    }

    /// False when a joint between `a` and `b` asks for contacts between them to be suppressed.
    pub fn can_collide(&self, a: EntityId, b: EntityId) -> bool {
        !self.joints.iter().any(|(_, joint)| {
            joint.is_collision_allowed() && joint.is_member(a) && joint.is_member(b)
        })
    }

    /// Counters of the most recent fixed step.
    pub fn solver_metrics(&self) -> &SolverStepMetrics {
        self.solver.metrics()
    }

    /// Counters summed over every fixed step run by the last [`PhysicsWorld::step`] call.
    pub fn frame_metrics(&self) -> &SolverStepMetrics {
        &self.frame_metrics
    }

    /// Advances the simulation using a fixed timestep accumulator.
    pub fn step(&mut self, dt: f32) {
        self.time_accumulated += dt;
        self.frame_metrics = SolverStepMetrics::default();

        while self.time_accumulated >= self.time_step {
            self.time_accumulated -= self.time_step;
            self.step_fixed();
            self.frame_metrics.merge(self.solver.metrics());
        }
    }

    /// One fixed step: joint selection, velocities, joint phases, positions,
    /// position correction.
    pub fn step_fixed(&mut self) {
        let dt = self.time_step;
        self.timing.update(dt);

        let _solver_timer = ScopedTimer::new("solver::joints");
        // wakes bodies, so it runs before velocity integration
        self.solver.prepare(&self.joints, &mut self.bodies);
        {
            let _timer = ScopedTimer::new("integrator::velocity");
            self.integrator.integrate_velocities(&mut self.bodies, dt);
        }
        {
            let _timer = ScopedTimer::new("solver::initialize");
            self.solver
                .initialize(&mut self.joints, &mut self.bodies, &self.timing, &self.settings);
        }
        {
            let _timer = ScopedTimer::new("solver::velocity");
            self.solver
                .solve_velocities(&mut self.joints, &mut self.bodies, &self.timing, &self.settings);
        }
        {
            let _timer = ScopedTimer::new("integrator::position");
            self.integrator.integrate_positions(&mut self.bodies, dt);
        }
        {
            let _timer = ScopedTimer::new("solver::position");
            self.solver
                .solve_positions(&mut self.joints, &mut self.bodies, &self.timing, &self.settings);
        }
    }

    /// Re-centers the world: every body and every joint's world geometry moves by `delta`.
    pub fn shift(&mut self, delta: Vec2) {
        for (_, body) in self.bodies.iter_mut() {
            body.shift(delta);
        }
        for (_, joint) in self.joints.iter_mut() {
            joint.shift(delta);
        }
        debug!("shifted world by {delta}");
    }

    /// Deep copy onto freshly cloned bodies, with joints remapped to the new handles.
    ///
    /// Bodies and joints keep their relative order, so the copy steps exactly
    /// like the source. Copied joints carry no owner or user data.
    pub fn try_clone(&self) -> JointResult<Self> {
        let mut bodies = BodySet::new();
        let mut remap = HashMap::with_capacity(self.bodies.len());
        for (id, body) in self.bodies.iter() {
            remap.insert(id, bodies.insert_boxed(body.clone_body()));
        }

        let lookup = |id: EntityId| remap.get(&id).copied().unwrap_or(EntityId::NULL);
        let mut joints = Arena::new();
        for (_, joint) in self.joints.iter() {
            joints.insert(joint.clone_remapped(&bodies, &lookup)?);
        }
        debug!(
            "cloned world with {} bodies and {} joints",
            bodies.len(),
            joints.len()
        );

        Ok(Self {
            bodies,
            joints,
            integrator: self.integrator.clone(),
            settings: self.settings,
            solver: JointSolver::new(),
            frame_metrics: SolverStepMetrics::default(),
            timing: self.timing,
            time_step: self.time_step,
            time_accumulated: self.time_accumulated,
        })
    }
}

/// Steps independent worlds by `dt`, in parallel when the `parallel` feature is on.
pub fn step_worlds(worlds: &mut [PhysicsWorld], dt: f32) {
    #[cfg(feature = "parallel")]
    worlds.par_iter_mut().for_each(|world| world.step(dt));

    #[cfg(not(feature = "parallel"))]
    worlds.iter_mut().for_each(|world| world.step(dt));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{pin::PinJoint, rigidbody::RigidBody};

    #[test]
    fn invalid_time_step_falls_back_to_default() {
        assert_eq!(PhysicsWorld::new(0.0).time_step(), DEFAULT_TIME_STEP);
        assert_eq!(PhysicsWorld::new(f32::NAN).time_step(), DEFAULT_TIME_STEP);
    }

    #[test]
    fn accumulator_runs_whole_steps_only() {
        let mut world = PhysicsWorld::new(0.1);
        let id = world.add_body(RigidBody::new(Vec2::ZERO));

        world.step(0.05);
        assert_eq!(world.body(id).unwrap().velocity().linear, Vec2::ZERO);

        world.step(0.06);
        assert!(world.body(id).unwrap().velocity().linear.y < 0.0);
    }

    #[test]
    fn add_joint_rejects_foreign_bodies() {
        let mut world = PhysicsWorld::default();
        world.add_body(RigidBody::new(Vec2::ZERO));

        let mut other = BodySet::new();
        other.insert(RigidBody::new(Vec2::ZERO));
        let stray = other.insert(RigidBody::new(Vec2::ONE));
        let joint = PinJoint::<RigidBody>::new(&other, stray, Vec2::ONE).unwrap();

        assert_eq!(world.add_joint(joint), Err(JointError::BodyNotFound(stray)));
    }
}
