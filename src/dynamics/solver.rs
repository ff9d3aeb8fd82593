use log::trace;

use crate::{
    config::Settings,
    core::{body::BodySet, joint::Joint},
    dynamics::step::TimeStep,
    utils::allocator::{Arena, EntityId},
};

/// Counters for the joint phases of one or more steps.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverStepMetrics {
    pub joints_solved: usize,
    pub joints_skipped: usize,
    pub velocity_iterations: u32,
    pub position_iterations: u32,
    /// All active joints reported their positional error within tolerance.
    pub position_converged: bool,
}

impl Default for SolverStepMetrics {
    fn default() -> Self {
        // nothing has failed to converge yet
        Self {
            joints_solved: 0,
            joints_skipped: 0,
            velocity_iterations: 0,
            position_iterations: 0,
            position_converged: true,
        }
    }
}

impl SolverStepMetrics {
    /// Folds another step's counters into this one.
    pub fn merge(&mut self, other: &Self) {
        self.joints_solved += other.joints_solved;
        self.joints_skipped += other.joints_skipped;
        self.velocity_iterations += other.velocity_iterations;
        self.position_iterations += other.position_iterations;
        self.position_converged &= other.position_converged;
    }
}

/// Drives initialize, velocity and position passes over a joint collection.
///
/// Joints are visited in arena order in every phase, so impulses on a
/// shared body accumulate in the same order each step.
#[derive(Debug, Default, Clone)]
pub struct JointSolver {
    active: Vec<EntityId>,
    metrics: SolverStepMetrics,
}

impl JointSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics(&self) -> &SolverStepMetrics {
        &self.metrics
    }

    /// Picks the joints that take part in this step and wakes their bodies.
    ///
    /// A joint is skipped when one of its bodies is disabled or gone, or when
    /// every one of its bodies is at rest.
    pub fn prepare(&mut self, joints: &Arena<Box<dyn Joint>>, bodies: &mut BodySet) {
        self.active.clear();
        self.metrics = SolverStepMetrics::default();

        for (id, joint) in joints.iter() {
            let resting = joint
                .body_iter()
                .all(|body| bodies.get(body).is_some_and(|body| body.is_at_rest()));
            if !joint.is_enabled(bodies) || resting {
                self.metrics.joints_skipped += 1;
                continue;
            }

            for body in joint.body_iter() {
                if let Some(body) = bodies.get_mut(body) {
                    body.wake_up();
                }
            }
            self.active.push(id);
        }
        self.metrics.joints_solved = self.active.len();
    }

    pub fn initialize(
        &mut self,
        joints: &mut Arena<Box<dyn Joint>>,
        bodies: &mut BodySet,
        step: &TimeStep,
        settings: &Settings,
    ) {
        for id in &self.active {
            if let Some(joint) = joints.get_mut(*id) {
                joint.initialize_constraints(step, settings, bodies);
            }
        }
    }

    pub fn solve_velocities(
        &mut self,
        joints: &mut Arena<Box<dyn Joint>>,
        bodies: &mut BodySet,
        step: &TimeStep,
        settings: &Settings,
    ) {
        for _ in 0..settings.velocity_iterations {
            for id in &self.active {
                if let Some(joint) = joints.get_mut(*id) {
                    joint.solve_velocity_constraints(step, settings, bodies);
                }
            }
            self.metrics.velocity_iterations += 1;
        }
    }

    /// Runs position passes until every joint is within tolerance or the
    /// iteration budget is spent. Returns whether all joints converged.
    pub fn solve_positions(
        &mut self,
        joints: &mut Arena<Box<dyn Joint>>,
        bodies: &mut BodySet,
        step: &TimeStep,
        settings: &Settings,
    ) -> bool {
        let mut converged = self.active.is_empty();
        for _ in 0..settings.position_iterations {
            if converged {
                break;
            }
            converged = true;
            for id in &self.active {
                if let Some(joint) = joints.get_mut(*id) {
                    // every joint gets its pass even once another has failed
                    converged &= joint.solve_position_constraints(step, settings, bodies);
                }
            }
            self.metrics.position_iterations += 1;
        }

        trace!(
            "position passes: {} (converged: {converged})",
            self.metrics.position_iterations
        );
        self.metrics.position_converged = converged;
        converged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{pulley::PulleyJoint, rigidbody::RigidBody};
    use glam::Vec2;

    fn rig(at_rest: bool) -> (Arena<Box<dyn Joint>>, BodySet) {
        let mut bodies = BodySet::new();
        let a = bodies.insert(RigidBody {
            is_at_rest: at_rest,
            ..RigidBody::new(Vec2::new(-1.0, 0.0))
        });
        let b = bodies.insert(RigidBody {
            is_at_rest: at_rest,
            ..RigidBody::new(Vec2::new(1.0, 0.0))
        });
        let joint = PulleyJoint::<RigidBody>::new(
            &bodies,
            a,
            b,
            Vec2::new(-1.0, 2.0),
            Vec2::new(1.0, 2.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
        )
        .unwrap();
        let mut joints: Arena<Box<dyn Joint>> = Arena::new();
        joints.insert(Box::new(joint));
        (joints, bodies)
    }

    #[test]
    fn merge_sums_counters_and_ands_convergence() {
        let converged = SolverStepMetrics {
            joints_solved: 2,
            joints_skipped: 1,
            velocity_iterations: 10,
            position_iterations: 3,
            position_converged: true,
        };
        let mut total = SolverStepMetrics::default();
        total.merge(&converged);
        assert_eq!(total, converged);

        total.merge(&SolverStepMetrics {
            position_converged: false,
            ..converged.clone()
        });
        assert_eq!(total.joints_solved, 4);
        assert_eq!(total.velocity_iterations, 20);
        assert_eq!(total.position_iterations, 6);
        assert!(!total.position_converged);
    }

    #[test]
    fn resting_joints_are_skipped() {
        let (joints, mut bodies) = rig(true);
        let mut solver = JointSolver::new();
        solver.prepare(&joints, &mut bodies);
        assert_eq!(solver.metrics().joints_solved, 0);
        assert_eq!(solver.metrics().joints_skipped, 1);
    }

    #[test]
    fn satisfied_joints_converge_in_one_pass() {
        let (mut joints, mut bodies) = rig(false);
        let mut solver = JointSolver::new();
        let step = TimeStep::new(1.0 / 60.0);
        let settings = Settings::default();

        solver.prepare(&joints, &mut bodies);
        solver.initialize(&mut joints, &mut bodies, &step, &settings);
        solver.solve_velocities(&mut joints, &mut bodies, &step, &settings);
        assert!(solver.solve_positions(&mut joints, &mut bodies, &step, &settings));

        let metrics = solver.metrics();
        assert_eq!(metrics.joints_solved, 1);
        assert_eq!(metrics.velocity_iterations, settings.velocity_iterations);
        assert_eq!(metrics.position_iterations, 1);
        assert!(metrics.position_converged);
    }
}
