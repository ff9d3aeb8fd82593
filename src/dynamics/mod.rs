//! Simulation dynamics: step timing, integration, and the joint solver loop.

pub mod integrator;
pub mod solver;
pub mod step;

pub use integrator::Integrator;
pub use solver::{JointSolver, SolverStepMetrics};
pub use step::TimeStep;
