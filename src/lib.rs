//! Pulley Joints – the joint constraint layer of a 2D rigid-body engine.
//!
//! Bodies live in a generational [`BodySet`] and are referenced by
//! [`EntityId`]. Joints implement the [`Joint`] trait and are driven through
//! three phases per step: initialize, velocity passes, position passes.
//! [`PulleyJoint`] binds two bodies through fixed pulley points and
//! [`PinJoint`] drags one body toward a world target. [`PhysicsWorld`] is a
//! minimal fixed-step loop that runs those phases in order.

pub mod config;
pub mod core;
pub mod dynamics;
pub mod utils;
pub mod world;

pub use glam::{Mat2, Vec2};

pub use config::Settings;
pub use crate::core::{
    body::{BodySet, PhysicsBody},
    error::{JointError, JointResult},
    joint::{BodyIter, Joint, JointCore, JointType, Opaque, SingleBodyJoint, TwoBodyJoint},
    pin::PinJoint,
    pulley::PulleyJoint,
    rigidbody::RigidBody,
    types::{MassProperties, Transform2D, Velocity2D},
};
pub use dynamics::{
    integrator::Integrator,
    solver::{JointSolver, SolverStepMetrics},
    step::TimeStep,
};
pub use utils::allocator::{Arena, EntityId, GenerationalId};
pub use world::{step_worlds, PhysicsWorld};
