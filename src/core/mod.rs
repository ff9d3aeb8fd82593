//! Core types: bodies and their storage, the joint contract, and concrete joints.

pub mod body;
pub mod error;
pub mod joint;
pub mod pin;
pub mod pulley;
pub mod rigidbody;
pub mod types;

pub use body::{BodySet, PhysicsBody};
pub use error::{JointError, JointResult};
pub use joint::{BodyIter, Joint, JointCore, JointType, Opaque, SingleBodyJoint, TwoBodyJoint};
pub use pin::PinJoint;
pub use pulley::PulleyJoint;
pub use rigidbody::RigidBody;
pub use types::{MassProperties, Transform2D, Velocity2D};
