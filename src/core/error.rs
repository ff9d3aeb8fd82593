//! Error types for joint construction, access and cloning.

use thiserror::Error;

use crate::utils::allocator::EntityId;

/// Errors raised eagerly by joint constructors, setters and accessors.
///
/// Every failing operation leaves the joint (and its bodies) untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum JointError {
    /// A required handle was the null handle.
    #[error("null reference: {0}")]
    NullReference(&'static str),

    /// Structurally invalid input such as the same body twice or a negative length.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Positional body access outside `0..count`.
    #[error("body index {index} out of range for a joint with {count} bodies")]
    IndexOutOfRange { index: usize, count: usize },

    /// A body is not of the concrete type the joint was built against.
    #[error("body {body} is a {found}, expected {expected}")]
    TypeMismatch {
        body: EntityId,
        expected: &'static str,
        found: &'static str,
    },

    /// The handle is well formed but no body lives behind it.
    #[error("body {0} not found")]
    BodyNotFound(EntityId),
}

impl JointError {
    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

pub type JointResult<T> = Result<T, JointError>;
