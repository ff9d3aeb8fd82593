//! Utility helpers: body handles and arena, 2D math, and trace timing.

pub mod allocator;
pub mod logging;
pub mod math;

pub use allocator::{Arena, EntityId, GenerationalId};
pub use math::*;
