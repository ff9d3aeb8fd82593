//! Global configuration constants and solver settings.

use serde::{Deserialize, Serialize};

/// Default gravity vector applied in the physics world (Y-up).
pub const DEFAULT_GRAVITY: [f32; 2] = [0.0, -9.81];

/// Default integration timestep (in seconds).
pub const DEFAULT_TIME_STEP: f32 = 1.0 / 60.0;

/// Velocity-solve passes per step.
pub const DEFAULT_VELOCITY_ITERATIONS: u32 = 10;

/// Upper bound on position-solve passes per step.
pub const DEFAULT_POSITION_ITERATIONS: u32 = 10;

/// Positional error (in meters) under which a constraint counts as satisfied.
pub const DEFAULT_LINEAR_TOLERANCE: f32 = 0.005;

/// Largest positional correction applied in one position pass.
pub const DEFAULT_MAX_LINEAR_CORRECTION: f32 = 0.2;

/// Per-step solver configuration handed to every joint phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub velocity_iterations: u32,
    pub position_iterations: u32,
    pub linear_tolerance: f32,
    pub max_linear_correction: f32,
    /// Reuse last step's accumulated impulses as the initial guess.
    pub warm_starting: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            velocity_iterations: DEFAULT_VELOCITY_ITERATIONS,
            position_iterations: DEFAULT_POSITION_ITERATIONS,
            linear_tolerance: DEFAULT_LINEAR_TOLERANCE,
            max_linear_correction: DEFAULT_MAX_LINEAR_CORRECTION,
            warm_starting: true,
        }
    }
}

impl Settings {
    /// Returns a copy with nonsensical values replaced by usable ones.
    pub fn validated(self) -> Self {
        let defaults = Self::default();
        let positive_or = |value: f32, fallback: f32| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };
        Self {
            velocity_iterations: self.velocity_iterations.max(1),
            position_iterations: self.position_iterations.max(1),
            linear_tolerance: positive_or(self.linear_tolerance, defaults.linear_tolerance),
            max_linear_correction: positive_or(
                self.max_linear_correction,
                defaults.max_linear_correction,
            ),
            warm_starting: self.warm_starting,
        }
    }
}
