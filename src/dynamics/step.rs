use crate::utils::math::safe_inverse;

/// Timing of the current simulation step as seen by the solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeStep {
    pub dt: f32,
    pub inv_dt: f32,
    pub prev_dt: f32,
    /// `dt / prev_dt`, used to rescale warm-start impulses after a dt change.
    pub dt_ratio: f32,
}

impl TimeStep {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            inv_dt: safe_inverse(dt),
            prev_dt: dt,
            dt_ratio: 1.0,
        }
    }

    /// Advances to a step of length `dt`.
    pub fn update(&mut self, dt: f32) {
        self.prev_dt = self.dt;
        self.dt = dt;
        self.inv_dt = safe_inverse(dt);
        self.dt_ratio = if self.prev_dt > 0.0 {
            dt / self.prev_dt
        } else {
            1.0
        };
    }
}
