//! Solver configuration.
//!
//! Solver-wide knobs. Per-team parameters (gravity, damping, time
//! scale) live in the team record instead.

use serde::{Deserialize, Serialize};

/// Configuration for the reference solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Constraint projection iterations per step.
    pub iterations: u32,

    /// Distance kept between particles and collider surfaces (meters).
    pub collision_margin: f32,

    /// Speed limit applied after integration (m/s). 0 disables the limit.
    pub max_velocity: f32,

    /// Upper bound for a single step (seconds); longer steps are clamped.
    pub max_dt: f32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iterations: 4,
            collision_margin: weft_types::constants::DEFAULT_COLLISION_MARGIN,
            max_velocity: 10.0,
            max_dt: 1.0 / 30.0,
        }
    }
}

impl SolverConfig {
    /// Creates a config for debugging (one iteration, no velocity limit).
    pub fn debug() -> Self {
        Self {
            iterations: 1,
            max_velocity: 0.0,
            ..Default::default()
        }
    }
}
