//! Reference solver.
//!
//! Position-based Verlet integration with one distance constraint per
//! particle towards its parent. Good enough to make bone chains hang,
//! swing and collide; not a cloth model.

use std::time::Instant;

use weft_team::TeamRecord;
use weft_types::WeftResult;

use crate::collider::WorldCollider;
use crate::config::SolverConfig;
use crate::state::ParticleState;
use crate::strategy::{StepResult, TeamSolver};

/// Verlet solver with parent-distance constraints.
///
/// Step order:
/// 1. apply the pending external force
/// 2. predict under gravity, fixed particles snap to base
/// 3. project distance constraints and colliders `iterations` times
/// 4. derive velocities, damp and clamp
pub struct ReferenceSolver {
    config: SolverConfig,
}

impl ReferenceSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn project_distances(state: &mut ParticleState) {
        for i in 0..state.count {
            let Some(p) = state.parent[i] else { continue };
            let p = p as usize;
            let w_i = state.inv_mass[i];
            let w_p = state.inv_mass[p];
            let w = w_i + w_p;
            if w == 0.0 {
                continue;
            }
            let a = state.position(i);
            let b = state.position(p);
            let d = a - b;
            let len = d.length();
            if len < 1e-9 {
                continue;
            }
            let c = (len - state.rest_length[i]) / len;
            state.set_position(i, a - d * (c * w_i / w));
            state.set_position(p, b + d * (c * w_p / w));
        }
    }
}

impl Default for ReferenceSolver {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

impl TeamSolver for ReferenceSolver {
    fn step(
        &mut self,
        team: &mut TeamRecord,
        state: &mut ParticleState,
        colliders: &[WorldCollider],
        dt: f32,
    ) -> WeftResult<StepResult> {
        let start = Instant::now();

        if let Some((force, mode)) = team.take_force() {
            state.apply_force(force, mode);
        }

        let dt = dt.min(self.config.max_dt);
        if dt <= 0.0 {
            return Ok(StepResult {
                wall_time: start.elapsed().as_secs_f64(),
                ..Default::default()
            });
        }

        state.save_previous();
        state.predict(dt, team.gravity);

        let mut contacts = 0;
        for _ in 0..self.config.iterations {
            Self::project_distances(state);
            for collider in colliders {
                contacts += collider.resolve(state, self.config.collision_margin).resolved_count;
            }
        }

        state.update_velocities(dt);
        state.damp_velocities(team.damping);
        if self.config.max_velocity > 0.0 {
            state.limit_velocities(self.config.max_velocity);
        }

        team.time += dt;
        team.step_count += 1;

        Ok(StepResult {
            iterations: self.config.iterations,
            contacts,
            wall_time: start.elapsed().as_secs_f64(),
        })
    }

    fn name(&self) -> &str {
        "reference"
    }
}
