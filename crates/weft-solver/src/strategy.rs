//! Solver strategy trait: the seam between the lifecycle layer and
//! the numerical scheme.
//!
//! The scheduler calls [`TeamSolver::step`] once per valid team per
//! tick, after it has consumed the team's reset flags.

use weft_team::TeamRecord;
use weft_types::WeftResult;

use crate::collider::WorldCollider;
use crate::state::ParticleState;

/// Result of a solver step.
#[derive(Debug, Clone, Default)]
pub struct StepResult {
    /// Number of constraint iterations actually performed.
    pub iterations: u32,
    /// Particles pushed out of colliders during the step.
    pub contacts: u32,
    /// Wall-clock time for this step (seconds).
    pub wall_time: f64,
}

/// Trait for per-team time integration.
///
/// ```text
/// for team in teams {
///     solver.step(team, particles, colliders, dt * team.time_scale)?;
/// }
/// ```
///
/// Implementations take the pending force out of the record
/// ([`TeamRecord::take_force`]) so it is applied exactly once. A step
/// with `dt == 0.0` must leave positions unchanged.
pub trait TeamSolver: Send {
    /// Advance one team by `dt` seconds.
    fn step(
        &mut self,
        team: &mut TeamRecord,
        particles: &mut ParticleState,
        colliders: &[WorldCollider],
        dt: f32,
    ) -> WeftResult<StepResult>;

    /// Returns the solver's name.
    fn name(&self) -> &str;
}
