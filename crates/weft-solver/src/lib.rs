//! # weft-solver
//!
//! The contract between the cloth lifecycle layer and the numerical
//! solver, plus a reference implementation.
//!
//! ## Key Types
//!
//! - [`ParticleState`]: SoA buffers for positions, velocities, base pose
//! - [`TeamSolver`]: Pluggable per-team step
//! - [`SolverConfig`]: Solver-wide configuration
//! - [`ReferenceSolver`]: Verlet integration with parent-distance constraints
//! - [`collider`]: Collider shapes, symmetry modes, world-space resolution

pub mod collider;
pub mod config;
pub mod reference;
pub mod state;
pub mod strategy;

pub use collider::{ColliderShape, ColliderSymmetryMode, WorldCollider};
pub use config::SolverConfig;
pub use reference::ReferenceSolver;
pub use state::{ParticleSeed, ParticleState};
pub use strategy::{StepResult, TeamSolver};
