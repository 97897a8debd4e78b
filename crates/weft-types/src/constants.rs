//! Physical constants and simulation defaults.

/// Gravitational acceleration (m/s²).
pub const GRAVITY: f32 = 9.81;

/// Default simulation timestep (seconds). 1/90th of a second.
pub const DEFAULT_DT: f32 = 1.0 / 90.0;

/// Time scale of a freshly allocated team.
pub const DEFAULT_TIME_SCALE: f32 = 1.0;

/// Time scale reported for instances that are not built.
pub const NEUTRAL_TIME_SCALE: f32 = 1.0;

/// Format version written into pre-built data headers.
///
/// Blobs carrying any other version are treated as unusable and the
/// build falls back to runtime construction.
pub const PRE_BUILD_VERSION: u32 = 3;

/// Default particle mass (kg).
pub const DEFAULT_PARTICLE_MASS: f32 = 0.01;

/// Default collision margin for plane colliders (meters).
pub const DEFAULT_COLLISION_MARGIN: f32 = 0.002;
