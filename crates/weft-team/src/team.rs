//! Team record types.

use serde::{Deserialize, Serialize};
use weft_math::{Quat, Vec3};
use weft_types::ClothId;

use crate::flags::TeamFlags;

/// How a pending external force is applied to particle velocities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ForceMode {
    /// No pending force.
    #[default]
    None,
    /// Add the force to the current velocity, scaled by particle depth.
    VelocityAdd,
    /// Replace the velocity, scaled by particle depth.
    VelocityChange,
    /// Add the force to the current velocity uniformly.
    VelocityAddWithoutDepth,
    /// Replace the velocity uniformly.
    VelocityChangeWithoutDepth,
}

impl ForceMode {
    /// True for the depth-attenuated variants.
    pub fn uses_depth(self) -> bool {
        matches!(self, ForceMode::VelocityAdd | ForceMode::VelocityChange)
    }

    /// True for the variants that overwrite velocity.
    pub fn is_change(self) -> bool {
        matches!(
            self,
            ForceMode::VelocityChange | ForceMode::VelocityChangeWithoutDepth
        )
    }
}

/// Per-team simulation parameters and results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRecord {
    /// Cloth instance that owns this team.
    pub cloth: ClothId,
    /// Simulation speed multiplier in `[0, 1]`.
    pub time_scale: f32,
    /// Pending one-shot force (m/s), applied on the next tick.
    pub impact_force: Vec3,
    /// Application mode of `impact_force`.
    pub force_mode: ForceMode,
    pub flags: TeamFlags,
    /// Simulated time since the last time reset (seconds).
    pub time: f32,
    /// Number of completed simulation steps.
    pub step_count: u32,
    /// Gravity (m/s²) applied to this team.
    pub gravity: Vec3,
    /// Velocity damping in `[0, 1]`.
    pub damping: f32,
}

impl TeamRecord {
    pub fn new(cloth: ClothId) -> Self {
        Self {
            cloth,
            time_scale: weft_types::constants::DEFAULT_TIME_SCALE,
            impact_force: Vec3::ZERO,
            force_mode: ForceMode::None,
            flags: TeamFlags::VALID,
            time: 0.0,
            step_count: 0,
            gravity: Vec3::new(0.0, -weft_types::constants::GRAVITY, 0.0),
            damping: 0.05,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.flags.contains(TeamFlags::VALID)
    }

    /// Sets the time scale, clamped to `[0, 1]`. NaN maps to 0.
    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.time_scale = if time_scale.is_nan() {
            0.0
        } else {
            time_scale.clamp(0.0, 1.0)
        };
    }

    /// Overwrites the pending force slot.
    pub fn set_force(&mut self, force: Vec3, mode: ForceMode) {
        self.impact_force = force;
        self.force_mode = mode;
    }

    /// Takes the pending force, leaving the slot empty.
    pub fn take_force(&mut self) -> Option<(Vec3, ForceMode)> {
        match self.force_mode {
            ForceMode::None => None,
            mode => {
                let force = self.impact_force;
                self.impact_force = Vec3::ZERO;
                self.force_mode = ForceMode::None;
                Some((force, mode))
            }
        }
    }
}

/// Center-of-mass frame of a team.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CenterData {
    /// World position of the cloth's root frame.
    pub frame_world_position: Vec3,
    /// World rotation of the cloth's root frame.
    pub frame_world_rotation: Quat,
    /// Root frame position at the previous tick (teleport detection).
    pub old_frame_world_position: Vec3,
    /// Center of mass expressed in the root frame.
    pub frame_local_position: Vec3,
}

impl Default for CenterData {
    fn default() -> Self {
        Self {
            frame_world_position: Vec3::ZERO,
            frame_world_rotation: Quat::IDENTITY,
            old_frame_world_position: Vec3::ZERO,
            frame_local_position: Vec3::ZERO,
        }
    }
}
