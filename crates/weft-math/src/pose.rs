//! World-space pose of a transform.
//!
//! A pose is stored decomposed (position, rotation, scale) so that
//! writeback can replace the translation of a bone without touching
//! its orientation.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position, rotation and scale of a transform in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    /// The identity pose at the origin.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Creates an unrotated, unscaled pose at `position`.
    #[inline]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Converts to a 4x4 affine matrix.
    #[inline]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Maps a point from this pose's local space into world space.
    #[inline]
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * (self.scale * local)
    }

    /// Maps a world-space point into this pose's local space.
    ///
    /// Zero scale components are treated as one so the result stays finite.
    pub fn inverse_transform_point(&self, world: Vec3) -> Vec3 {
        let safe = Vec3::select(self.scale.cmpeq(Vec3::ZERO), Vec3::ONE, self.scale);
        (self.rotation.inverse() * (world - self.position)) / safe
    }

    /// Rotates a local direction into world space (scale ignored).
    #[inline]
    pub fn transform_direction(&self, local: Vec3) -> Vec3 {
        self.rotation * local
    }
}
