//! Collider shapes and their world-space resolution.
//!
//! Colliders are declared in cloth configuration and resolved into
//! [`WorldCollider`]s once per tick. Resolution only pushes particles
//! out of the shape; there is no friction model or continuous detection.

use serde::{Deserialize, Serialize};
use weft_math::{Pose, Vec3};

use crate::state::ParticleState;

/// Collider geometry in the anchor's local frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ColliderShape {
    /// Infinite plane through the center, facing the anchor's +Y.
    Plane,
    /// Sphere around the center.
    Sphere { radius: f32 },
}

/// How a collider is mirrored onto the opposite side of the cloth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[repr(u16)]
pub enum ColliderSymmetryMode {
    #[default]
    None = 0,
    AutomaticHumanBody = 1,
    AutomaticTarget = 2,
    XSymmetry = 100,
    YSymmetry = 101,
    ZSymmetry = 102,
    XYZSymmetry = 200,
}

impl ColliderSymmetryMode {
    /// Whether the symmetry target transform takes part in the mirror.
    pub fn requires_target(self) -> bool {
        self >= ColliderSymmetryMode::AutomaticTarget
    }

    /// Mirrors a world point through the symmetry frame.
    ///
    /// Returns `None` when the mode produces no mirrored copy.
    pub fn mirror_point(self, point: Vec3, frame: &Pose) -> Option<Vec3> {
        let flip = match self {
            Self::None => return None,
            Self::AutomaticHumanBody | Self::AutomaticTarget | Self::XSymmetry => {
                Vec3::new(-1.0, 1.0, 1.0)
            }
            Self::YSymmetry => Vec3::new(1.0, -1.0, 1.0),
            Self::ZSymmetry => Vec3::new(1.0, 1.0, -1.0),
            Self::XYZSymmetry => Vec3::splat(-1.0),
        };
        let local = frame.inverse_transform_point(point);
        Some(frame.transform_point(local * flip))
    }

    /// Mirrors a world direction through the symmetry frame.
    pub fn mirror_direction(self, dir: Vec3, frame: &Pose) -> Vec3 {
        let flip = match self {
            Self::None => return dir,
            Self::AutomaticHumanBody | Self::AutomaticTarget | Self::XSymmetry => {
                Vec3::new(-1.0, 1.0, 1.0)
            }
            Self::YSymmetry => Vec3::new(1.0, -1.0, 1.0),
            Self::ZSymmetry => Vec3::new(1.0, 1.0, -1.0),
            Self::XYZSymmetry => Vec3::splat(-1.0),
        };
        let local = frame.rotation.inverse() * dir;
        (frame.rotation * (local * flip)).normalize_or_zero()
    }
}

/// A collider placed in world space for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldCollider {
    pub shape: ColliderShape,
    pub center: Vec3,
    /// Plane normal; ignored for spheres.
    pub normal: Vec3,
}

/// Per-collider resolution statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactResult {
    pub resolved_count: u32,
    pub max_penetration: f32,
}

impl WorldCollider {
    /// Places a collider declared relative to `anchor`.
    pub fn from_anchor(shape: ColliderShape, anchor: &Pose, local_center: Vec3) -> Self {
        Self {
            shape,
            center: anchor.transform_point(local_center),
            normal: (anchor.rotation * Vec3::Y).normalize_or_zero(),
        }
    }

    /// Mirrored copy of this collider, if the mode produces one.
    pub fn mirrored(&self, mode: ColliderSymmetryMode, frame: &Pose) -> Option<Self> {
        let center = mode.mirror_point(self.center, frame)?;
        Some(Self {
            shape: self.shape,
            center,
            normal: mode.mirror_direction(self.normal, frame),
        })
    }

    /// Pushes free particles out of the collider, keeping `margin` clearance.
    pub fn resolve(&self, state: &mut ParticleState, margin: f32) -> ContactResult {
        let mut result = ContactResult::default();

        for i in 0..state.count {
            if state.is_fixed(i) {
                continue;
            }
            let p = state.position(i);
            let push = match self.shape {
                ColliderShape::Plane => {
                    let depth = margin - (p - self.center).dot(self.normal);
                    (depth > 0.0).then(|| (self.normal * depth, depth))
                }
                ColliderShape::Sphere { radius } => {
                    let d = p - self.center;
                    let dist = d.length();
                    let depth = radius + margin - dist;
                    if depth > 0.0 {
                        // A particle exactly at the center is pushed up.
                        let dir = if dist > 1e-6 { d / dist } else { Vec3::Y };
                        Some((dir * depth, depth))
                    } else {
                        None
                    }
                }
            };

            if let Some((offset, depth)) = push {
                state.set_position(i, p + offset);
                result.resolved_count += 1;
                result.max_penetration = result.max_penetration.max(depth);
            }
        }

        result
    }
}
