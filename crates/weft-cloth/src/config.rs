//! Cloth configuration records.
//!
//! [`ClothSerializeData`] is what a user declares. [`ClothSerializeData2`]
//! is system-managed data attached to the same instance (painted
//! selection, pre-built blob).

use serde::{Deserialize, Serialize};
use weft_math::Vec3;
use weft_solver::{ColliderShape, ColliderSymmetryMode};
use weft_types::{RenderHandle, TransformId, WeftError, WeftResult};

use crate::prebuild::PreBuildData;
use crate::selection::SelectionData;

/// What a cloth instance simulates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClothKind {
    /// Bone chains simulated as cloth.
    BoneCloth { root_bones: Vec<TransformId> },
    /// Bone chains simulated as springs.
    BoneSpring { root_bones: Vec<TransformId> },
    /// Skinned mesh vertices simulated directly.
    MeshCloth { renderers: Vec<RenderHandle> },
}

impl ClothKind {
    /// True for the bone-driven variants.
    pub fn is_bone(&self) -> bool {
        !matches!(self, ClothKind::MeshCloth { .. })
    }

    pub fn root_bones(&self) -> &[TransformId] {
        match self {
            ClothKind::BoneCloth { root_bones } | ClothKind::BoneSpring { root_bones } => root_bones,
            ClothKind::MeshCloth { .. } => &[],
        }
    }

    pub fn renderers(&self) -> &[RenderHandle] {
        match self {
            ClothKind::MeshCloth { renderers } => renderers,
            _ => &[],
        }
    }

    pub(crate) fn root_bones_mut(&mut self) -> Option<&mut Vec<TransformId>> {
        match self {
            ClothKind::BoneCloth { root_bones } | ClothKind::BoneSpring { root_bones } => Some(root_bones),
            ClothKind::MeshCloth { .. } => None,
        }
    }

    /// Short name used in logs and pre-built headers.
    pub fn label(&self) -> &'static str {
        match self {
            ClothKind::BoneCloth { .. } => "bone_cloth",
            ClothKind::BoneSpring { .. } => "bone_spring",
            ClothKind::MeshCloth { .. } => "mesh_cloth",
        }
    }
}

/// Simulation parameters of one cloth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClothParameters {
    /// Gravity magnitude (m/s²).
    pub gravity: f32,
    /// Gravity direction in world space.
    pub gravity_direction: Vec3,
    /// Velocity damping in `[0, 1]`.
    pub damping: f32,
    /// Mass of every particle (kg).
    pub particle_mass: f32,
    /// Initial time scale in `[0, 1]`.
    pub time_scale: f32,
}

impl Default for ClothParameters {
    fn default() -> Self {
        Self {
            gravity: weft_types::constants::GRAVITY,
            gravity_direction: Vec3::NEG_Y,
            damping: 0.05,
            particle_mass: weft_types::constants::DEFAULT_PARTICLE_MASS,
            time_scale: weft_types::constants::DEFAULT_TIME_SCALE,
        }
    }
}

impl ClothParameters {
    /// Checks every value is finite and in range.
    pub fn validate(&self) -> WeftResult<()> {
        if !self.gravity.is_finite() || self.gravity < 0.0 {
            return Err(WeftError::InvalidConfig(format!(
                "gravity must be a non-negative number, got {}",
                self.gravity
            )));
        }
        if !self.gravity_direction.is_finite()
            || (self.gravity > 0.0 && self.gravity_direction.length_squared() == 0.0)
        {
            return Err(WeftError::InvalidConfig(format!(
                "gravity direction {:?} is unusable",
                self.gravity_direction
            )));
        }
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(WeftError::InvalidConfig(format!(
                "damping must be in [0, 1], got {}",
                self.damping
            )));
        }
        if !self.particle_mass.is_finite() || self.particle_mass <= 0.0 {
            return Err(WeftError::InvalidConfig(format!(
                "particle mass must be positive, got {}",
                self.particle_mass
            )));
        }
        if !(0.0..=1.0).contains(&self.time_scale) {
            return Err(WeftError::InvalidConfig(format!(
                "time scale must be in [0, 1], got {}",
                self.time_scale
            )));
        }
        Ok(())
    }

    /// Gravity as an acceleration vector.
    pub fn gravity_vector(&self) -> Vec3 {
        self.gravity_direction.normalize_or_zero() * self.gravity
    }
}

/// A collider declared on a cloth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColliderDesc {
    /// Transform the collider is attached to.
    pub anchor: TransformId,
    /// Offset from the anchor in its local frame.
    #[serde(default)]
    pub center: Vec3,
    pub shape: ColliderShape,
    #[serde(default)]
    pub symmetry: ColliderSymmetryMode,
    /// Mirror frame; only read when `symmetry.requires_target()`.
    #[serde(default)]
    pub symmetry_target: Option<TransformId>,
}

impl ColliderDesc {
    pub fn new(anchor: TransformId, shape: ColliderShape) -> Self {
        Self {
            anchor,
            center: Vec3::ZERO,
            shape,
            symmetry: ColliderSymmetryMode::None,
            symmetry_target: None,
        }
    }

    /// The symmetry target if the mode uses it.
    pub fn effective_target(&self) -> Option<TransformId> {
        self.symmetry_target.filter(|_| self.symmetry.requires_target())
    }
}

/// User-declared configuration of a cloth instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClothSerializeData {
    pub kind: ClothKind,
    /// Root frame of the cloth; center data is expressed relative to it.
    pub cloth_transform: TransformId,
    #[serde(default)]
    pub parameters: ClothParameters,
    #[serde(default)]
    pub colliders: Vec<ColliderDesc>,
}

impl ClothSerializeData {
    pub fn new(kind: ClothKind, cloth_transform: TransformId) -> Self {
        Self {
            kind,
            cloth_transform,
            parameters: ClothParameters::default(),
            colliders: Vec::new(),
        }
    }
}

/// System-managed data of a cloth instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClothSerializeData2 {
    /// Painted or generated particle attributes.
    pub selection: Option<SelectionData>,
    #[serde(default)]
    pub pre_build: PreBuildData,
}
