//! Skinned triangle mesh with SoA (Structure of Arrays) layout.
//!
//! Positions are stored per channel:
//! - `pos_x: [x0, x1, x2, ...]`
//! - `pos_y: [y0, y1, y2, ...]`
//! - `pos_z: [z0, z1, z2, ...]`
//!
//! Positions are in the owning renderer's local space. Each vertex
//! carries up to four `(bone index, weight)` influences; bone indices
//! refer to slots of the renderer's bone list.

use serde::{Deserialize, Serialize};
use weft_math::Vec3;
use weft_types::{MeshId, WeftError, WeftResult};

/// Maximum bone influences per vertex.
pub const MAX_INFLUENCES: usize = 4;

/// A skinned triangle mesh stored in Structure-of-Arrays layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkinnedMesh {
    /// Mesh name, for diagnostics.
    pub name: String,

    // --- Vertex data (SoA) ---
    pub pos_x: Vec<f32>,
    pub pos_y: Vec<f32>,
    pub pos_z: Vec<f32>,

    /// Bone slot indices, four per vertex.
    pub bone_indices: Vec<[u16; MAX_INFLUENCES]>,
    /// Bone weights matching `bone_indices`. Zero weight = unused influence.
    pub bone_weights: Vec<[f32; MAX_INFLUENCES]>,

    /// Number of bind poses baked into the mesh (length of the bone list it expects).
    pub bone_count: usize,

    // --- Triangle data ---
    /// Triangle indices, stored flat: `[t0v0, t0v1, t0v2, t1v0, ...]`.
    pub indices: Vec<u32>,
}

impl SkinnedMesh {
    /// Returns the number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos_x.len()
    }

    /// Returns the number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn position(&self, i: usize) -> Vec3 {
        Vec3::new(self.pos_x[i], self.pos_y[i], self.pos_z[i])
    }

    #[inline]
    pub fn set_position(&mut self, i: usize, p: Vec3) {
        self.pos_x[i] = p.x;
        self.pos_y[i] = p.y;
        self.pos_z[i] = p.z;
    }

    /// Creates an empty mesh with pre-allocated capacity.
    pub fn with_capacity(name: impl Into<String>, vertex_capacity: usize, triangle_capacity: usize) -> Self {
        Self {
            name: name.into(),
            pos_x: Vec::with_capacity(vertex_capacity),
            pos_y: Vec::with_capacity(vertex_capacity),
            pos_z: Vec::with_capacity(vertex_capacity),
            bone_indices: Vec::with_capacity(vertex_capacity),
            bone_weights: Vec::with_capacity(vertex_capacity),
            bone_count: 0,
            indices: Vec::with_capacity(triangle_capacity * 3),
        }
    }

    /// Marks which bone slots carry at least one non-zero weight.
    ///
    /// The returned mask has length `bone_count`.
    pub fn skinning_bone_mask(&self) -> Vec<bool> {
        let mut used = vec![false; self.bone_count];
        for (idx, w) in self.bone_indices.iter().zip(&self.bone_weights) {
            for k in 0..MAX_INFLUENCES {
                if w[k] > 0.0 {
                    if let Some(slot) = used.get_mut(idx[k] as usize) {
                        *slot = true;
                    }
                }
            }
        }
        used
    }

    /// Validates mesh integrity.
    ///
    /// Checks:
    /// - All SoA arrays have the same length
    /// - Triangle indices are within bounds
    /// - Weighted bone indices are below `bone_count`
    pub fn validate(&self) -> WeftResult<()> {
        let n = self.pos_x.len();

        if self.pos_y.len() != n || self.pos_z.len() != n {
            return Err(WeftError::InvalidMesh(format!(
                "{}: position arrays have inconsistent lengths",
                self.name
            )));
        }
        if self.bone_indices.len() != n || self.bone_weights.len() != n {
            return Err(WeftError::InvalidMesh(format!(
                "{}: skin arrays ({}, {}) != vertex count ({})",
                self.name,
                self.bone_indices.len(),
                self.bone_weights.len(),
                n
            )));
        }

        if self.indices.len() % 3 != 0 {
            return Err(WeftError::InvalidMesh(format!(
                "{}: index count is not divisible by 3",
                self.name
            )));
        }
        if let Some((i, &idx)) = self.indices.iter().enumerate().find(|(_, idx)| **idx as usize >= n) {
            return Err(WeftError::InvalidMesh(format!(
                "{}: index {} at position {} is out of range (vertex count: {})",
                self.name, idx, i, n
            )));
        }

        for (v, (idx, w)) in self.bone_indices.iter().zip(&self.bone_weights).enumerate() {
            for k in 0..MAX_INFLUENCES {
                if w[k] > 0.0 && idx[k] as usize >= self.bone_count {
                    return Err(WeftError::InvalidMesh(format!(
                        "{}: vertex {} references bone slot {} (bone count: {})",
                        self.name, v, idx[k], self.bone_count
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Arena of meshes addressed by [`MeshId`].
///
/// Ids are never reused after removal.
#[derive(Debug, Clone, Default)]
pub struct MeshStore {
    slots: Vec<Option<SkinnedMesh>>,
}

impl MeshStore {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn insert(&mut self, mesh: SkinnedMesh) -> MeshId {
        let id = MeshId(self.slots.len() as u32);
        self.slots.push(Some(mesh));
        id
    }

    pub fn get(&self, id: MeshId) -> Option<&SkinnedMesh> {
        self.slots.get(id.index()).and_then(|m| m.as_ref())
    }

    pub fn get_mut(&mut self, id: MeshId) -> Option<&mut SkinnedMesh> {
        self.slots.get_mut(id.index()).and_then(|m| m.as_mut())
    }

    pub fn remove(&mut self, id: MeshId) -> Option<SkinnedMesh> {
        self.slots.get_mut(id.index()).and_then(|m| m.take())
    }

    /// Clones an existing mesh into a new slot with a new name.
    pub fn duplicate(&mut self, id: MeshId, name: impl Into<String>) -> Option<MeshId> {
        let mut copy = self.get(id)?.clone();
        copy.name = name.into();
        Some(self.insert(copy))
    }

    /// Number of live meshes.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|m| m.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
