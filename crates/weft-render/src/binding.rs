//! Render binding record.

use serde::{Deserialize, Serialize};
use weft_types::{MeshId, RenderHandle, TransformId};

/// Everything the registry knows about one driven renderer.
///
/// `transform_list` mirrors the bone indices baked into `custom_mesh`:
/// it is `original_bones` with skinning-irrelevant slots blanked to
/// `None` and the renderer's own transform appended as the last slot.
/// Slots are never inserted or removed, only blanked or substituted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderBinding {
    pub handle: RenderHandle,
    /// The renderer's own transform.
    pub renderer_transform: TransformId,
    /// Mesh the renderer had before any cloth touched it.
    pub original_mesh: MeshId,
    /// Bone list the renderer had before any cloth touched it.
    pub original_bones: Vec<Option<TransformId>>,
    /// Simulation-driven mesh while bound.
    pub custom_mesh: Option<MeshId>,
    /// Custom bone list, see type docs.
    pub transform_list: Vec<Option<TransformId>>,
    /// Number of cloth instances holding this binding.
    pub ref_count: u32,
}

impl RenderBinding {
    /// True while the custom mesh is installed on the renderer.
    #[inline]
    pub fn is_bound(&self) -> bool {
        self.custom_mesh.is_some()
    }

    /// Slot index of the renderer transform in `transform_list`.
    #[inline]
    pub fn renderer_slot(&self) -> usize {
        self.transform_list.len() - 1
    }

    /// Every transform this binding references, in slot order, renderer first.
    pub fn transforms(&self) -> impl Iterator<Item = TransformId> + '_ {
        std::iter::once(self.renderer_transform)
            .chain(self.original_bones.iter().flatten().copied())
            .chain(self.transform_list.iter().flatten().copied())
    }
}
