//! Scene: everything the host application owns.

use crate::mesh::MeshStore;
use crate::renderer::RendererSet;
use crate::transform::TransformArena;

/// The host objects cloth instances read from and write to.
///
/// `playing` mirrors the host's play mode: cloth instances only
/// initialize and build while the host is in an active simulation
/// context.
#[derive(Debug, Clone)]
pub struct Scene {
    pub transforms: TransformArena,
    pub meshes: MeshStore,
    pub renderers: RendererSet,
    playing: bool,
}

impl Scene {
    /// Creates an empty scene in play mode.
    pub fn new() -> Self {
        Self {
            transforms: TransformArena::new(),
            meshes: MeshStore::new(),
            renderers: RendererSet::new(),
            playing: true,
        }
    }

    /// Creates an empty scene outside play mode (edit-time).
    pub fn editing() -> Self {
        Self {
            playing: false,
            ..Self::new()
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
