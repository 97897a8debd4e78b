//! Skinned-mesh renderers.
//!
//! A renderer draws one mesh deformed by an ordered bone list. The
//! bone list is positional: slot `i` feeds the weights with bone index
//! `i` baked into the mesh, so entries may be blank but never shift.

use serde::{Deserialize, Serialize};
use weft_types::{MeshId, RenderHandle, TransformId};

/// A skinned-mesh renderer as seen by the cloth system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Renderer {
    pub name: String,
    /// The renderer's own transform.
    pub transform: TransformId,
    /// Currently drawn mesh.
    pub mesh: MeshId,
    /// Currently installed bone list.
    pub bones: Vec<Option<TransformId>>,
}

impl Renderer {
    pub fn new(name: impl Into<String>, transform: TransformId, mesh: MeshId, bones: Vec<TransformId>) -> Self {
        Self {
            name: name.into(),
            transform,
            mesh,
            bones: bones.into_iter().map(Some).collect(),
        }
    }
}

/// Arena of renderers addressed by [`RenderHandle`].
#[derive(Debug, Clone, Default)]
pub struct RendererSet {
    slots: Vec<Option<Renderer>>,
}

impl RendererSet {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn add(&mut self, renderer: Renderer) -> RenderHandle {
        let handle = RenderHandle(self.slots.len() as u32);
        self.slots.push(Some(renderer));
        handle
    }

    pub fn get(&self, handle: RenderHandle) -> Option<&Renderer> {
        self.slots.get(handle.index()).and_then(|r| r.as_ref())
    }

    pub fn get_mut(&mut self, handle: RenderHandle) -> Option<&mut Renderer> {
        self.slots.get_mut(handle.index()).and_then(|r| r.as_mut())
    }

    pub fn remove(&mut self, handle: RenderHandle) -> Option<Renderer> {
        self.slots.get_mut(handle.index()).and_then(|r| r.take())
    }

    pub fn find_by_name(&self, name: &str) -> Option<RenderHandle> {
        self.slots.iter().enumerate().find_map(|(i, r)| match r {
            Some(ren) if ren.name == name => Some(RenderHandle(i as u32)),
            _ => None,
        })
    }
}
