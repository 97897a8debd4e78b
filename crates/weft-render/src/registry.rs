//! Render/Binding Registry.
//!
//! Lifecycle of an entry:
//!
//! ```text
//! add_renderer      → entry created (ref_count 1) or ref_count += 1
//! bind_custom_mesh  → custom mesh + custom bone list installed on the renderer
//! unbind_custom_mesh→ original mesh + bones restored, custom mesh discarded
//! remove_renderer   → ref_count -= 1, entry unbound and dropped at zero
//! ```

use std::collections::HashMap;

use weft_scene::mesh::MAX_INFLUENCES;
use weft_scene::Scene;
use weft_types::{MeshId, RenderHandle, TransformId, WeftError, WeftResult};

use crate::binding::RenderBinding;

/// Registry of renderers driven by cloth instances.
#[derive(Debug, Default)]
pub struct RenderRegistry {
    bindings: HashMap<RenderHandle, RenderBinding>,
}

impl RenderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a cloth's interest in `handle`.
    ///
    /// The first registration snapshots the renderer's mesh and bones and
    /// derives the custom bone list; later ones only bump the count.
    pub fn add_renderer(&mut self, handle: RenderHandle, scene: &Scene) -> WeftResult<()> {
        if let Some(binding) = self.bindings.get_mut(&handle) {
            binding.ref_count += 1;
            return Ok(());
        }

        let renderer = scene
            .renderers
            .get(handle)
            .ok_or_else(|| WeftError::UnknownHandle(format!("{handle} is not in the scene")))?;
        let mesh = scene.meshes.get(renderer.mesh).ok_or_else(|| {
            WeftError::InvalidMesh(format!("{handle} draws a mesh that no longer exists"))
        })?;
        mesh.validate()?;
        if mesh.bone_count != renderer.bones.len() {
            return Err(WeftError::InvalidMesh(format!(
                "{}: mesh expects {} bones, renderer has {}",
                renderer.name,
                mesh.bone_count,
                renderer.bones.len()
            )));
        }

        let mask = mesh.skinning_bone_mask();
        let mut transform_list: Vec<Option<TransformId>> = renderer
            .bones
            .iter()
            .zip(&mask)
            .map(|(&bone, &used)| if used { bone } else { None })
            .collect();
        transform_list.push(Some(renderer.transform));

        self.bindings.insert(
            handle,
            RenderBinding {
                handle,
                renderer_transform: renderer.transform,
                original_mesh: renderer.mesh,
                original_bones: renderer.bones.clone(),
                custom_mesh: None,
                transform_list,
                ref_count: 1,
            },
        );
        tracing::debug!(%handle, "renderer registered");
        Ok(())
    }

    /// Drops one reference. At zero the renderer is restored and the entry removed.
    ///
    /// Returns true if the entry was removed.
    pub fn remove_renderer(&mut self, handle: RenderHandle, scene: &mut Scene) -> bool {
        let Some(binding) = self.bindings.get_mut(&handle) else {
            return false;
        };
        binding.ref_count = binding.ref_count.saturating_sub(1);
        if binding.ref_count > 0 {
            return false;
        }
        self.unbind_custom_mesh(handle, scene);
        self.bindings.remove(&handle);
        tracing::debug!(%handle, "renderer released");
        true
    }

    pub fn get_binding(&self, handle: RenderHandle) -> Option<&RenderBinding> {
        self.bindings.get(&handle)
    }

    pub fn contains(&self, handle: RenderHandle) -> bool {
        self.bindings.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Installs the custom mesh and custom bone list on the renderer.
    ///
    /// The custom mesh is a copy of the original whose skin gains one
    /// extra slot (the renderer transform) matching `transform_list`.
    /// Returns `Ok(false)` if already bound.
    pub fn bind_custom_mesh(&mut self, handle: RenderHandle, scene: &mut Scene) -> WeftResult<bool> {
        let binding = self
            .bindings
            .get_mut(&handle)
            .ok_or_else(|| WeftError::UnknownHandle(format!("{handle} is not registered")))?;
        if binding.is_bound() {
            return Ok(false);
        }

        let name = scene
            .meshes
            .get(binding.original_mesh)
            .map(|m| format!("{}_custom", m.name))
            .ok_or_else(|| WeftError::InvalidMesh(format!("{handle}: original mesh is gone")))?;
        let custom = scene
            .meshes
            .duplicate(binding.original_mesh, name)
            .ok_or_else(|| WeftError::InvalidMesh(format!("{handle}: original mesh is gone")))?;
        if let Some(mesh) = scene.meshes.get_mut(custom) {
            mesh.bone_count = binding.transform_list.len();
        }

        let renderer = scene
            .renderers
            .get_mut(handle)
            .ok_or_else(|| WeftError::UnknownHandle(format!("{handle} left the scene")))?;
        renderer.mesh = custom;
        renderer.bones = binding.transform_list.clone();
        binding.custom_mesh = Some(custom);
        tracing::debug!(%handle, mesh = custom.0, "custom mesh bound");
        Ok(true)
    }

    /// Restores the original mesh and bones. Returns true if it was bound.
    pub fn unbind_custom_mesh(&mut self, handle: RenderHandle, scene: &mut Scene) -> bool {
        let Some(binding) = self.bindings.get_mut(&handle) else {
            return false;
        };
        let Some(custom) = binding.custom_mesh.take() else {
            return false;
        };
        if let Some(renderer) = scene.renderers.get_mut(handle) {
            renderer.mesh = binding.original_mesh;
            renderer.bones = binding.original_bones.clone();
        }
        scene.meshes.remove(custom);
        tracing::debug!(%handle, "custom mesh unbound");
        true
    }

    /// Rebakes custom-mesh vertices so they follow the renderer slot only.
    ///
    /// Used for vertices whose positions are written directly by the
    /// simulation; skinning must not move them a second time.
    pub fn bake_simulated_vertices(
        &self,
        handle: RenderHandle,
        vertices: &[usize],
        scene: &mut Scene,
    ) -> WeftResult<()> {
        let binding = self
            .bindings
            .get(&handle)
            .ok_or_else(|| WeftError::UnknownHandle(format!("{handle} is not registered")))?;
        let custom = binding
            .custom_mesh
            .ok_or_else(|| WeftError::InvariantViolation(format!("{handle} is not bound")))?;
        let slot = binding.renderer_slot() as u16;
        let mesh = scene
            .meshes
            .get_mut(custom)
            .ok_or_else(|| WeftError::InvalidMesh(format!("{handle}: custom mesh is gone")))?;
        for &v in vertices {
            if v < mesh.vertex_count() {
                let mut idx = [0u16; MAX_INFLUENCES];
                let mut w = [0.0f32; MAX_INFLUENCES];
                idx[0] = slot;
                w[0] = 1.0;
                mesh.bone_indices[v] = idx;
                mesh.bone_weights[v] = w;
            }
        }
        Ok(())
    }

    /// Mesh currently driven by the simulation for `handle`.
    pub fn custom_mesh(&self, handle: RenderHandle) -> Option<MeshId> {
        self.bindings.get(&handle).and_then(|b| b.custom_mesh)
    }

    /// Substitutes transforms in one binding.
    ///
    /// The renderer's own transform follows the binding; while bound its
    /// installed bone list is refreshed too.
    /// Returns the number of slots changed.
    pub fn replace_transforms(
        &mut self,
        handle: RenderHandle,
        map: &HashMap<TransformId, TransformId>,
        scene: &mut Scene,
    ) -> usize {
        let Some(binding) = self.bindings.get_mut(&handle) else {
            return 0;
        };

        let mut changed = 0;
        let mut swap = |slot: &mut TransformId| {
            if let Some(&new) = map.get(slot) {
                *slot = new;
                changed += 1;
            }
        };
        swap(&mut binding.renderer_transform);
        binding.original_bones.iter_mut().flatten().for_each(&mut swap);
        binding.transform_list.iter_mut().flatten().for_each(&mut swap);

        if let Some(renderer) = scene.renderers.get_mut(handle) {
            renderer.transform = binding.renderer_transform;
            if binding.is_bound() {
                renderer.bones = binding.transform_list.clone();
            }
        }
        changed
    }
}
