//! Transform binding layer: which transforms an instance uses, and
//! swapping them for others by name.

use std::collections::{HashMap, HashSet};

use tracing::debug;
use weft_telemetry::EventKind;
use weft_types::{ClothId, TransformId};

use crate::process::ParticleAnchor;
use crate::selection::bone_particles;
use crate::world::ClothWorld;

impl ClothWorld {
    /// Every transform the instance references, first occurrence kept.
    ///
    /// Order: cloth transform, root bones, particle anchors, collider
    /// anchors, symmetry targets, then per renderer its transform and
    /// bone lists.
    pub fn collect_used_transforms(&self, id: ClothId) -> Vec<TransformId> {
        let Some(process) = self.process(id) else {
            return Vec::new();
        };
        let data = &process.serialize_data;

        let mut used = vec![data.cloth_transform];
        used.extend_from_slice(data.kind.root_bones());
        match &process.runtime {
            Some(runtime) => used.extend(runtime.transforms()),
            None => used.extend(bone_particles(&self.scene.transforms, data.kind.root_bones())),
        }
        used.extend(data.colliders.iter().map(|c| c.anchor));
        used.extend(data.colliders.iter().filter_map(|c| c.effective_target()));
        for &handle in data.kind.renderers() {
            if let Some(binding) = self.registry.get_binding(handle) {
                used.extend(binding.transforms());
            } else if let Some(renderer) = self.scene.renderers.get(handle) {
                used.push(renderer.transform);
                used.extend(renderer.bones.iter().flatten().copied());
            }
        }

        let mut seen = HashSet::with_capacity(used.len());
        used.retain(|t| seen.insert(*t));
        used
    }

    /// Substitutes used transforms by name.
    ///
    /// Each used transform whose name is a key of `renaming` is replaced
    /// by the mapped transform everywhere the instance refers to it.
    /// Used transforms sharing a name all map to that one replacement.
    /// Returns the number of transforms substituted.
    pub fn replace_transforms(&mut self, id: ClothId, renaming: &HashMap<String, TransformId>) -> usize {
        if renaming.is_empty() {
            return 0;
        }
        let map: HashMap<TransformId, TransformId> = self
            .collect_used_transforms(id)
            .into_iter()
            .filter_map(|old| {
                let name = self.scene.transforms.name(old)?;
                let &new = renaming.get(name)?;
                (new != old).then_some((old, new))
            })
            .collect();
        if map.is_empty() {
            return 0;
        }

        let swap = |t: &mut TransformId| {
            if let Some(&new) = map.get(t) {
                *t = new;
            }
        };
        let Some(process) = self.cloths.get_mut(id.index()).and_then(Option::as_mut) else {
            return 0;
        };

        let data = &mut process.serialize_data;
        swap(&mut data.cloth_transform);
        if let Some(roots) = data.kind.root_bones_mut() {
            roots.iter_mut().for_each(swap);
        }
        for collider in &mut data.colliders {
            swap(&mut collider.anchor);
            if let Some(target) = collider.symmetry_target.as_mut() {
                swap(target);
            }
        }
        if let Some(init) = process.init.as_mut() {
            swap(&mut init.cloth_transform);
            init.bones.iter_mut().for_each(swap);
            init.collider_anchors.iter_mut().for_each(swap);
        }
        if let Some(runtime) = process.runtime.as_mut() {
            for anchor in &mut runtime.anchors {
                if let ParticleAnchor::Transform(t) = anchor {
                    swap(t);
                }
            }
        }

        for &handle in &process.renderers {
            self.registry.replace_transforms(handle, &map, &mut self.scene);
        }

        let replaced = map.len();
        self.emit(EventKind::TransformsReplaced {
            cloth: id,
            replaced: replaced as u32,
        });
        debug!(cloth = %id, replaced, "transforms replaced");
        replaced
    }
}
