//! Per-particle selection attributes.

use serde::{Deserialize, Serialize};
use weft_scene::TransformArena;
use weft_types::TransformId;

/// Role of a particle in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VertexAttribute {
    /// Follows the animated pose.
    Fixed,
    /// Simulated and written back.
    Move,
    /// Follows the animated pose and is never written.
    Ignore,
}

/// Attributes for every particle of a cloth, in particle order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionData {
    pub attributes: Vec<VertexAttribute>,
    /// Set when a user painted the selection; generation never overwrites it.
    pub user_edit: bool,
}

impl SelectionData {
    pub fn new(attributes: Vec<VertexAttribute>, user_edit: bool) -> Self {
        Self {
            attributes,
            user_edit,
        }
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Usable for a cloth with `particle_count` particles.
    pub fn is_valid_for(&self, particle_count: usize) -> bool {
        particle_count > 0 && self.attributes.len() == particle_count
    }

    pub fn count(&self, attribute: VertexAttribute) -> usize {
        self.attributes.iter().filter(|&&a| a == attribute).count()
    }

    /// Default selection for bone chains: roots fixed, descendants move.
    ///
    /// `particles` is the depth-first particle order produced by
    /// [`bone_particles`]. Returns `None` if there are no particles.
    pub fn for_bones(
        roots: &[TransformId],
        particles: &[TransformId],
    ) -> Option<Self> {
        if particles.is_empty() {
            return None;
        }
        let attributes = particles
            .iter()
            .map(|t| {
                if roots.contains(t) {
                    VertexAttribute::Fixed
                } else {
                    VertexAttribute::Move
                }
            })
            .collect();
        Some(Self::new(attributes, false))
    }
}

/// Depth-first particle order of a set of root bones.
///
/// Each root contributes itself and its descendants. A transform
/// reachable from two roots is listed once, under the first.
pub fn bone_particles(arena: &TransformArena, roots: &[TransformId]) -> Vec<TransformId> {
    let mut out: Vec<TransformId> = Vec::new();
    for &root in roots {
        for t in arena.descendants(root) {
            if !out.contains(&t) {
                out.push(t);
            }
        }
    }
    out
}
