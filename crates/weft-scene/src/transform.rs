//! Transform hierarchy.
//!
//! Transforms are append-only: a destroyed transform leaves an empty
//! slot behind and its id is never handed out again, so a stale
//! [`TransformId`] can be detected instead of silently aliasing a
//! newer transform.

use serde::{Deserialize, Serialize};
use weft_math::{Pose, Vec3};
use weft_types::TransformId;

/// A single named transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformNode {
    /// Name used for name-based rebinding.
    pub name: String,
    /// Parent transform, `None` for scene roots.
    pub parent: Option<TransformId>,
    /// Child transforms in creation order.
    pub children: Vec<TransformId>,
    /// World-space pose.
    pub pose: Pose,
}

/// Arena of transforms addressed by [`TransformId`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformArena {
    slots: Vec<Option<TransformNode>>,
}

impl TransformArena {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Creates a transform under `parent` (or at the root) with a world pose.
    ///
    /// A parent that is not alive is ignored and the transform becomes a root.
    pub fn create(
        &mut self,
        name: impl Into<String>,
        parent: Option<TransformId>,
        pose: Pose,
    ) -> TransformId {
        let id = TransformId(self.slots.len() as u32);
        let parent = parent.filter(|&p| self.contains(p));
        if let Some(p) = parent {
            if let Some(node) = self.slots[p.index()].as_mut() {
                node.children.push(id);
            }
        }
        self.slots.push(Some(TransformNode {
            name: name.into(),
            parent,
            children: Vec::new(),
            pose,
        }));
        id
    }

    /// Destroys a transform and its whole subtree.
    ///
    /// Returns the number of transforms removed.
    pub fn destroy(&mut self, id: TransformId) -> usize {
        let Some(node) = self.slots.get(id.index()).and_then(|n| n.as_ref()) else {
            return 0;
        };
        if let Some(parent) = node.parent {
            if let Some(p) = self.slots[parent.index()].as_mut() {
                p.children.retain(|&c| c != id);
            }
        }

        let doomed = self.descendants(id);
        for &t in &doomed {
            self.slots[t.index()] = None;
        }
        doomed.len()
    }

    /// Returns true if `id` refers to a live transform.
    #[inline]
    pub fn contains(&self, id: TransformId) -> bool {
        matches!(self.slots.get(id.index()), Some(Some(_)))
    }

    #[inline]
    pub fn get(&self, id: TransformId) -> Option<&TransformNode> {
        self.slots.get(id.index()).and_then(|n| n.as_ref())
    }

    #[inline]
    pub fn get_mut(&mut self, id: TransformId) -> Option<&mut TransformNode> {
        self.slots.get_mut(id.index()).and_then(|n| n.as_mut())
    }

    pub fn name(&self, id: TransformId) -> Option<&str> {
        self.get(id).map(|n| n.name.as_str())
    }

    pub fn pose(&self, id: TransformId) -> Option<Pose> {
        self.get(id).map(|n| n.pose)
    }

    pub fn position(&self, id: TransformId) -> Option<Vec3> {
        self.get(id).map(|n| n.pose.position)
    }

    /// Overwrites the world pose. Returns false for dead transforms.
    pub fn set_pose(&mut self, id: TransformId, pose: Pose) -> bool {
        match self.get_mut(id) {
            Some(node) => {
                node.pose = pose;
                true
            }
            None => false,
        }
    }

    /// Overwrites the world position, keeping rotation and scale.
    pub fn set_position(&mut self, id: TransformId, position: Vec3) -> bool {
        match self.get_mut(id) {
            Some(node) => {
                node.pose.position = position;
                true
            }
            None => false,
        }
    }

    /// Moves a whole subtree by `offset` (world space).
    pub fn translate_subtree(&mut self, root: TransformId, offset: Vec3) {
        for t in self.descendants(root) {
            if let Some(node) = self.get_mut(t) {
                node.pose.position += offset;
            }
        }
    }

    pub fn children(&self, id: TransformId) -> &[TransformId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Depth-first pre-order walk starting at (and including) `root`.
    pub fn descendants(&self, root: TransformId) -> Vec<TransformId> {
        let mut out = Vec::new();
        if !self.contains(root) {
            return out;
        }
        let mut stack = vec![root];
        while let Some(t) = stack.pop() {
            out.push(t);
            // Reverse so the first child is visited first.
            for &c in self.children(t).iter().rev() {
                stack.push(c);
            }
        }
        out
    }

    /// Finds the first live transform (lowest id) with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<TransformId> {
        self.slots.iter().enumerate().find_map(|(i, n)| match n {
            Some(node) if node.name == name => Some(TransformId(i as u32)),
            _ => None,
        })
    }

    /// Number of live transforms.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
