//! Strongly-typed identifiers for engine objects.
//!
//! Newtype wrappers prevent accidental mixing of team indices
//! with transform or mesh indices. All of them are plain dense
//! indices into the arena that issued them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a cloth instance in the cloth world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClothId(pub u32);

/// Index into the team data table. Valid only while the owning cloth is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub u32);

/// Index into the transform arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransformId(pub u32);

/// Index into the mesh store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshId(pub u32);

/// Opaque per-surface handle of a skinned renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RenderHandle(pub u32);

impl ClothId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TeamId {
    /// Returns the raw index as `usize` for table indexing.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TransformId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl MeshId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl RenderHandle {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for TeamId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl From<u32> for TransformId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl fmt::Display for ClothId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cloth#{}", self.0)
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team#{}", self.0)
    }
}

impl fmt::Display for TransformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transform#{}", self.0)
    }
}

impl fmt::Display for RenderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "renderer#{}", self.0)
    }
}
