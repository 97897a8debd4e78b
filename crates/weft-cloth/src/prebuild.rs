//! Pre-built data: a serialized construction result that lets a cloth
//! skip the runtime build.
//!
//! The blob is a `bincode` encoding of [`PreBuildPayload`]. Its first
//! four bytes are the little-endian format version, so usability can
//! be decided without decoding the rest.

use serde::{Deserialize, Serialize};
use weft_math::Vec3;
use weft_solver::ParticleSeed;
use weft_types::constants::PRE_BUILD_VERSION;
use weft_types::{WeftError, WeftResult};

use crate::selection::SelectionData;

/// Pre-built data attached to a cloth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreBuildData {
    pub enabled: bool,
    #[serde(default)]
    pub blob: Vec<u8>,
}

impl PreBuildData {
    pub fn new(blob: Vec<u8>) -> Self {
        Self {
            enabled: true,
            blob,
        }
    }

    /// Format version stored in the blob header.
    pub fn version(&self) -> Option<u32> {
        let header: [u8; 4] = self.blob.get(..4)?.try_into().ok()?;
        Some(u32::from_le_bytes(header))
    }

    /// Enabled, non-empty and written by the current format version.
    pub fn use_pre_build(&self) -> bool {
        self.enabled && self.version() == Some(PRE_BUILD_VERSION)
    }
}

/// Kind tag stored in a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadKind {
    BoneCloth,
    BoneSpring,
    MeshCloth,
}

/// What a particle is attached to, relative to the cloth's own
/// configuration so a payload survives transform replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnchorRef {
    /// Index into the depth-first bone particle list.
    Bone(u32),
    /// Vertex of the n-th configured renderer.
    Vertex { renderer: u32, vertex: u32 },
}

/// One constructed particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrebuiltParticle {
    pub anchor: AnchorRef,
    pub seed: ParticleSeed,
    /// Rest offset from the parent particle in the cloth frame (bones),
    /// or the vertex position in the renderer's local frame (meshes).
    pub local: Vec3,
}

/// Complete construction result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreBuildPayload {
    /// Must stay the first field: the header is read without decoding.
    pub version: u32,
    pub kind: PayloadKind,
    pub particles: Vec<PrebuiltParticle>,
    pub selection: SelectionData,
}

impl PreBuildPayload {
    pub fn encode(&self) -> WeftResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| WeftError::Serialization(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> WeftResult<Self> {
        let payload: Self =
            bincode::deserialize(bytes).map_err(|e| WeftError::PreBuild(e.to_string()))?;
        if payload.version != PRE_BUILD_VERSION {
            return Err(WeftError::PreBuild(format!(
                "payload version {} (expected {PRE_BUILD_VERSION})",
                payload.version
            )));
        }
        Ok(payload)
    }
}
