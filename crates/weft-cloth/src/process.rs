//! Cloth process: one cloth instance and its lifecycle state.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use weft_math::{Pose, Vec3};
use weft_solver::ParticleState;
use weft_types::{ClothId, RenderHandle, TeamId, TransformId};

use crate::config::{ClothSerializeData, ClothSerializeData2};

bitflags! {
    /// Lifecycle flags of a cloth instance.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ProcessFlags: u32 {
        /// Do not build when the instance is started.
        const DISABLE_AUTO_BUILD = 1 << 0;
        /// Simulate but do not write results to the scene.
        const SKIP_WRITING = 1 << 1;
        /// Keep simulating while culled.
        const CAMERA_CULLING_KEEP = 1 << 2;
        /// `initialize` has run.
        const INIT_COMPLETE = 1 << 3;
        /// Every driven renderer has its custom mesh installed.
        const RENDERER_USE = 1 << 4;
    }
}

impl Default for ProcessFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Position of an instance in the build pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BuildState {
    #[default]
    Unbuilt,
    Initialized,
    DataGenerated,
    SelectionReady,
    /// Runtime build queued for the next build phase.
    Building,
    Built,
    /// Only observable inside a failing attempt.
    Failed,
}

/// Configuration resolved against the scene at build time.
#[derive(Debug, Clone)]
pub struct ClothInitData {
    pub cloth_transform: TransformId,
    /// Bone particles in depth-first order (empty for mesh cloth).
    pub bones: Vec<TransformId>,
    pub renderers: Vec<RenderHandle>,
    pub collider_anchors: Vec<TransformId>,
}

/// What a simulated particle drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleAnchor {
    Transform(TransformId),
    Vertex { renderer: RenderHandle, vertex: usize },
}

/// Simulation data of a built instance.
#[derive(Debug, Clone)]
pub struct ClothRuntime {
    pub particles: ParticleState,
    pub anchors: Vec<ParticleAnchor>,
    /// See [`PrebuiltParticle::local`](crate::prebuild::PrebuiltParticle::local).
    pub local: Vec<Vec3>,
}

impl ClothRuntime {
    /// Recomputes base positions from the current scene pose.
    ///
    /// Fixed bone particles follow their transform. Free bone particles
    /// hang off their parent's base at the stored rest offset, rotated
    /// with the cloth frame. Vertex particles follow their renderer.
    pub fn update_base(&mut self, root: &Pose, scene: &weft_scene::Scene) {
        for i in 0..self.particles.count {
            let base = match self.anchors[i] {
                ParticleAnchor::Transform(t) if self.particles.is_fixed(i) => {
                    match scene.transforms.position(t) {
                        Some(p) => p,
                        None => continue,
                    }
                }
                ParticleAnchor::Transform(_) => match self.particles.parent[i] {
                    Some(p) => self.particles.base(p as usize) + root.rotation * self.local[i],
                    None => root.transform_point(self.local[i]),
                },
                ParticleAnchor::Vertex { renderer, .. } => {
                    let Some(pose) = scene
                        .renderers
                        .get(renderer)
                        .and_then(|r| scene.transforms.pose(r.transform))
                    else {
                        continue;
                    };
                    pose.transform_point(self.local[i])
                }
            };
            self.particles.set_base(i, base);
        }
    }

    /// Transform anchors in particle order.
    pub fn transforms(&self) -> impl Iterator<Item = TransformId> + '_ {
        self.anchors.iter().filter_map(|a| match a {
            ParticleAnchor::Transform(t) => Some(*t),
            ParticleAnchor::Vertex { .. } => None,
        })
    }
}

/// One cloth instance.
#[derive(Debug, Clone)]
pub struct ClothProcess {
    pub id: ClothId,
    pub serialize_data: ClothSerializeData,
    pub serialize_data2: ClothSerializeData2,
    pub state: BuildState,
    pub flags: ProcessFlags,
    /// Assigned on successful build.
    pub team_id: Option<TeamId>,
    pub init: Option<ClothInitData>,
    pub runtime: Option<ClothRuntime>,
    /// Renderers registered with the render registry by this instance.
    pub renderers: Vec<RenderHandle>,
    /// Incremented by every build attempt; stale queued builds are dropped.
    pub attempt: u32,
}

impl ClothProcess {
    pub fn new(id: ClothId, serialize_data: ClothSerializeData, serialize_data2: ClothSerializeData2) -> Self {
        Self {
            id,
            serialize_data,
            serialize_data2,
            state: BuildState::Unbuilt,
            flags: ProcessFlags::empty(),
            team_id: None,
            init: None,
            runtime: None,
            renderers: Vec::new(),
            attempt: 0,
        }
    }

    #[inline]
    pub fn is_built(&self) -> bool {
        self.state == BuildState::Built
    }

    #[inline]
    pub fn is_building(&self) -> bool {
        self.state == BuildState::Building
    }

    /// Drops generated data and returns to `Unbuilt`.
    pub(crate) fn discard_generated(&mut self) {
        self.init = None;
        self.runtime = None;
        self.state = BuildState::Unbuilt;
        self.flags.remove(ProcessFlags::INIT_COMPLETE);
    }
}
