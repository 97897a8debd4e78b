//! Scene declaration types.
//!
//! Everything is referenced by name so files stay stable across runs.
//! They are serializable as JSON or TOML.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use weft_cloth::{ClothParameters, SelectionData};
use weft_math::Vec3;
use weft_solver::{ColliderShape, ColliderSymmetryMode, SolverConfig};

/// A complete scene with its cloths and run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDescription {
    /// Host play mode; cloths only build while playing.
    #[serde(default = "default_playing")]
    pub playing: bool,
    #[serde(default)]
    pub transforms: Vec<TransformDecl>,
    #[serde(default)]
    pub chains: Vec<ChainDecl>,
    #[serde(default)]
    pub sheets: Vec<SheetDecl>,
    #[serde(default)]
    pub cloths: Vec<ClothDecl>,
    #[serde(default)]
    pub simulation: SimulationParams,
}

fn default_playing() -> bool {
    true
}

/// A single named transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformDecl {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub position: Vec3,
}

/// A straight bone chain named `{prefix}{i}`, hanging along -Y.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainDecl {
    pub prefix: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub origin: Vec3,
    pub count: usize,
    pub spacing: f32,
}

impl ChainDecl {
    pub fn bone_names(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.count).map(move |i| format!("{}{i}", self.prefix))
    }
}

/// A skinned sheet: renderer transform `name`, bones `{name}_bone{i}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetDecl {
    pub name: String,
    #[serde(default)]
    pub origin: Vec3,
    pub cols: usize,
    pub rows: usize,
    pub width: f32,
    pub height: f32,
    pub bones: usize,
}

impl SheetDecl {
    pub fn bone_names(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.bones.max(1)).map(move |i| format!("{}_bone{i}", self.name))
    }
}

/// Cloth type with its named targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClothKindDecl {
    BoneCloth { root_bones: Vec<String> },
    BoneSpring { root_bones: Vec<String> },
    MeshCloth { renderers: Vec<String> },
}

/// A collider attached to a named transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColliderDecl {
    pub anchor: String,
    #[serde(default)]
    pub center: Vec3,
    pub shape: ColliderShape,
    #[serde(default)]
    pub symmetry: ColliderSymmetryMode,
    #[serde(default)]
    pub symmetry_target: Option<String>,
}

/// A cloth instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClothDecl {
    pub name: String,
    pub kind: ClothKindDecl,
    pub cloth_transform: String,
    #[serde(default)]
    pub parameters: ClothParameters,
    #[serde(default)]
    pub colliders: Vec<ColliderDecl>,
    #[serde(default)]
    pub selection: Option<SelectionData>,
    /// Pre-built blob file, relative to the scene file.
    #[serde(default)]
    pub pre_build: Option<PathBuf>,
    /// Skip building on start.
    #[serde(default)]
    pub disable_auto_build: bool,
}

/// How long and how finely to run a scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Total simulated time (seconds).
    pub duration: f32,
    /// Tick length (seconds).
    pub dt: f32,
    pub solver: SolverConfig,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            duration: 2.0,
            dt: weft_types::constants::DEFAULT_DT,
            solver: SolverConfig::default(),
        }
    }
}

impl SimulationParams {
    /// Number of ticks needed to cover `duration`.
    pub fn tick_count(&self) -> u32 {
        if self.dt <= 0.0 {
            return 0;
        }
        (self.duration / self.dt).ceil() as u32
    }
}
