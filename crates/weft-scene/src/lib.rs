//! # weft-scene
//!
//! The host-side objects a cloth instance binds to: a transform
//! hierarchy, skinned meshes, and skinned-mesh renderers.
//!
//! ## Key Types
//!
//! - [`TransformArena`]: Named transforms with parent/child links and world poses.
//! - [`SkinnedMesh`]: SoA vertex positions plus up to four bone weights per vertex.
//! - [`MeshStore`]: Mesh arena addressed by [`MeshId`](weft_types::MeshId).
//! - [`RendererSet`]: Skinned renderers addressed by [`RenderHandle`](weft_types::RenderHandle).
//! - [`Scene`]: Bundles the above with the host's play-mode flag.

pub mod generators;
pub mod mesh;
pub mod renderer;
pub mod scene;
pub mod transform;

pub use mesh::{MeshStore, SkinnedMesh};
pub use renderer::{Renderer, RendererSet};
pub use scene::Scene;
pub use transform::{TransformArena, TransformNode};
