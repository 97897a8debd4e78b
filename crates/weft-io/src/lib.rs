//! # weft-io
//!
//! Scene declaration files and their loading.
//!
//! A [`SceneDescription`](contract::SceneDescription) names transforms,
//! bone chains, skinned sheets and cloths. The loader turns it into a
//! populated [`ClothWorld`](weft_cloth::ClothWorld), resolving every
//! reference by name.

pub mod contract;
pub mod loader;
pub mod validator;

pub use contract::{ClothDecl, SceneDescription, SimulationParams};
pub use loader::{instantiate, load_description, LoadedScene};
pub use validator::validate_description;
