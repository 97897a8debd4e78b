//! # weft-cloth
//!
//! Cloth instances and everything that happens to them between
//! declaration and steady-state simulation.
//!
//! ## Architecture
//!
//! ```text
//! ClothSerializeData ──► build pipeline ──► runtime build (deferred)
//!                             │                    │
//!                             └─► pre-built blob ──┴─► finalize: team + render bindings
//!                                                              │
//!                                         ClothWorld::tick ◄───┘
//!                                (build phase, solve, center, writeback)
//! ```
//!
//! [`ClothWorld`] owns the scene, the team data store, the render
//! registry, every [`ClothProcess`] and the solver. [`ClothApi`] is the
//! per-instance facade.

pub mod api;
pub mod binding;
pub mod config;
pub mod construct;
pub mod notify;
pub mod pipeline;
pub mod prebuild;
pub mod process;
pub mod scheduler;
pub mod selection;
pub mod world;

pub use api::ClothApi;
pub use config::{ClothKind, ClothParameters, ClothSerializeData, ClothSerializeData2, ColliderDesc};
pub use notify::ClothNotification;
pub use pipeline::{AbortReason, BuildError, BuildOutcome};
pub use prebuild::{PreBuildData, PreBuildPayload};
pub use process::{BuildState, ClothProcess, ProcessFlags};
pub use scheduler::TickReport;
pub use selection::{SelectionData, VertexAttribute};
pub use world::ClothWorld;
