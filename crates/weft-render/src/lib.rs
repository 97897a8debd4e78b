//! # weft-render
//!
//! The Render/Binding Registry. Maps each skinned renderer driven by a
//! cloth to its original mesh, its simulation-driven custom mesh, and
//! the custom bone list installed while the custom mesh is active.
//!
//! Entries are reference counted: several cloth instances may drive
//! the same renderer, and the binding lives until the last one lets go.

pub mod binding;
pub mod registry;

pub use binding::RenderBinding;
pub use registry::RenderRegistry;
