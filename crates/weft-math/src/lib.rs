//! # weft-math
//!
//! Math primitives for the Weft cloth engine.
//!
//! Provides:
//! - Re-exports of `glam` types (`Vec3`, `Quat`, etc.)
//! - [`Pose`]: a world-space rigid pose with non-uniform scale

pub mod pose;

pub use pose::Pose;

// Re-export glam types as the canonical math types for Weft.
pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};
