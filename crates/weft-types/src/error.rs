//! Error types for the Weft engine.
//!
//! All crates return `WeftResult<T>` from fallible operations.

use thiserror::Error;

/// Unified error type for the Weft engine.
#[derive(Debug, Error)]
pub enum WeftError {
    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Mesh data is malformed or inconsistent.
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// A transform reference does not resolve to a live transform.
    #[error("Invalid transform: {0}")]
    InvalidTransform(String),

    /// A handle or id is not registered in its store.
    #[error("Unknown handle: {0}")]
    UnknownHandle(String),

    /// Pre-built data is present but cannot be used.
    #[error("Pre-build error: {0}")]
    PreBuild(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A lifecycle invariant was violated (e.g., team released twice).
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Convenience alias for `Result<T, WeftError>`.
pub type WeftResult<T> = Result<T, WeftError>;
