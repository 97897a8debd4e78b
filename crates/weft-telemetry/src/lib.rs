//! # weft-telemetry
//!
//! Event bus for cloth telemetry. Emits structured events (tick
//! timing, build lifecycle, team allocation, binding changes) that
//! are consumed by filtered sinks (tracing, in-memory capture).

pub mod bus;
pub mod events;
pub mod sinks;

pub use bus::{EventBus, EventFilter};
pub use events::{EventKind, SimulationEvent};
pub use sinks::{EventSink, SharedVecSink, TracingSink};
