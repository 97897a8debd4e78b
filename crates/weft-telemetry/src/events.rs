//! Simulation event types.
//!
//! Structured events emitted by the cloth world at lifecycle points
//! and once per tick. Events are lightweight value types that carry
//! just enough data to be useful for monitoring and debugging.

use serde::{Deserialize, Serialize};
use weft_types::{ClothId, RenderHandle, TeamId};

/// An event emitted by the cloth world, tagged with the tick it happened in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationEvent {
    /// Tick number (0-indexed).
    pub tick: u64,
    /// Event payload.
    pub kind: EventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    /// Tick started.
    TickBegin {
        /// Number of live teams at the start of the tick.
        active_teams: u32,
    },

    /// Tick completed.
    TickEnd {
        /// Wall-clock time for the whole tick (seconds).
        wall_time: f64,
    },

    /// A runtime build was queued and will complete in a later build phase.
    BuildStarted { cloth: ClothId },

    /// A build attempt reached its terminal outcome.
    BuildCompleted { cloth: ClothId, success: bool },

    /// A team slot was handed to a cloth.
    TeamAllocated { cloth: ClothId, team: TeamId },

    /// A team slot was given back.
    TeamReleased { cloth: ClothId, team: TeamId },

    /// A renderer switched between its original and custom mesh.
    RendererMeshChanged {
        cloth: ClothId,
        renderer: RenderHandle,
        /// `true` = custom mesh installed, `false` = original restored.
        custom: bool,
    },

    /// Transform references of a cloth were substituted.
    TransformsReplaced {
        cloth: ClothId,
        /// Number of distinct transforms substituted.
        replaced: u32,
    },
}

impl SimulationEvent {
    /// Creates a new event for the given tick.
    pub fn new(tick: u64, kind: EventKind) -> Self {
        Self { tick, kind }
    }
}

impl EventKind {
    /// The cloth this event concerns, if any.
    pub fn cloth(&self) -> Option<ClothId> {
        match *self {
            EventKind::TickBegin { .. } | EventKind::TickEnd { .. } => None,
            EventKind::BuildStarted { cloth }
            | EventKind::BuildCompleted { cloth, .. }
            | EventKind::TeamAllocated { cloth, .. }
            | EventKind::TeamReleased { cloth, .. }
            | EventKind::RendererMeshChanged { cloth, .. }
            | EventKind::TransformsReplaced { cloth, .. } => Some(cloth),
        }
    }

    /// Per-tick bookkeeping as opposed to lifecycle transitions.
    pub fn is_tick(&self) -> bool {
        matches!(self, EventKind::TickBegin { .. } | EventKind::TickEnd { .. })
    }
}
