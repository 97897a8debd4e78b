//! Event sinks.

use std::sync::{Arc, Mutex};

use crate::events::SimulationEvent;

/// A consumer of bus events.
pub trait EventSink: Send {
    fn handle(&mut self, event: &SimulationEvent);

    /// Called once when the bus is finalized.
    fn finalize(&mut self) {}

    fn name(&self) -> &str;
}

/// Collects events in memory. Clones share one buffer, so a clone kept
/// outside the bus can read what the boxed one received.
#[derive(Clone, Default)]
pub struct SharedVecSink {
    events: Arc<Mutex<Vec<SimulationEvent>>>,
}

impl SharedVecSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies out everything collected so far.
    pub fn snapshot(&self) -> Vec<SimulationEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Drains the buffer.
    pub fn take(&self) -> Vec<SimulationEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl EventSink for SharedVecSink {
    fn handle(&mut self, event: &SimulationEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }

    fn name(&self) -> &str {
        "shared_vec"
    }
}

/// Forwards events to `tracing`: lifecycle events at the configured
/// level, tick events one level lower.
pub struct TracingSink {
    level: tracing::Level,
    handled: u64,
}

impl TracingSink {
    pub fn new(level: tracing::Level) -> Self {
        Self { level, handled: 0 }
    }
}

impl EventSink for TracingSink {
    fn handle(&mut self, event: &SimulationEvent) {
        self.handled += 1;
        let cloth = event.kind.cloth().map(|c| c.0);
        let level = if event.kind.is_tick() && self.level != tracing::Level::TRACE {
            match self.level {
                tracing::Level::ERROR => tracing::Level::WARN,
                tracing::Level::WARN => tracing::Level::INFO,
                tracing::Level::INFO => tracing::Level::DEBUG,
                _ => tracing::Level::TRACE,
            }
        } else {
            self.level
        };
        match level {
            tracing::Level::ERROR => {
                tracing::error!(tick = event.tick, cloth, kind = ?event.kind, "cloth event")
            }
            tracing::Level::WARN => {
                tracing::warn!(tick = event.tick, cloth, kind = ?event.kind, "cloth event")
            }
            tracing::Level::INFO => {
                tracing::info!(tick = event.tick, cloth, kind = ?event.kind, "cloth event")
            }
            tracing::Level::DEBUG => {
                tracing::debug!(tick = event.tick, cloth, kind = ?event.kind, "cloth event")
            }
            _ => tracing::trace!(tick = event.tick, cloth, kind = ?event.kind, "cloth event"),
        }
    }

    fn finalize(&mut self) {
        tracing::debug!(events = self.handled, "tracing sink finalized");
    }

    fn name(&self) -> &str {
        "tracing"
    }
}
