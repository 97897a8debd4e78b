//! Event bus: queued cloth events fanned out to filtered sinks.
//!
//! Producers only hold `&self` (the cloth world emits from inside
//! borrowed build and tick paths), so events go through an `mpsc`
//! queue and reach sinks on [`EventBus::flush`].

use std::sync::mpsc;

use crate::events::SimulationEvent;
use crate::sinks::EventSink;

/// Which events a sink is handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFilter {
    #[default]
    All,
    /// Everything except tick begin/end.
    Lifecycle,
    /// Only per-tick timing.
    Ticks,
}

impl EventFilter {
    pub fn accepts(self, event: &SimulationEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Lifecycle => !event.kind.is_tick(),
            EventFilter::Ticks => event.kind.is_tick(),
        }
    }
}

struct Subscription {
    filter: EventFilter,
    sink: Box<dyn EventSink>,
}

/// Telemetry bus owned by the cloth world.
pub struct EventBus {
    sender: mpsc::Sender<SimulationEvent>,
    queue: mpsc::Receiver<SimulationEvent>,
    subscriptions: Vec<Subscription>,
    enabled: bool,
    delivered: u64,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, queue) = mpsc::channel();
        Self {
            sender,
            queue,
            subscriptions: Vec::new(),
            enabled: true,
            delivered: 0,
        }
    }

    /// Registers a sink that sees every event.
    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.add_filtered_sink(sink, EventFilter::All);
    }

    pub fn add_filtered_sink(&mut self, sink: Box<dyn EventSink>, filter: EventFilter) {
        self.subscriptions.push(Subscription { filter, sink });
    }

    /// A disabled bus drops events at `emit`.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Queues an event. Skipped when disabled or nobody listens.
    pub fn emit(&self, event: SimulationEvent) {
        if !self.enabled || self.subscriptions.is_empty() {
            return;
        }
        // The receiver lives in `self`, so send cannot fail.
        let _ = self.sender.send(event);
    }

    /// Hands queued events to sinks in emission order.
    ///
    /// The cloth world calls this at the end of every tick.
    pub fn flush(&mut self) {
        while let Ok(event) = self.queue.try_recv() {
            for sub in &mut self.subscriptions {
                if sub.filter.accepts(&event) {
                    sub.sink.handle(&event);
                    self.delivered += 1;
                }
            }
        }
    }

    /// Flushes, then lets every sink finalize.
    pub fn finalize(&mut self) {
        self.flush();
        for sub in &mut self.subscriptions {
            sub.sink.finalize();
        }
    }

    pub fn sink_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Total sink deliveries so far.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
