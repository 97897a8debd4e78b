//! Integration tests for weft-telemetry.

use weft_telemetry::bus::{EventBus, EventFilter};
use weft_telemetry::events::{EventKind, SimulationEvent};
use weft_telemetry::sinks::{SharedVecSink, TracingSink};
use weft_types::{ClothId, RenderHandle, TeamId};

fn tick_begin(tick: u64) -> SimulationEvent {
    SimulationEvent::new(tick, EventKind::TickBegin { active_teams: 2 })
}

fn build_started(tick: u64, cloth: u32) -> SimulationEvent {
    SimulationEvent::new(tick, EventKind::BuildStarted { cloth: ClothId(cloth) })
}

// ─── Bus Tests ────────────────────────────────────────────────

#[test]
fn emit_is_deferred_until_flush() {
    let mut bus = EventBus::new();
    let sink = SharedVecSink::new();
    bus.add_sink(Box::new(sink.clone()));

    bus.emit(tick_begin(0));
    bus.emit(SimulationEvent::new(0, EventKind::TickEnd { wall_time: 0.001 }));
    assert!(sink.snapshot().is_empty());

    bus.flush();
    let events = sink.snapshot();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, EventKind::TickBegin { active_teams: 2 });
    assert_eq!(bus.delivered(), 2);
}

#[test]
fn disabled_bus_drops_events() {
    let mut bus = EventBus::new();
    let sink = SharedVecSink::new();
    bus.add_sink(Box::new(sink.clone()));
    bus.set_enabled(false);
    bus.emit(tick_begin(0));
    bus.flush();
    assert!(sink.snapshot().is_empty());
    assert!(!bus.is_enabled());
}

#[test]
fn events_without_sinks_are_not_queued() {
    let mut bus = EventBus::new();
    bus.emit(build_started(0, 1));
    let sink = SharedVecSink::new();
    bus.add_sink(Box::new(sink.clone()));
    bus.flush();
    assert!(sink.snapshot().is_empty());
}

#[test]
fn filters_split_lifecycle_and_ticks() {
    let mut bus = EventBus::new();
    let lifecycle = SharedVecSink::new();
    let ticks = SharedVecSink::new();
    let all = SharedVecSink::new();
    bus.add_filtered_sink(Box::new(lifecycle.clone()), EventFilter::Lifecycle);
    bus.add_filtered_sink(Box::new(ticks.clone()), EventFilter::Ticks);
    bus.add_sink(Box::new(all.clone()));
    assert_eq!(bus.sink_count(), 3);

    bus.emit(tick_begin(4));
    bus.emit(build_started(4, 0));
    bus.emit(SimulationEvent::new(4, EventKind::TickEnd { wall_time: 0.0 }));
    bus.flush();

    assert_eq!(lifecycle.snapshot().len(), 1);
    assert_eq!(ticks.snapshot().len(), 2);
    assert_eq!(all.snapshot().len(), 3);
    assert_eq!(bus.delivered(), 6);
}

#[test]
fn shared_sink_take_drains() {
    let mut bus = EventBus::new();
    let sink = SharedVecSink::new();
    bus.add_sink(Box::new(sink.clone()));
    bus.emit(build_started(1, 3));
    bus.flush();
    assert_eq!(sink.take().len(), 1);
    assert!(sink.snapshot().is_empty());
}

#[test]
fn tracing_sink_finalizes() {
    let mut bus = EventBus::new();
    bus.add_sink(Box::new(TracingSink::new(tracing::Level::DEBUG)));
    bus.add_sink(Box::new(TracingSink::new(tracing::Level::ERROR)));
    bus.emit(tick_begin(3));
    bus.emit(build_started(3, 1));
    bus.finalize();
    assert_eq!(bus.delivered(), 4);
}

// ─── Event Tests ──────────────────────────────────────────────

#[test]
fn cloth_of_event() {
    assert_eq!(tick_begin(0).kind.cloth(), None);
    assert_eq!(build_started(0, 7).kind.cloth(), Some(ClothId(7)));
    let change = EventKind::RendererMeshChanged {
        cloth: ClothId(2),
        renderer: RenderHandle(0),
        custom: true,
    };
    assert_eq!(change.cloth(), Some(ClothId(2)));
    assert!(!change.is_tick());
    assert!(tick_begin(0).kind.is_tick());
}

#[test]
fn event_serialization() {
    let event = SimulationEvent::new(
        5,
        EventKind::TeamAllocated {
            cloth: ClothId(2),
            team: TeamId(0),
        },
    );
    let json = serde_json::to_string(&event).unwrap();
    let recovered: SimulationEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(recovered.tick, 5);
    assert_eq!(recovered.kind, event.kind);
}
