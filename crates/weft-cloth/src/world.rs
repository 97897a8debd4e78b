//! The cloth world: every store a cloth instance touches.

use std::collections::VecDeque;
use std::sync::mpsc;

use tracing::debug;
use weft_render::RenderRegistry;
use weft_scene::Scene;
use weft_solver::{ReferenceSolver, TeamSolver};
use weft_team::TeamDataStore;
use weft_telemetry::{EventBus, EventKind, SimulationEvent};
use weft_types::{ClothId, RenderHandle, TeamId, WeftResult};

use crate::api::ClothApi;
use crate::config::{ClothSerializeData, ClothSerializeData2};
use crate::notify::{ClothNotification, Notifier};
use crate::pipeline::BuildOutcome;
use crate::process::{ClothProcess, ProcessFlags};

/// A runtime build waiting for the next build phase.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingBuild {
    pub cloth: ClothId,
    pub attempt: u32,
}

/// Owner of the scene, the team data store, the render registry and
/// all cloth instances.
///
/// Cloth ids are never reused: a destroyed instance leaves an empty slot.
pub struct ClothWorld {
    pub(crate) scene: Scene,
    pub(crate) teams: TeamDataStore,
    pub(crate) registry: RenderRegistry,
    pub(crate) cloths: Vec<Option<ClothProcess>>,
    pub(crate) pending: VecDeque<PendingBuild>,
    pub(crate) notifier: Notifier,
    pub(crate) events: EventBus,
    pub(crate) solver: Box<dyn TeamSolver>,
    pub(crate) tick_count: u64,
}

impl ClothWorld {
    /// Creates a world around `scene` using the reference solver.
    pub fn new(scene: Scene) -> Self {
        Self::with_solver(scene, Box::new(ReferenceSolver::default()))
    }

    pub fn with_solver(scene: Scene, solver: Box<dyn TeamSolver>) -> Self {
        Self {
            scene,
            teams: TeamDataStore::new(),
            registry: RenderRegistry::new(),
            cloths: Vec::new(),
            pending: VecDeque::new(),
            notifier: Notifier::default(),
            events: EventBus::new(),
            solver,
            tick_count: 0,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn teams(&self) -> &TeamDataStore {
        &self.teams
    }

    pub fn teams_mut(&mut self) -> &mut TeamDataStore {
        &mut self.teams
    }

    pub fn registry(&self) -> &RenderRegistry {
        &self.registry
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn solver_name(&self) -> &str {
        self.solver.name()
    }

    /// Number of ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Opens a notification channel. Every notification sent after this
    /// call is delivered to the returned receiver.
    pub fn subscribe(&mut self) -> mpsc::Receiver<ClothNotification> {
        self.notifier.subscribe()
    }

    /// Registers a new, unbuilt cloth instance.
    pub fn create(&mut self, data: ClothSerializeData, data2: ClothSerializeData2) -> ClothId {
        let id = ClothId(self.cloths.len() as u32);
        debug!(cloth = %id, kind = data.kind.label(), "cloth created");
        self.cloths.push(Some(ClothProcess::new(id, data, data2)));
        id
    }

    /// Destroys an instance, dropping any queued build and releasing its
    /// team and render bindings. No notification fires for a dropped build.
    pub fn destroy(&mut self, id: ClothId) -> bool {
        let Some(mut process) = self.cloths.get_mut(id.index()).and_then(Option::take) else {
            return false;
        };
        self.pending.retain(|job| job.cloth != id);
        let renderers = std::mem::take(&mut process.renderers);
        self.release_bindings(id, process.team_id.take(), renderers);
        debug!(cloth = %id, state = ?process.state, "cloth destroyed");
        true
    }

    pub fn process(&self, id: ClothId) -> Option<&ClothProcess> {
        self.cloths.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn process_mut(&mut self, id: ClothId) -> Option<&mut ClothProcess> {
        self.cloths.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Facade for one instance.
    pub fn cloth(&mut self, id: ClothId) -> ClothApi<'_> {
        ClothApi::new(self, id)
    }

    /// Ids of live instances in creation order.
    pub fn cloth_ids(&self) -> Vec<ClothId> {
        self.cloths.iter().flatten().map(|p| p.id).collect()
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.cloths.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Component activation: builds unless auto-build was disabled.
    pub fn start(&mut self, id: ClothId) -> Option<BuildOutcome> {
        let auto = self
            .process(id)
            .is_some_and(|p| !p.flags.contains(ProcessFlags::DISABLE_AUTO_BUILD));
        auto.then(|| self.build(id))
    }

    /// Prevents [`start`](Self::start) from building. Only honored in play mode.
    pub fn disable_auto_build(&mut self, id: ClothId) {
        if !self.scene.is_playing() {
            return;
        }
        if let Some(process) = self.process_mut(id) {
            process.flags.insert(ProcessFlags::DISABLE_AUTO_BUILD);
        }
    }

    pub(crate) fn emit(&self, kind: EventKind) {
        self.events.emit(SimulationEvent::new(self.tick_count, kind));
    }

    pub(crate) fn notify_mesh_change(&mut self, cloth: ClothId, renderer: RenderHandle, custom: bool) {
        self.emit(EventKind::RendererMeshChanged {
            cloth,
            renderer,
            custom,
        });
        self.notifier.send(ClothNotification::RendererMeshChange {
            cloth,
            renderer,
            custom,
        });
    }

    /// Binds the custom mesh of `handle` and bakes every vertex to the
    /// renderer slot. Returns false if it was already bound.
    pub(crate) fn install_custom_mesh(&mut self, cloth: ClothId, handle: RenderHandle) -> WeftResult<bool> {
        if !self.registry.bind_custom_mesh(handle, &mut self.scene)? {
            return Ok(false);
        }
        self.notify_mesh_change(cloth, handle, true);
        let vertex_count = self
            .registry
            .custom_mesh(handle)
            .and_then(|m| self.scene.meshes.get(m))
            .map_or(0, |m| m.vertex_count());
        let all: Vec<usize> = (0..vertex_count).collect();
        self.registry.bake_simulated_vertices(handle, &all, &mut self.scene)?;
        Ok(true)
    }

    /// Gives back a team slot and renderer references.
    pub(crate) fn release_bindings(
        &mut self,
        cloth: ClothId,
        team: Option<TeamId>,
        renderers: Vec<RenderHandle>,
    ) {
        if let Some(team) = team {
            if self.teams.release(team) {
                self.emit(EventKind::TeamReleased { cloth, team });
            }
        }
        for handle in renderers {
            let was_bound = self.registry.custom_mesh(handle).is_some();
            if self.registry.remove_renderer(handle, &mut self.scene) && was_bound {
                self.notify_mesh_change(cloth, handle, false);
            }
        }
    }
}
