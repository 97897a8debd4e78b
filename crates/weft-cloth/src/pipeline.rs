//! Build pipeline.
//!
//! ```text
//! Unbuilt → Initialized → DataGenerated → (SelectionReady) ─┬─► Building ─(build phase)─► Built
//!                                                           └─► pre-built construction ──► Built
//! ```
//!
//! Any step may abort (silent) or fault (logged). Either way the
//! attempt ends as a failure: generated data is discarded and the
//! instance returns to `Unbuilt`. Every attempt that enters the
//! pipeline produces exactly one `BuildComplete` notification.

use thiserror::Error;
use tracing::{debug, error, warn};
use weft_math::Pose;
use weft_telemetry::EventKind;
use weft_types::{ClothId, WeftError, WeftResult};

use crate::construct::{construct_payload, generate_initialization, resolve_payload};
use crate::notify::ClothNotification;
use crate::prebuild::{PreBuildData, PreBuildPayload};
use crate::process::{BuildState, ClothRuntime, ProcessFlags};
use crate::selection::SelectionData;
use crate::world::{ClothWorld, PendingBuild};

/// Immediate result of [`ClothWorld::build`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// A runtime build was queued; completion arrives as a notification.
    Started,
    /// The attempt finished synchronously (or was rejected).
    Completed(bool),
}

/// Why a build stopped without an error worth logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The host is not in play mode.
    NotPlaying,
    /// No selection could be produced for a bone cloth.
    SelectionUnavailable,
    /// The instance disappeared mid-attempt.
    Destroyed,
}

/// Failure of one pipeline step.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("build aborted: {0:?}")]
    Aborted(AbortReason),
    #[error(transparent)]
    Faulted(#[from] WeftError),
}

impl ClothWorld {
    /// Builds an instance.
    ///
    /// Rejected (warned, no notification) if the instance is already
    /// built or has a runtime build in flight.
    pub fn build(&mut self, id: ClothId) -> BuildOutcome {
        let Some(process) = self.process_mut(id) else {
            warn!(cloth = %id, "build requested for unknown cloth");
            return BuildOutcome::Completed(false);
        };
        process.flags.insert(ProcessFlags::DISABLE_AUTO_BUILD);
        if process.is_built() || process.is_building() {
            warn!(cloth = %id, state = ?process.state, "build rejected: already built");
            return BuildOutcome::Completed(false);
        }
        process.attempt += 1;

        match self.run_pipeline(id) {
            Ok(BuildOutcome::Started) => BuildOutcome::Started,
            Ok(BuildOutcome::Completed(_)) => {
                self.complete_attempt(id, true);
                BuildOutcome::Completed(true)
            }
            Err(err) => {
                self.fail_attempt(id, &err);
                BuildOutcome::Completed(false)
            }
        }
    }

    /// Moves an unbuilt instance to `Initialized`.
    ///
    /// Returns false if the host is not playing or the id is unknown.
    /// Calling it on an instance that is already past `Unbuilt` is a no-op.
    pub fn initialize(&mut self, id: ClothId) -> bool {
        let playing = self.scene.is_playing();
        let Some(process) = self.process_mut(id) else {
            return false;
        };
        if process.state != BuildState::Unbuilt {
            return true;
        }
        if !playing {
            return false;
        }
        process.state = BuildState::Initialized;
        process.flags.insert(ProcessFlags::INIT_COMPLETE);
        debug!(cloth = %id, "cloth initialized");
        true
    }

    /// Runs the runtime construction now and returns it as pre-built data.
    ///
    /// Does not require play mode and does not change the instance.
    pub fn create_pre_build(&self, id: ClothId) -> WeftResult<PreBuildData> {
        let process = self
            .process(id)
            .ok_or_else(|| WeftError::UnknownHandle(format!("{id} does not exist")))?;
        let init = generate_initialization(&process.serialize_data, &self.scene)?;
        let payload = construct_payload(
            &process.serialize_data.kind,
            &init,
            process.serialize_data2.selection.as_ref(),
            &self.registry,
            &self.scene,
        )?;
        debug!(cloth = %id, particles = payload.particles.len(), "pre-build created");
        Ok(PreBuildData::new(payload.encode()?))
    }

    fn run_pipeline(&mut self, id: ClothId) -> Result<BuildOutcome, BuildError> {
        if !self.scene.is_playing() {
            return Err(BuildError::Aborted(AbortReason::NotPlaying));
        }
        self.initialize(id);

        let process = self
            .cloths
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(BuildError::Aborted(AbortReason::Destroyed))?;
        let init = generate_initialization(&process.serialize_data, &self.scene)?;
        process.state = BuildState::DataGenerated;

        if process.serialize_data.kind.is_bone() {
            let keep = process
                .serialize_data2
                .selection
                .as_ref()
                .is_some_and(|s| s.user_edit && s.is_valid_for(init.bones.len()));
            if !keep {
                let selection =
                    SelectionData::for_bones(process.serialize_data.kind.root_bones(), &init.bones)
                        .ok_or(BuildError::Aborted(AbortReason::SelectionUnavailable))?;
                process.serialize_data2.selection = Some(selection);
            }
            process.state = BuildState::SelectionReady;
        }
        process.init = Some(init);

        if process.serialize_data2.pre_build.use_pre_build() {
            self.pre_build_construction(id)?;
            Ok(BuildOutcome::Completed(true))
        } else {
            self.start_runtime_build(id);
            Ok(BuildOutcome::Started)
        }
    }

    fn pre_build_construction(&mut self, id: ClothId) -> WeftResult<()> {
        let process = self
            .process(id)
            .ok_or_else(|| WeftError::InvariantViolation(format!("{id} vanished mid-build")))?;
        let init = process
            .init
            .as_ref()
            .ok_or_else(|| WeftError::InvariantViolation(format!("{id} has no init data")))?;
        let payload = PreBuildPayload::decode(&process.serialize_data2.pre_build.blob)?;
        let runtime = resolve_payload(
            &payload,
            &process.serialize_data.kind,
            init,
            &process.serialize_data.parameters,
            &self.scene,
        )?;
        self.finalize(id, runtime)
    }

    fn start_runtime_build(&mut self, id: ClothId) {
        let Some(process) = self.process_mut(id) else {
            return;
        };
        process.state = BuildState::Building;
        let job = PendingBuild {
            cloth: id,
            attempt: process.attempt,
        };
        self.pending.push_back(job);
        self.emit(EventKind::BuildStarted { cloth: id });
        debug!(cloth = %id, attempt = job.attempt, "runtime build queued");
    }

    /// Executes every queued runtime build. Returns how many ran.
    pub(crate) fn run_build_phase(&mut self) -> u32 {
        let jobs: Vec<PendingBuild> = self.pending.drain(..).collect();
        let mut ran = 0;
        for job in jobs {
            let live = self
                .process(job.cloth)
                .is_some_and(|p| p.is_building() && p.attempt == job.attempt);
            if !live {
                debug!(cloth = %job.cloth, attempt = job.attempt, "stale build dropped");
                continue;
            }
            ran += 1;
            match self
                .runtime_construction(job.cloth)
                .and_then(|runtime| self.finalize(job.cloth, runtime))
            {
                Ok(()) => self.complete_attempt(job.cloth, true),
                Err(e) => self.fail_attempt(job.cloth, &BuildError::Faulted(e)),
            }
        }
        ran
    }

    fn runtime_construction(&self, id: ClothId) -> WeftResult<ClothRuntime> {
        let process = self
            .process(id)
            .ok_or_else(|| WeftError::InvariantViolation(format!("{id} vanished mid-build")))?;
        let init = process
            .init
            .as_ref()
            .ok_or_else(|| WeftError::InvariantViolation(format!("{id} has no init data")))?;
        let payload = construct_payload(
            &process.serialize_data.kind,
            init,
            process.serialize_data2.selection.as_ref(),
            &self.registry,
            &self.scene,
        )?;
        resolve_payload(
            &payload,
            &process.serialize_data.kind,
            init,
            &process.serialize_data.parameters,
            &self.scene,
        )
    }

    /// Binds renderers, allocates the team and marks the instance built.
    fn finalize(&mut self, id: ClothId, mut runtime: ClothRuntime) -> WeftResult<()> {
        let process = self
            .process(id)
            .ok_or_else(|| WeftError::InvariantViolation(format!("{id} vanished mid-build")))?;
        let renderers = process.init.as_ref().map(|i| i.renderers.clone()).unwrap_or_default();
        let parameters = process.serialize_data.parameters.clone();
        let root_id = process.serialize_data.cloth_transform;
        let flags = process.flags;

        for &handle in &renderers {
            self.registry.add_renderer(handle, &self.scene)?;
            if let Some(process) = self.process_mut(id) {
                process.renderers.push(handle);
            }
        }
        for &handle in &renderers {
            self.install_custom_mesh(id, handle)?;
        }

        let root = self
            .scene
            .transforms
            .pose(root_id)
            .ok_or_else(|| WeftError::InvalidTransform(format!("cloth transform {root_id} vanished")))?;
        runtime.update_base(&root, &self.scene);
        runtime.particles.reset_to_base();
        let center_local = root.inverse_transform_point(runtime.particles.center_of_mass());

        let team_id = self.teams.allocate(id);
        if let Some((team, center)) = self.teams.get_pair_mut(team_id) {
            team.gravity = parameters.gravity_vector();
            team.damping = parameters.damping;
            team.set_time_scale(parameters.time_scale);
            if flags.contains(ProcessFlags::SKIP_WRITING) {
                team.flags.insert(weft_team::TeamFlags::SKIP_WRITING);
            }
            if flags.contains(ProcessFlags::CAMERA_CULLING_KEEP) {
                team.flags.insert(weft_team::TeamFlags::CAMERA_CULLING_KEEP);
            }
            init_center(center, &root, center_local);
        }
        self.emit(EventKind::TeamAllocated { cloth: id, team: team_id });

        if let Some(process) = self.process_mut(id) {
            process.team_id = Some(team_id);
            process.runtime = Some(runtime);
            process.state = BuildState::Built;
            process.flags.set(ProcessFlags::RENDERER_USE, !renderers.is_empty());
        }
        debug!(cloth = %id, team = %team_id, "cloth built");
        Ok(())
    }

    fn complete_attempt(&mut self, id: ClothId, success: bool) {
        self.emit(EventKind::BuildCompleted { cloth: id, success });
        self.notifier
            .send(ClothNotification::BuildComplete { cloth: id, success });
    }

    fn fail_attempt(&mut self, id: ClothId, err: &BuildError) {
        match err {
            BuildError::Aborted(reason) => debug!(cloth = %id, ?reason, "build aborted"),
            BuildError::Faulted(e) => error!(cloth = %id, error = %e, "build failed"),
        }
        if let Some(process) = self.process_mut(id) {
            process.state = BuildState::Failed;
            let team = process.team_id.take();
            let renderers = std::mem::take(&mut process.renderers);
            process.discard_generated();
            self.release_bindings(id, team, renderers);
        }
        self.complete_attempt(id, false);
    }
}

fn init_center(center: &mut weft_team::CenterData, root: &Pose, local: weft_math::Vec3) {
    center.frame_world_position = root.position;
    center.old_frame_world_position = root.position;
    center.frame_world_rotation = root.rotation;
    center.frame_local_position = local;
}
