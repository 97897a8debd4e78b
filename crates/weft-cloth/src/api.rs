//! Per-instance facade.
//!
//! Mutating calls require the instance to exist and be built; anything
//! else is a silent no-op. Queries return `None` (or a neutral value)
//! under the same conditions.

use std::collections::HashMap;

use tracing::warn;
use weft_math::Vec3;
use weft_team::{ForceMode, TeamFlags, TeamRecord};
use weft_types::constants::NEUTRAL_TIME_SCALE;
use weft_types::{ClothId, MeshId, RenderHandle, TeamId, TransformId};

use crate::config::{ClothSerializeData, ClothSerializeData2};
use crate::pipeline::BuildOutcome;
use crate::process::{BuildState, ClothProcess, ProcessFlags};
use crate::world::ClothWorld;

/// Handle to one cloth instance inside a [`ClothWorld`].
pub struct ClothApi<'w> {
    world: &'w mut ClothWorld,
    id: ClothId,
}

impl<'w> ClothApi<'w> {
    pub(crate) fn new(world: &'w mut ClothWorld, id: ClothId) -> Self {
        Self { world, id }
    }

    pub fn id(&self) -> ClothId {
        self.id
    }

    /// The instance exists in the world.
    pub fn is_valid(&self) -> bool {
        self.world.process(self.id).is_some()
    }

    pub fn state(&self) -> Option<BuildState> {
        self.world.process(self.id).map(|p| p.state)
    }

    pub fn team_id(&self) -> Option<TeamId> {
        self.built().and_then(|p| p.team_id)
    }

    pub fn serialize_data(&self) -> Option<&ClothSerializeData> {
        self.world.process(self.id).map(|p| &p.serialize_data)
    }

    pub fn serialize_data2(&self) -> Option<&ClothSerializeData2> {
        self.world.process(self.id).map(|p| &p.serialize_data2)
    }

    // ─── Lifecycle ───────────────────────────────────────────

    pub fn build(&mut self) -> BuildOutcome {
        self.world.build(self.id)
    }

    pub fn initialize(&mut self) -> bool {
        self.world.initialize(self.id)
    }

    pub fn disable_auto_build(&mut self) {
        self.world.disable_auto_build(self.id);
    }

    // ─── Simulation control ──────────────────────────────────

    pub fn set_time_scale(&mut self, time_scale: f32) {
        if let Some(team) = self.team_mut() {
            team.set_time_scale(time_scale);
        }
    }

    /// Current time scale, `1.0` if the instance is not built.
    pub fn time_scale(&self) -> f32 {
        self.team_id()
            .and_then(|t| self.world.teams.get(t))
            .map_or(NEUTRAL_TIME_SCALE, |t| t.time_scale)
    }

    /// Requests a reset on the next tick.
    ///
    /// `keep_pose` teleports the particles along with the cloth frame;
    /// otherwise the particles snap back onto the animated pose and the
    /// simulated time restarts.
    pub fn reset_cloth(&mut self, keep_pose: bool) {
        let id = self.id;
        let Some(team) = self.team_mut() else {
            return;
        };
        if keep_pose {
            team.flags.insert(TeamFlags::KEEP_TELEPORT);
            return;
        }
        team.flags.insert(TeamFlags::RESET | TeamFlags::TIME_RESET);
        team.flags.remove(TeamFlags::CAMERA_CULLING_KEEP);
        if let Some(process) = self.world.process_mut(id) {
            process.flags.remove(ProcessFlags::CAMERA_CULLING_KEEP);
        }
        self.world.refresh_renderer_use(id);
    }

    /// Queues a one-shot velocity impulse of `speed` along `direction`.
    ///
    /// Ignored for a zero or non-finite direction, a non-positive or
    /// non-finite speed, or [`ForceMode::None`]. Overwrites any impulse
    /// not yet applied.
    pub fn add_force(&mut self, direction: Vec3, speed: f32, mode: ForceMode) {
        if mode == ForceMode::None
            || !speed.is_finite()
            || speed <= 0.0
            || !direction.is_finite()
        {
            return;
        }
        let Some(dir) = direction.try_normalize() else {
            return;
        };
        if let Some(team) = self.team_mut() {
            team.set_force(dir * speed, mode);
        }
    }

    pub fn set_skip_writing(&mut self, skip: bool) {
        let id = self.id;
        let Some(team) = self.team_mut() else {
            return;
        };
        team.flags.set(TeamFlags::SKIP_WRITING, skip);
        if let Some(process) = self.world.process_mut(id) {
            process.flags.set(ProcessFlags::SKIP_WRITING, skip);
        }
    }

    /// Pushes the current parameters into the running team.
    pub fn set_parameter_change(&mut self) {
        let id = self.id;
        let Some(process) = self.built() else {
            return;
        };
        let parameters = process.serialize_data.parameters.clone();
        if let Err(e) = parameters.validate() {
            warn!(cloth = %id, error = %e, "parameter change ignored");
            return;
        }
        if let Some(team) = self.team_mut() {
            team.gravity = parameters.gravity_vector();
            team.damping = parameters.damping;
        }
        if let Some(runtime) = self.world.process_mut(id).and_then(|p| p.runtime.as_mut()) {
            let particles = &mut runtime.particles;
            for inv_mass in particles.inv_mass.iter_mut().filter(|m| **m > 0.0) {
                *inv_mass = 1.0 / parameters.particle_mass;
            }
        }
    }

    /// Mutable access to the parameters; apply with [`set_parameter_change`](Self::set_parameter_change).
    pub fn parameters_mut(&mut self) -> Option<&mut crate::config::ClothParameters> {
        self.world
            .process_mut(self.id)
            .map(|p| &mut p.serialize_data.parameters)
    }

    /// World position of the center of mass, `Vec3::ZERO` if not built.
    pub fn center_position(&self) -> Vec3 {
        let Some(process) = self.built() else {
            return Vec3::ZERO;
        };
        let Some(center) = process.team_id.and_then(|t| self.world.teams.get_center(t)) else {
            return Vec3::ZERO;
        };
        self.world
            .scene
            .transforms
            .pose(process.serialize_data.cloth_transform)
            .map_or(Vec3::ZERO, |root| root.transform_point(center.frame_local_position))
    }

    // ─── Transforms ──────────────────────────────────────────

    pub fn used_transforms(&self) -> Vec<TransformId> {
        self.world.collect_used_transforms(self.id)
    }

    /// Replaces used transforms by name. Returns the number substituted.
    pub fn replace_transforms(&mut self, renaming: &HashMap<String, TransformId>) -> usize {
        if self.built().is_none() {
            return 0;
        }
        self.world.replace_transforms(self.id, renaming)
    }

    // ─── Renderers ───────────────────────────────────────────

    pub fn original_mesh(&self, renderer: RenderHandle) -> Option<MeshId> {
        self.driven(renderer)?;
        self.world
            .registry
            .get_binding(renderer)
            .map(|b| b.original_mesh)
    }

    pub fn custom_mesh(&self, renderer: RenderHandle) -> Option<MeshId> {
        self.driven(renderer)?;
        self.world.registry.custom_mesh(renderer)
    }

    /// Bone list installed with the custom mesh.
    pub fn custom_bones(&self, renderer: RenderHandle) -> Option<Vec<Option<TransformId>>> {
        self.driven(renderer)?;
        self.world
            .registry
            .get_binding(renderer)
            .map(|b| b.transform_list.clone())
    }

    // ─── Helpers ─────────────────────────────────────────────

    fn built(&self) -> Option<&ClothProcess> {
        self.world.process(self.id).filter(|p| p.is_built())
    }

    fn driven(&self, renderer: RenderHandle) -> Option<()> {
        self.built()
            .filter(|p| p.renderers.contains(&renderer))
            .map(|_| ())
    }

    fn team_mut(&mut self) -> Option<&mut TeamRecord> {
        let team = self.team_id()?;
        self.world.teams.get_ref(team)
    }
}

impl ClothWorld {
    /// Reinstalls custom meshes that are no longer bound and updates
    /// `RENDERER_USE`.
    pub(crate) fn refresh_renderer_use(&mut self, id: ClothId) {
        let Some(renderers) = self.process(id).map(|p| p.renderers.clone()) else {
            return;
        };
        let mut all_bound = !renderers.is_empty();
        for handle in renderers {
            if let Err(e) = self.install_custom_mesh(id, handle) {
                warn!(cloth = %id, %handle, error = %e, "custom mesh unavailable");
                all_bound = false;
            }
        }
        if let Some(process) = self.process_mut(id) {
            process.flags.set(ProcessFlags::RENDERER_USE, all_bound);
        }
    }
}
