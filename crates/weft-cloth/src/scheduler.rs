//! Runtime scheduler: one `tick` per frame.
//!
//! ```text
//! tick(dt)
//!  ├─ build phase       queued runtime builds → finalize → notify
//!  ├─ per team          base pose, reset flags, solver step, center data
//!  └─ writeback         particles → transforms / custom meshes
//! ```
//!
//! Teams only touch their own cloth's data, so the per-team loop has no
//! ordering dependencies between iterations.

use std::time::Instant;

use tracing::error;
use weft_math::Pose;
use weft_render::RenderRegistry;
use weft_scene::Scene;
use weft_solver::WorldCollider;
use weft_team::TeamFlags;
use weft_telemetry::EventKind;
use weft_types::TeamId;

use crate::config::ClothSerializeData;
use crate::process::{ClothRuntime, ParticleAnchor};
use crate::world::ClothWorld;

/// What one tick did.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Runtime builds executed in the build phase.
    pub builds: u32,
    /// Teams stepped by the solver.
    pub teams_stepped: u32,
    /// Collider push-outs reported by the solver.
    pub contacts: u32,
    /// Wall-clock time of the tick (seconds).
    pub wall_time: f64,
}

impl ClothWorld {
    /// Advances every built instance by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> TickReport {
        let start = Instant::now();
        self.emit(EventKind::TickBegin {
            active_teams: self.teams.active_count() as u32,
        });

        let mut report = TickReport {
            builds: self.run_build_phase(),
            ..Default::default()
        };
        for team in self.teams.active_ids() {
            if let Some(contacts) = self.step_team(team, dt) {
                report.teams_stepped += 1;
                report.contacts += contacts;
            }
        }

        report.wall_time = start.elapsed().as_secs_f64();
        self.emit(EventKind::TickEnd {
            wall_time: report.wall_time,
        });
        self.events.flush();
        self.tick_count += 1;
        report
    }

    /// Steps one team and writes its results. Returns the contact count,
    /// or `None` if the team has nothing to simulate.
    fn step_team(&mut self, team_id: TeamId, dt: f32) -> Option<u32> {
        let cloth = self.teams.get(team_id)?.cloth;
        let process = self.cloths.get_mut(cloth.index()).and_then(Option::as_mut)?;
        let runtime = process.runtime.as_mut()?;
        let root = self.scene.transforms.pose(process.serialize_data.cloth_transform)?;

        let colliders = world_colliders(&process.serialize_data, &root, &self.scene);
        runtime.update_base(&root, &self.scene);

        let (team, center) = self.teams.get_pair_mut(team_id)?;
        if team.flags.contains(TeamFlags::RESET) {
            runtime.particles.reset_to_base();
        } else if team.flags.contains(TeamFlags::KEEP_TELEPORT) {
            runtime
                .particles
                .translate(root.position - center.frame_world_position);
        }
        if team.flags.contains(TeamFlags::TIME_RESET) {
            team.time = 0.0;
        }

        // Flags stay visible to the solver for this one step.
        let step_dt = dt * team.time_scale;
        let contacts = match self
            .solver
            .step(team, &mut runtime.particles, &colliders, step_dt)
        {
            Ok(result) => result.contacts,
            Err(e) => {
                error!(%cloth, team = %team_id, error = %e, "solver step failed");
                0
            }
        };
        team.flags
            .remove(TeamFlags::RESET | TeamFlags::TIME_RESET | TeamFlags::KEEP_TELEPORT);

        center.old_frame_world_position = center.frame_world_position;
        center.frame_world_position = root.position;
        center.frame_world_rotation = root.rotation;
        center.frame_local_position = root.inverse_transform_point(runtime.particles.center_of_mass());

        if !team.flags.contains(TeamFlags::SKIP_WRITING) {
            write_back(runtime, &self.registry, &mut self.scene);
        }
        Some(contacts)
    }
}

/// Places the declared colliders (and their mirrored copies) in world space.
fn world_colliders(data: &ClothSerializeData, root: &Pose, scene: &Scene) -> Vec<WorldCollider> {
    let mut out = Vec::with_capacity(data.colliders.len());
    for desc in &data.colliders {
        let Some(anchor) = scene.transforms.pose(desc.anchor) else {
            continue;
        };
        let collider = WorldCollider::from_anchor(desc.shape, &anchor, desc.center);
        out.push(collider);

        let frame = desc
            .effective_target()
            .and_then(|t| scene.transforms.pose(t))
            .unwrap_or(*root);
        if let Some(mirrored) = collider.mirrored(desc.symmetry, &frame) {
            out.push(mirrored);
        }
    }
    out
}

/// Free bone particles move their transforms; every vertex particle is
/// written into the renderer's custom mesh.
fn write_back(runtime: &ClothRuntime, registry: &RenderRegistry, scene: &mut Scene) {
    let particles = &runtime.particles;
    for (i, anchor) in runtime.anchors.iter().enumerate() {
        match *anchor {
            ParticleAnchor::Transform(t) => {
                if !particles.is_fixed(i) {
                    scene.transforms.set_position(t, particles.position(i));
                }
            }
            ParticleAnchor::Vertex { renderer, vertex } => {
                let Some(mesh) = registry.custom_mesh(renderer) else {
                    continue;
                };
                let Some(pose) = scene
                    .renderers
                    .get(renderer)
                    .and_then(|r| scene.transforms.pose(r.transform))
                else {
                    continue;
                };
                if let Some(mesh) = scene.meshes.get_mut(mesh) {
                    if vertex < mesh.vertex_count() {
                        mesh.set_position(vertex, pose.inverse_transform_point(particles.position(i)));
                    }
                }
            }
        }
    }
}
