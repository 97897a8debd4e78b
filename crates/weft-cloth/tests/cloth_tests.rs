//! Integration tests for weft-cloth.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use weft_cloth::{
    BuildOutcome, BuildState, ClothKind, ClothNotification, ClothSerializeData,
    ClothSerializeData2, ClothWorld, ColliderDesc, PreBuildData, ProcessFlags, SelectionData,
    VertexAttribute,
};
use weft_math::{Pose, Vec3};
use weft_scene::generators::{bone_chain, skinned_sheet};
use weft_scene::Scene;
use weft_solver::{ColliderShape, ParticleState, StepResult, TeamSolver, WorldCollider};
use weft_team::{ForceMode, TeamFlags, TeamRecord};
use weft_telemetry::{EventKind, SharedVecSink};
use weft_types::constants::PRE_BUILD_VERSION;
use weft_types::{ClothId, RenderHandle, TransformId, WeftResult};

const DT: f32 = 1.0 / 60.0;

struct BoneRig {
    world: ClothWorld,
    cloth: ClothId,
    root: TransformId,
    chain: Vec<TransformId>,
}

fn bone_scene(scene: &mut Scene) -> (TransformId, Vec<TransformId>) {
    let root = scene.transforms.create("rig", None, Pose::IDENTITY);
    let chain = bone_chain(&mut scene.transforms, "hair", Some(root), Vec3::ZERO, 4, 0.25);
    (root, chain)
}

fn bone_rig_with(scene: Scene, data2: ClothSerializeData2) -> BoneRig {
    let mut scene = scene;
    let (root, chain) = bone_scene(&mut scene);
    let data = ClothSerializeData::new(
        ClothKind::BoneCloth {
            root_bones: vec![chain[0]],
        },
        root,
    );
    let mut world = ClothWorld::new(scene);
    let cloth = world.create(data, data2);
    BoneRig {
        world,
        cloth,
        root,
        chain,
    }
}

fn bone_rig() -> BoneRig {
    bone_rig_with(Scene::new(), ClothSerializeData2::default())
}

/// A bone rig that has gone through build and one tick.
fn built_bone_rig() -> BoneRig {
    let mut rig = bone_rig();
    assert_eq!(rig.world.build(rig.cloth), BuildOutcome::Started);
    rig.world.tick(DT);
    assert_eq!(rig.world.cloth(rig.cloth).state(), Some(BuildState::Built));
    rig
}

fn mesh_world() -> (ClothWorld, ClothId, RenderHandle) {
    let mut scene = Scene::new();
    let sheet = skinned_sheet(&mut scene, "sheet", Vec3::ZERO, 4, 4, 1.0, 1.0, 5);
    let root = scene.renderers.get(sheet).map(|r| r.transform).unwrap();
    let data = ClothSerializeData::new(
        ClothKind::MeshCloth {
            renderers: vec![sheet],
        },
        root,
    );
    let mut world = ClothWorld::new(scene);
    let cloth = world.create(data, ClothSerializeData2::default());
    (world, cloth, sheet)
}

fn drain(rx: &Receiver<ClothNotification>) -> Vec<ClothNotification> {
    rx.try_iter().collect()
}

fn build_results(notes: &[ClothNotification]) -> Vec<(ClothId, bool)> {
    notes
        .iter()
        .filter_map(|n| match *n {
            ClothNotification::BuildComplete { cloth, success } => Some((cloth, success)),
            _ => None,
        })
        .collect()
}

/// Records the team flags it sees at every step.
struct RecordingSolver {
    seen: Arc<Mutex<Vec<TeamFlags>>>,
}

impl TeamSolver for RecordingSolver {
    fn step(
        &mut self,
        team: &mut TeamRecord,
        _particles: &mut ParticleState,
        _colliders: &[WorldCollider],
        _dt: f32,
    ) -> WeftResult<StepResult> {
        self.seen.lock().unwrap().push(team.flags);
        Ok(StepResult::default())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

// ─── Build Pipeline Tests ─────────────────────────────────────

#[test]
fn runtime_build_completes_in_next_tick() {
    let mut rig = bone_rig();
    let rx = rig.world.subscribe();

    assert_eq!(rig.world.build(rig.cloth), BuildOutcome::Started);
    assert_eq!(rig.world.cloth(rig.cloth).state(), Some(BuildState::Building));
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

    let report = rig.world.tick(DT);
    assert_eq!(report.builds, 1);
    assert_eq!(report.teams_stepped, 1);
    assert_eq!(build_results(&drain(&rx)), vec![(rig.cloth, true)]);
    assert!(rig.world.cloth(rig.cloth).team_id().is_some());
}

#[test]
fn build_twice_is_rejected() {
    let mut rig = bone_rig();
    let rx = rig.world.subscribe();

    assert_eq!(rig.world.build(rig.cloth), BuildOutcome::Started);
    // In flight
    assert_eq!(rig.world.build(rig.cloth), BuildOutcome::Completed(false));
    rig.world.tick(DT);
    // Built
    assert_eq!(rig.world.build(rig.cloth), BuildOutcome::Completed(false));
    rig.world.tick(DT);

    assert_eq!(build_results(&drain(&rx)), vec![(rig.cloth, true)]);
    assert_eq!(rig.world.teams().active_count(), 1);
    assert_eq!(rig.world.process(rig.cloth).unwrap().attempt, 1);
}

#[test]
fn build_outside_play_mode_fails() {
    let mut rig = bone_rig_with(Scene::editing(), ClothSerializeData2::default());
    let rx = rig.world.subscribe();

    assert_eq!(rig.world.build(rig.cloth), BuildOutcome::Completed(false));
    assert_eq!(build_results(&drain(&rx)), vec![(rig.cloth, false)]);
    assert_eq!(rig.world.cloth(rig.cloth).state(), Some(BuildState::Unbuilt));

    // A failed attempt leaves the instance buildable.
    rig.world.scene_mut().set_playing(true);
    assert_eq!(rig.world.build(rig.cloth), BuildOutcome::Started);
}

#[test]
fn build_with_bad_config_fails() {
    let mut scene = Scene::new();
    let root = scene.transforms.create("rig", None, Pose::IDENTITY);
    let mut world = ClothWorld::new(scene);
    let rx = world.subscribe();

    let missing = ClothSerializeData::new(
        ClothKind::BoneCloth {
            root_bones: vec![TransformId(99)],
        },
        root,
    );
    let a = world.create(missing, ClothSerializeData2::default());
    let mut bad_params = ClothSerializeData::new(ClothKind::BoneSpring { root_bones: vec![root] }, root);
    bad_params.parameters.damping = 2.0;
    let b = world.create(bad_params, ClothSerializeData2::default());

    assert_eq!(world.build(a), BuildOutcome::Completed(false));
    assert_eq!(world.build(b), BuildOutcome::Completed(false));
    assert_eq!(build_results(&drain(&rx)), vec![(a, false), (b, false)]);
    assert_eq!(world.teams().active_count(), 0);
    assert!(world.process(a).unwrap().init.is_none());
}

#[test]
fn deferred_build_failure_is_notified_after_tick() {
    let (mut world, cloth, sheet) = mesh_world();
    let rx = world.subscribe();

    assert_eq!(world.build(cloth), BuildOutcome::Started);
    // Renderer no longer matches its mesh's bone count.
    world.scene_mut().renderers.get_mut(sheet).unwrap().bones.push(None);
    assert!(drain(&rx).is_empty());

    world.tick(DT);
    assert_eq!(build_results(&drain(&rx)), vec![(cloth, false)]);
    assert_eq!(world.cloth(cloth).state(), Some(BuildState::Unbuilt));
    assert_eq!(world.cloth(cloth).team_id(), None);
    assert_eq!(world.teams().active_count(), 0);
    assert!(world.registry().is_empty());

    // Nothing further arrives on later ticks.
    world.tick(DT);
    assert!(drain(&rx).is_empty());
}

#[test]
fn build_unknown_cloth_is_silent() {
    let mut rig = bone_rig();
    let rx = rig.world.subscribe();
    assert_eq!(rig.world.build(ClothId(42)), BuildOutcome::Completed(false));
    assert!(drain(&rx).is_empty());
}

#[test]
fn build_disables_auto_build() {
    let mut rig = bone_rig_with(Scene::editing(), ClothSerializeData2::default());
    rig.world.build(rig.cloth);
    let flags = rig.world.process(rig.cloth).unwrap().flags;
    assert!(flags.contains(ProcessFlags::DISABLE_AUTO_BUILD));
    assert_eq!(rig.world.start(rig.cloth), None);
}

#[test]
fn start_builds_unless_disabled() {
    let mut rig = bone_rig();
    assert_eq!(rig.world.start(rig.cloth), Some(BuildOutcome::Started));

    let mut other = bone_rig();
    other.world.disable_auto_build(other.cloth);
    assert_eq!(other.world.start(other.cloth), None);
    assert_eq!(other.world.cloth(other.cloth).state(), Some(BuildState::Unbuilt));
}

#[test]
fn initialize_requires_play_mode() {
    let mut rig = bone_rig_with(Scene::editing(), ClothSerializeData2::default());
    assert!(!rig.world.initialize(rig.cloth));
    assert_eq!(rig.world.cloth(rig.cloth).state(), Some(BuildState::Unbuilt));

    rig.world.scene_mut().set_playing(true);
    assert!(rig.world.initialize(rig.cloth));
    assert!(rig.world.initialize(rig.cloth));
    let process = rig.world.process(rig.cloth).unwrap();
    assert_eq!(process.state, BuildState::Initialized);
    assert!(process.flags.contains(ProcessFlags::INIT_COMPLETE));
}

// ─── Selection Tests ──────────────────────────────────────────

#[test]
fn bone_selection_is_generated() {
    let rig = built_bone_rig();
    let selection = rig
        .world
        .process(rig.cloth)
        .and_then(|p| p.serialize_data2.selection.clone())
        .unwrap();
    assert_eq!(
        selection.attributes,
        vec![
            VertexAttribute::Fixed,
            VertexAttribute::Move,
            VertexAttribute::Move,
            VertexAttribute::Move
        ]
    );
    assert!(!selection.user_edit);
}

#[test]
fn user_selection_is_kept() {
    let painted = SelectionData::new(
        vec![
            VertexAttribute::Fixed,
            VertexAttribute::Fixed,
            VertexAttribute::Move,
            VertexAttribute::Move,
        ],
        true,
    );
    let mut rig = bone_rig_with(
        Scene::new(),
        ClothSerializeData2 {
            selection: Some(painted.clone()),
            ..Default::default()
        },
    );
    let before = rig.world.scene().transforms.position(rig.chain[1]);

    rig.world.build(rig.cloth);
    for _ in 0..10 {
        rig.world.tick(DT);
    }

    let api = rig.world.cloth(rig.cloth);
    assert_eq!(api.serialize_data2().unwrap().selection.as_ref(), Some(&painted));
    assert_eq!(rig.world.scene().transforms.position(rig.chain[1]), before);
}

#[test]
fn mismatched_user_selection_is_regenerated() {
    let painted = SelectionData::new(vec![VertexAttribute::Fixed], true);
    let mut rig = bone_rig_with(
        Scene::new(),
        ClothSerializeData2 {
            selection: Some(painted),
            ..Default::default()
        },
    );
    rig.world.build(rig.cloth);
    let selection = rig.world.process(rig.cloth).unwrap().serialize_data2.selection.clone();
    assert_eq!(selection.map(|s| s.len()), Some(4));
}

// ─── Pre-build Tests ──────────────────────────────────────────

#[test]
fn pre_built_cloth_completes_synchronously() {
    let mut rig = bone_rig();
    let blob = rig.world.create_pre_build(rig.cloth).unwrap();
    assert!(blob.use_pre_build());
    assert_eq!(blob.version(), Some(PRE_BUILD_VERSION));

    let data = rig.world.process(rig.cloth).unwrap().serialize_data.clone();
    let twin = rig.world.create(
        data,
        ClothSerializeData2 {
            pre_build: blob,
            ..Default::default()
        },
    );
    let rx = rig.world.subscribe();

    assert_eq!(rig.world.build(twin), BuildOutcome::Completed(true));
    assert_eq!(build_results(&drain(&rx)), vec![(twin, true)]);
    assert_eq!(rig.world.cloth(twin).state(), Some(BuildState::Built));
    // The source instance was not touched.
    assert_eq!(rig.world.cloth(rig.cloth).state(), Some(BuildState::Unbuilt));
}

#[test]
fn corrupt_pre_build_faults() {
    let mut blob = PRE_BUILD_VERSION.to_le_bytes().to_vec();
    blob.extend_from_slice(&[0xFF, 0xFF, 0xFF]);
    let mut rig = bone_rig_with(
        Scene::new(),
        ClothSerializeData2 {
            pre_build: PreBuildData::new(blob),
            ..Default::default()
        },
    );
    let rx = rig.world.subscribe();

    assert_eq!(rig.world.build(rig.cloth), BuildOutcome::Completed(false));
    assert_eq!(build_results(&drain(&rx)), vec![(rig.cloth, false)]);
    assert_eq!(rig.world.cloth(rig.cloth).state(), Some(BuildState::Unbuilt));
    assert_eq!(rig.world.teams().active_count(), 0);
}

#[test]
fn outdated_pre_build_falls_back_to_runtime() {
    let blob = (PRE_BUILD_VERSION + 1).to_le_bytes().to_vec();
    let mut rig = bone_rig_with(
        Scene::new(),
        ClothSerializeData2 {
            pre_build: PreBuildData::new(blob),
            ..Default::default()
        },
    );
    assert_eq!(rig.world.build(rig.cloth), BuildOutcome::Started);
}

#[test]
fn disabled_pre_build_is_unused() {
    let mut rig = bone_rig();
    let mut blob = rig.world.create_pre_build(rig.cloth).unwrap();
    blob.enabled = false;
    assert!(!blob.use_pre_build());
    assert!(!PreBuildData::default().use_pre_build());
}

// ─── Team Control Tests ───────────────────────────────────────

#[test]
fn time_scale_defaults_when_unbuilt() {
    let mut rig = bone_rig();
    let mut api = rig.world.cloth(rig.cloth);
    api.set_time_scale(0.25);
    assert_eq!(api.time_scale(), 1.0);
}

proptest! {
    #[test]
    fn time_scale_is_clamped(x in -10.0f32..10.0) {
        let mut rig = built_bone_rig();
        let mut api = rig.world.cloth(rig.cloth);
        api.set_time_scale(x);
        prop_assert_eq!(api.time_scale(), x.clamp(0.0, 1.0));
    }

    #[test]
    fn bad_force_is_ignored(
        x in -5.0f32..5.0,
        speed in -5.0f32..=0.0,
    ) {
        let mut rig = built_bone_rig();
        let team = rig.world.cloth(rig.cloth).team_id().unwrap();
        let mut api = rig.world.cloth(rig.cloth);
        api.add_force(Vec3::new(x, 1.0, 0.0), speed, ForceMode::VelocityAdd);
        api.add_force(Vec3::ZERO, 3.0, ForceMode::VelocityAdd);
        api.add_force(Vec3::X, 3.0, ForceMode::None);
        api.add_force(Vec3::X, f32::INFINITY, ForceMode::VelocityAdd);
        api.add_force(Vec3::X, f32::NAN, ForceMode::VelocityChange);

        let record = rig.world.teams().get(team).unwrap();
        prop_assert_eq!(record.force_mode, ForceMode::None);
        prop_assert_eq!(record.impact_force, Vec3::ZERO);
    }
}

#[test]
fn force_is_normalized_and_overwritten() {
    let mut rig = built_bone_rig();
    let team = rig.world.cloth(rig.cloth).team_id().unwrap();
    let mut api = rig.world.cloth(rig.cloth);
    api.add_force(Vec3::new(0.0, 0.0, 5.0), 1.0, ForceMode::VelocityAdd);
    api.add_force(Vec3::new(2.0, 0.0, 0.0), 3.0, ForceMode::VelocityChangeWithoutDepth);

    let record = rig.world.teams().get(team).unwrap();
    assert_eq!(record.force_mode, ForceMode::VelocityChangeWithoutDepth);
    assert_eq!(record.impact_force, Vec3::new(3.0, 0.0, 0.0));

    rig.world.tick(DT);
    let record = rig.world.teams().get(team).unwrap();
    assert_eq!(record.force_mode, ForceMode::None);
}

#[test]
fn reset_sets_flags_for_next_tick() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut scene = Scene::new();
    let (root, chain) = bone_scene(&mut scene);
    let mut world = ClothWorld::with_solver(
        scene,
        Box::new(RecordingSolver { seen: seen.clone() }),
    );
    let cloth = world.create(
        ClothSerializeData::new(ClothKind::BoneCloth { root_bones: vec![chain[0]] }, root),
        ClothSerializeData2::default(),
    );
    world.build(cloth);
    world.tick(DT);

    let team = world.cloth(cloth).team_id().unwrap();
    world
        .teams_mut()
        .get_ref(team)
        .unwrap()
        .flags
        .insert(TeamFlags::CAMERA_CULLING_KEEP);

    world.cloth(cloth).reset_cloth(false);
    let flags = world.teams().get(team).unwrap().flags;
    assert!(flags.contains(TeamFlags::RESET | TeamFlags::TIME_RESET));
    assert!(!flags.contains(TeamFlags::CAMERA_CULLING_KEEP));
    assert!(!world.process(cloth).unwrap().flags.contains(ProcessFlags::CAMERA_CULLING_KEEP));

    world.tick(DT);
    let observed = *seen.lock().unwrap().last().unwrap();
    assert!(observed.contains(TeamFlags::RESET | TeamFlags::TIME_RESET));
    assert!(!observed.contains(TeamFlags::CAMERA_CULLING_KEEP));

    // Consumed by that tick.
    let flags = world.teams().get(team).unwrap().flags;
    assert!(!flags.intersects(TeamFlags::RESET | TeamFlags::TIME_RESET));
    assert_eq!(world.teams().get(team).unwrap().time, 0.0);
}

#[test]
fn reset_keep_pose_teleports() {
    let mut rig = built_bone_rig();
    let team = rig.world.cloth(rig.cloth).team_id().unwrap();
    rig.world.cloth(rig.cloth).reset_cloth(true);
    let flags = rig.world.teams().get(team).unwrap().flags;
    assert!(flags.contains(TeamFlags::KEEP_TELEPORT));
    assert!(!flags.contains(TeamFlags::RESET));

    rig.world
        .scene_mut()
        .transforms
        .translate_subtree(rig.root, Vec3::new(5.0, 0.0, 0.0));
    rig.world.tick(DT);

    let tip = rig.world.scene().transforms.position(rig.chain[3]).unwrap();
    assert!((tip.x - 5.0).abs() < 0.05, "tip did not follow the teleport: {tip:?}");
}

#[test]
fn unbuilt_facade_calls_are_no_ops() {
    let mut rig = bone_rig();
    let mut api = rig.world.cloth(rig.cloth);
    api.reset_cloth(false);
    api.add_force(Vec3::X, 1.0, ForceMode::VelocityAdd);
    api.set_skip_writing(true);
    api.set_parameter_change();
    assert_eq!(api.center_position(), Vec3::ZERO);
    assert_eq!(api.team_id(), None);
    assert_eq!(api.replace_transforms(&HashMap::from([("hair0".to_string(), TransformId(0))])), 0);
    assert!(!rig.world.process(rig.cloth).unwrap().flags.contains(ProcessFlags::SKIP_WRITING));
}

#[test]
fn parameter_change_reaches_team() {
    let mut rig = built_bone_rig();
    let team = rig.world.cloth(rig.cloth).team_id().unwrap();
    let mut api = rig.world.cloth(rig.cloth);
    api.parameters_mut().unwrap().gravity = 0.0;
    api.parameters_mut().unwrap().damping = 0.5;
    api.set_parameter_change();

    let record = rig.world.teams().get(team).unwrap();
    assert_eq!(record.gravity, Vec3::ZERO);
    assert_eq!(record.damping, 0.5);
}

#[test]
fn center_position_tracks_particles() {
    let mut rig = built_bone_rig();
    let center = rig.world.cloth(rig.cloth).center_position();
    assert!(center.x.abs() < 0.05);
    assert!((center.y - (-0.5)).abs() < 0.05, "center {center:?}");
}

// ─── Scheduler Tests ──────────────────────────────────────────

#[test]
fn skip_writing_keeps_transforms() {
    let mut rig = built_bone_rig();
    let tip_before = rig.world.scene().transforms.position(rig.chain[3]).unwrap();
    {
        let mut api = rig.world.cloth(rig.cloth);
        api.set_skip_writing(true);
        api.add_force(Vec3::X, 5.0, ForceMode::VelocityChangeWithoutDepth);
    }
    for _ in 0..10 {
        rig.world.tick(DT);
    }

    let particle = rig
        .world
        .process(rig.cloth)
        .and_then(|p| p.runtime.as_ref())
        .map(|r| r.particles.position(3))
        .unwrap();
    assert!(particle.x > 0.05, "particles should move: {particle:?}");
    assert_eq!(rig.world.scene().transforms.position(rig.chain[3]).unwrap(), tip_before);

    rig.world.cloth(rig.cloth).set_skip_writing(false);
    rig.world.tick(DT);
    let tip_after = rig.world.scene().transforms.position(rig.chain[3]).unwrap();
    assert!(tip_after.x > 0.05);
}

#[test]
fn fixed_bones_follow_animation() {
    let mut rig = built_bone_rig();
    rig.world
        .scene_mut()
        .transforms
        .set_position(rig.chain[0], Vec3::new(0.0, 1.0, 0.0));
    for _ in 0..120 {
        rig.world.tick(DT);
    }
    let tip = rig.world.scene().transforms.position(rig.chain[3]).unwrap();
    assert!(tip.y > 0.0, "chain should hang from the moved root: {tip:?}");
}

#[test]
fn colliders_push_particles() {
    let mut scene = Scene::new();
    let (root, chain) = bone_scene(&mut scene);
    let floor = scene
        .transforms
        .create("floor", None, Pose::from_position(Vec3::new(0.0, -0.6, 0.0)));
    let mut data = ClothSerializeData::new(ClothKind::BoneCloth { root_bones: vec![chain[0]] }, root);
    data.colliders.push(ColliderDesc::new(floor, ColliderShape::Plane));
    let mut world = ClothWorld::new(scene);
    let cloth = world.create(data, ClothSerializeData2::default());
    world.build(cloth);

    let mut contacts = 0;
    for _ in 0..30 {
        contacts += world.tick(DT).contacts;
    }
    assert!(contacts > 0);
    let tip = world.scene().transforms.position(chain[3]).unwrap();
    assert!(tip.y > -0.6, "tip below floor: {tip:?}");
    assert!(world.cloth(cloth).used_transforms().contains(&floor));
}

#[test]
fn destroy_mid_build_drops_notification() {
    let (mut world, cloth, sheet) = mesh_world();
    let rx = world.subscribe();

    assert_eq!(world.build(cloth), BuildOutcome::Started);
    assert!(world.destroy(cloth));
    world.tick(DT);

    assert!(drain(&rx).is_empty());
    assert_eq!(world.teams().active_count(), 0);
    assert!(world.registry().is_empty());
    assert!(!world.cloth(cloth).is_valid());
    assert!(world.scene().renderers.get(sheet).is_some());
}

#[test]
fn destroy_built_releases_everything() {
    let (mut world, cloth, sheet) = mesh_world();
    let original = world.scene().renderers.get(sheet).unwrap().mesh;
    world.build(cloth);
    world.tick(DT);
    let rx = world.subscribe();

    assert!(world.destroy(cloth));
    assert!(!world.destroy(cloth));

    assert_eq!(world.teams().active_count(), 0);
    assert!(world.registry().is_empty());
    assert_eq!(world.scene().renderers.get(sheet).unwrap().mesh, original);
    assert_eq!(
        drain(&rx),
        vec![ClothNotification::RendererMeshChange {
            cloth,
            renderer: sheet,
            custom: false
        }]
    );
}

#[test]
fn team_slots_are_reused() {
    let mut rig = built_bone_rig();
    let first = rig.world.cloth(rig.cloth).team_id().unwrap();
    let data = rig.world.process(rig.cloth).unwrap().serialize_data.clone();
    rig.world.destroy(rig.cloth);

    let again = rig.world.create(data, ClothSerializeData2::default());
    assert_ne!(again, rig.cloth);
    rig.world.build(again);
    rig.world.tick(DT);
    assert_eq!(rig.world.cloth(again).team_id(), Some(first));
}

#[test]
fn telemetry_records_lifecycle() {
    let mut rig = bone_rig();
    let sink = SharedVecSink::new();
    rig.world.events_mut().add_sink(Box::new(sink.clone()));

    rig.world.build(rig.cloth);
    rig.world.tick(DT);

    let kinds: Vec<EventKind> = sink.snapshot().into_iter().map(|e| e.kind).collect();
    assert!(kinds.contains(&EventKind::BuildStarted { cloth: rig.cloth }));
    assert!(kinds.contains(&EventKind::BuildCompleted {
        cloth: rig.cloth,
        success: true
    }));
    assert!(kinds
        .iter()
        .any(|k| matches!(k, EventKind::TeamAllocated { cloth, .. } if *cloth == rig.cloth)));
    assert!(matches!(kinds.last(), Some(EventKind::TickEnd { .. })));
}

// ─── Mesh Binding Tests ───────────────────────────────────────

#[test]
fn mesh_cloth_binds_custom_mesh() {
    let (mut world, cloth, sheet) = mesh_world();
    let original = world.scene().renderers.get(sheet).unwrap().mesh;
    let renderer_transform = world.scene().renderers.get(sheet).unwrap().transform;
    let rx = world.subscribe();

    assert_eq!(world.build(cloth), BuildOutcome::Started);
    assert_eq!(world.cloth(cloth).custom_mesh(sheet), None);
    world.tick(DT);

    assert_eq!(
        drain(&rx),
        vec![
            ClothNotification::RendererMeshChange {
                cloth,
                renderer: sheet,
                custom: true
            },
            ClothNotification::BuildComplete {
                cloth,
                success: true
            },
        ]
    );

    let api = world.cloth(cloth);
    let custom = api.custom_mesh(sheet).unwrap();
    assert_ne!(custom, original);
    assert_eq!(api.original_mesh(sheet), Some(original));
    let bones = api.custom_bones(sheet).unwrap();
    assert_eq!(bones.len(), 6);
    assert_eq!(bones.last().copied().flatten(), Some(renderer_transform));
    assert_eq!(api.custom_mesh(RenderHandle(77)), None);

    let renderer = world.scene().renderers.get(sheet).unwrap();
    assert_eq!(renderer.mesh, custom);
    assert_eq!(renderer.bones, bones);
    assert!(world.process(cloth).unwrap().flags.contains(ProcessFlags::RENDERER_USE));
}

#[test]
fn mesh_cloth_writes_vertices() {
    let (mut world, cloth, sheet) = mesh_world();
    world.build(cloth);
    world.tick(DT);
    world
        .cloth(cloth)
        .add_force(Vec3::Z, 4.0, ForceMode::VelocityChange);
    for _ in 0..5 {
        world.tick(DT);
    }

    let custom = world.cloth(cloth).custom_mesh(sheet).unwrap();
    let mesh = world.scene().meshes.get(custom).unwrap();
    // Top row is fixed, bottom row swings.
    assert!(mesh.pos_z[0].abs() < 1e-5);
    let last = mesh.vertex_count() - 1;
    assert!(mesh.pos_z[last] > 0.01, "bottom vertex z = {}", mesh.pos_z[last]);
}

#[test]
fn reset_rebinds_lost_custom_mesh() {
    let (mut world, cloth, sheet) = mesh_world();
    world.build(cloth);
    world.tick(DT);
    let rx = world.subscribe();

    world.cloth(cloth).reset_cloth(false);
    assert!(drain(&rx).is_empty());
    assert!(world.process(cloth).unwrap().flags.contains(ProcessFlags::RENDERER_USE));
}

// ─── Transform Binding Tests ──────────────────────────────────

#[test]
fn used_transforms_order() {
    let rig = bone_rig();
    let mut world = rig.world;
    let used = world.cloth(rig.cloth).used_transforms();
    let mut expected = vec![rig.root];
    expected.extend(&rig.chain);
    assert_eq!(used, expected);
}

#[test]
fn replace_with_unknown_names_changes_nothing() {
    let mut rig = built_bone_rig();
    let before = rig.world.cloth(rig.cloth).used_transforms();

    let mut api = rig.world.cloth(rig.cloth);
    assert_eq!(api.replace_transforms(&HashMap::new()), 0);
    let renaming = HashMap::from([("nobody".to_string(), TransformId(0))]);
    assert_eq!(api.replace_transforms(&renaming), 0);
    assert_eq!(api.used_transforms(), before);
}

#[test]
fn replace_all_bone_transforms() {
    let mut rig = built_bone_rig();
    let used = rig.world.cloth(rig.cloth).used_transforms();

    let mut renaming = HashMap::new();
    for &t in &used {
        let name = rig.world.scene().transforms.name(t).unwrap().to_string();
        let pose = rig.world.scene().transforms.pose(t).unwrap();
        let new = rig.world.scene_mut().transforms.create(name.clone(), None, pose);
        renaming.insert(name, new);
    }

    let replaced = rig.world.cloth(rig.cloth).replace_transforms(&renaming);
    assert_eq!(replaced, used.len());

    let now: HashSet<TransformId> = rig.world.cloth(rig.cloth).used_transforms().into_iter().collect();
    let expected: HashSet<TransformId> = renaming.values().copied().collect();
    assert_eq!(now, expected);

    // Simulation now drives the replacements.
    rig.world
        .cloth(rig.cloth)
        .add_force(Vec3::X, 5.0, ForceMode::VelocityChangeWithoutDepth);
    for _ in 0..5 {
        rig.world.tick(DT);
    }
    let old_tip = rig.world.scene().transforms.position(rig.chain[3]).unwrap();
    let new_tip = rig.world.scene().transforms.position(renaming["hair3"]).unwrap();
    assert_eq!(old_tip.x, 0.0);
    assert!(new_tip.x > 0.01);
}

#[test]
fn replace_mesh_transforms_updates_bindings() {
    let (mut world, cloth, sheet) = mesh_world();
    world.build(cloth);
    world.tick(DT);
    let used = world.cloth(cloth).used_transforms();

    let mut renaming = HashMap::new();
    for &t in &used {
        let name = world.scene().transforms.name(t).unwrap().to_string();
        let new = world.scene_mut().transforms.create(name.clone(), None, Pose::IDENTITY);
        renaming.insert(name, new);
    }
    let replaced = world.cloth(cloth).replace_transforms(&renaming);
    assert_eq!(replaced, used.len());

    let fresh: HashSet<TransformId> = renaming.values().copied().collect();
    let api = world.cloth(cloth);
    let now: HashSet<TransformId> = api.used_transforms().into_iter().collect();
    assert_eq!(now, fresh);
    let bones = api.custom_bones(sheet).unwrap();
    assert!(bones.iter().flatten().all(|t| fresh.contains(t)));
    let renderer = world.scene().renderers.get(sheet).unwrap();
    assert!(renderer.bones.iter().flatten().all(|t| fresh.contains(t)));
    assert_eq!(renderer.transform, renaming["sheet"]);

    // Fixed vertices follow the replacement renderer transform only.
    let fixed_positions = |world: &ClothWorld| -> Vec<Vec3> {
        let runtime = world.process(cloth).unwrap().runtime.as_ref().unwrap();
        (0..runtime.particles.count)
            .filter(|&i| runtime.particles.is_fixed(i))
            .map(|i| runtime.particles.position(i))
            .collect()
    };
    world.tick(DT);
    let before = fixed_positions(&world);
    assert!(!before.is_empty());
    world
        .scene_mut()
        .transforms
        .set_position(renaming["sheet"], Vec3::new(5.0, 0.0, 0.0));
    world.tick(DT);
    let after = fixed_positions(&world);
    for (b, a) in before.iter().zip(&after) {
        assert!((*a - *b - Vec3::X * 5.0).length() < 1e-4, "{b:?} -> {a:?}");
    }
}

#[test]
fn duplicate_names_share_replacement() {
    let mut scene = Scene::new();
    let root = scene.transforms.create("rig", None, Pose::IDENTITY);
    let a = scene.transforms.create("twin", Some(root), Pose::IDENTITY);
    let b = scene.transforms.create("twin", Some(a), Pose::from_position(Vec3::NEG_Y));
    let mut world = ClothWorld::new(scene);
    let cloth = world.create(
        ClothSerializeData::new(ClothKind::BoneSpring { root_bones: vec![a] }, root),
        ClothSerializeData2::default(),
    );
    world.build(cloth);
    world.tick(DT);

    let new = world
        .scene_mut()
        .transforms
        .create("twin", None, Pose::IDENTITY);
    let renaming = HashMap::from([("twin".to_string(), new)]);
    assert_eq!(world.cloth(cloth).replace_transforms(&renaming), 2);

    let used = world.cloth(cloth).used_transforms();
    assert_eq!(used, vec![root, new]);
    assert!(!used.contains(&b));
}
