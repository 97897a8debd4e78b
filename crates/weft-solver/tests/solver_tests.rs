//! Integration tests for weft-solver.

use weft_math::{Pose, Quat, Vec3};
use weft_solver::{
    ColliderShape, ColliderSymmetryMode, ParticleSeed, ParticleState, ReferenceSolver,
    SolverConfig, TeamSolver, WorldCollider,
};
use weft_team::{ForceMode, TeamRecord};
use weft_types::ClothId;

/// A vertical chain hanging from a fixed root at the origin.
fn chain(count: usize, spacing: f32) -> Vec<ParticleSeed> {
    (0..count)
        .map(|i| ParticleSeed {
            position: Vec3::new(0.0, -(i as f32) * spacing, 0.0),
            parent: if i == 0 { None } else { Some(i as u32 - 1) },
            fixed: i == 0,
            depth: if count > 1 { i as f32 / (count - 1) as f32 } else { 0.0 },
        })
        .collect()
}

// ─── ParticleState Tests ──────────────────────────────────────

#[test]
fn state_from_seeds() {
    let state = ParticleState::from_seeds(&chain(4, 0.5), 0.1).unwrap();

    assert_eq!(state.count, 4);
    assert_eq!(state.inv_mass[0], 0.0);
    assert!((state.inv_mass[1] - 10.0).abs() < 1e-5);
    assert!((state.rest_length[2] - 0.5).abs() < 1e-6);
    assert_eq!(state.rest_length[0], 0.0);
    assert!(state.vel_y.iter().all(|&v| v == 0.0));
}

#[test]
fn state_rejects_bad_parent() {
    let mut seeds = chain(3, 0.5);
    seeds[2].parent = Some(7);
    assert!(ParticleState::from_seeds(&seeds, 0.1).is_err());

    let mut seeds = chain(3, 0.5);
    seeds[1].parent = Some(1);
    assert!(ParticleState::from_seeds(&seeds, 0.1).is_err());
}

#[test]
fn state_rejects_non_positive_mass() {
    assert!(ParticleState::from_seeds(&chain(2, 0.5), 0.0).is_err());
}

#[test]
fn state_predict_pins_fixed_to_base() {
    let mut state = ParticleState::from_seeds(&chain(3, 0.5), 0.1).unwrap();
    state.set_base(0, Vec3::new(1.0, 2.0, 3.0));

    let dt = 1.0 / 60.0;
    state.predict(dt, Vec3::new(0.0, -9.81, 0.0));

    assert_eq!(state.position(0), Vec3::new(1.0, 2.0, 3.0));
    let expected = -0.5 + dt * dt * -9.81;
    assert!((state.pos_y[1] - expected).abs() < 1e-6);
}

#[test]
fn state_force_modes() {
    let mut state = ParticleState::from_seeds(&chain(3, 0.5), 0.1).unwrap();
    let force = Vec3::new(2.0, 0.0, 0.0);

    state.apply_force(force, ForceMode::VelocityAdd);
    assert_eq!(state.velocity(0), Vec3::ZERO); // fixed root never moves
    assert!((state.vel_x[1] - 1.0).abs() < 1e-6); // depth 0.5
    assert!((state.vel_x[2] - 2.0).abs() < 1e-6);

    state.apply_force(force, ForceMode::VelocityAddWithoutDepth);
    assert!((state.vel_x[1] - 3.0).abs() < 1e-6);

    state.apply_force(Vec3::new(0.0, 1.0, 0.0), ForceMode::VelocityChangeWithoutDepth);
    assert_eq!(state.velocity(1), Vec3::Y);

    state.apply_force(Vec3::new(5.0, 5.0, 5.0), ForceMode::None);
    assert_eq!(state.velocity(1), Vec3::Y);
}

#[test]
fn state_reset_to_base() {
    let mut state = ParticleState::from_seeds(&chain(3, 0.5), 0.1).unwrap();
    state.set_position(2, Vec3::new(4.0, 4.0, 4.0));
    state.set_velocity(2, Vec3::ONE);

    state.reset_to_base();

    assert_eq!(state.position(2), Vec3::new(0.0, -1.0, 0.0));
    assert_eq!(state.velocity(2), Vec3::ZERO);
    assert_eq!(state.prev_y[2], -1.0);
}

#[test]
fn state_translate_keeps_velocity() {
    let mut state = ParticleState::from_seeds(&chain(2, 0.5), 0.1).unwrap();
    state.set_velocity(1, Vec3::X);
    state.translate(Vec3::new(0.0, 0.0, 10.0));

    assert_eq!(state.pos_z[1], 10.0);
    assert_eq!(state.prev_z[1], 10.0);
    assert_eq!(state.velocity(1), Vec3::X);
}

#[test]
fn state_center_of_mass_ignores_fixed() {
    let state = ParticleState::from_seeds(&chain(3, 1.0), 0.1).unwrap();
    let com = state.center_of_mass();
    assert!((com.y - (-1.5)).abs() < 1e-5);
}

// ─── Collider Tests ───────────────────────────────────────────

#[test]
fn plane_pushes_particles_up() {
    let mut state = ParticleState::from_seeds(&chain(3, 1.0), 0.1).unwrap();
    let floor = WorldCollider::from_anchor(
        ColliderShape::Plane,
        &Pose::from_position(Vec3::new(0.0, -1.5, 0.0)),
        Vec3::ZERO,
    );

    let result = floor.resolve(&mut state, 0.0);

    assert_eq!(result.resolved_count, 1);
    assert!((state.pos_y[2] - (-1.5)).abs() < 1e-6);
    assert!((result.max_penetration - 0.5).abs() < 1e-6);
}

#[test]
fn sphere_pushes_particles_out() {
    let mut state = ParticleState::from_seeds(&chain(2, 1.0), 0.1).unwrap();
    let ball = WorldCollider::from_anchor(
        ColliderShape::Sphere { radius: 0.5 },
        &Pose::IDENTITY,
        Vec3::new(0.0, -1.2, 0.0),
    );

    ball.resolve(&mut state, 0.0);

    let dist = state.position(1).distance(Vec3::new(0.0, -1.2, 0.0));
    assert!((dist - 0.5).abs() < 1e-5);
}

#[test]
fn symmetry_target_requirement() {
    assert!(!ColliderSymmetryMode::None.requires_target());
    assert!(!ColliderSymmetryMode::AutomaticHumanBody.requires_target());
    assert!(ColliderSymmetryMode::AutomaticTarget.requires_target());
    assert!(ColliderSymmetryMode::XSymmetry.requires_target());
    assert!(ColliderSymmetryMode::XYZSymmetry.requires_target());
}

#[test]
fn symmetry_mirrors_through_frame() {
    let frame = Pose::from_position(Vec3::new(1.0, 0.0, 0.0));
    let p = Vec3::new(3.0, 2.0, 1.0);

    assert_eq!(ColliderSymmetryMode::None.mirror_point(p, &frame), None);
    let x = ColliderSymmetryMode::XSymmetry.mirror_point(p, &frame).unwrap();
    assert!((x - Vec3::new(-1.0, 2.0, 1.0)).length() < 1e-5);
    let xyz = ColliderSymmetryMode::XYZSymmetry.mirror_point(p, &frame).unwrap();
    assert!((xyz - Vec3::new(-1.0, -2.0, -1.0)).length() < 1e-5);

    let rotated = Pose::new(Vec3::ZERO, Quat::from_rotation_y(std::f32::consts::FRAC_PI_2), Vec3::ONE);
    let m = ColliderSymmetryMode::XSymmetry
        .mirror_point(Vec3::new(0.0, 0.0, 1.0), &rotated)
        .unwrap();
    assert!((m - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
}

// ─── SolverConfig Tests ───────────────────────────────────────

#[test]
fn solver_config_from_partial_toml() {
    let config: SolverConfig = toml::from_str("iterations = 8\nmax_velocity = 0.0").unwrap();
    assert_eq!(config.iterations, 8);
    assert_eq!(config.max_velocity, 0.0);
    let defaults = SolverConfig::default();
    assert_eq!(config.collision_margin, defaults.collision_margin);
    assert_eq!(config.max_dt, defaults.max_dt);
}

#[test]
fn debug_config_is_single_iteration() {
    let config = SolverConfig::debug();
    assert_eq!(config.iterations, 1);
    assert_eq!(config.max_velocity, 0.0);
}

// ─── ReferenceSolver Tests ────────────────────────────────────

#[test]
fn reference_solver_name() {
    assert_eq!(ReferenceSolver::default().name(), "reference");
}

#[test]
fn reference_solver_zero_dt_is_static() {
    let mut solver = ReferenceSolver::default();
    let mut team = TeamRecord::new(ClothId(0));
    let mut state = ParticleState::from_seeds(&chain(3, 0.5), 0.1).unwrap();
    let before = state.pos_y.clone();

    let result = solver.step(&mut team, &mut state, &[], 0.0).unwrap();

    assert_eq!(state.pos_y, before);
    assert_eq!(result.iterations, 0);
    assert_eq!(team.step_count, 0);
}

#[test]
fn reference_solver_keeps_chain_length() {
    let mut solver = ReferenceSolver::new(SolverConfig {
        iterations: 16,
        ..Default::default()
    });
    let mut team = TeamRecord::new(ClothId(0));
    let mut state = ParticleState::from_seeds(&chain(4, 0.5), 0.1).unwrap();
    team.set_force(Vec3::new(3.0, 0.0, 0.0), ForceMode::VelocityAddWithoutDepth);

    for _ in 0..60 {
        solver.step(&mut team, &mut state, &[], 1.0 / 60.0).unwrap();
    }

    assert_eq!(state.position(0), Vec3::ZERO);
    for i in 1..4 {
        let len = state.position(i).distance(state.position(i - 1));
        assert!((len - 0.5).abs() < 0.05, "segment {i} length {len}");
    }
    assert_eq!(team.step_count, 60);
    assert!(team.time > 0.9);
}

#[test]
fn reference_solver_consumes_force_once() {
    let mut solver = ReferenceSolver::new(SolverConfig::debug());
    let mut team = TeamRecord::new(ClothId(0));
    team.gravity = Vec3::ZERO;
    team.damping = 0.0;
    let mut state = ParticleState::from_seeds(&chain(2, 0.5), 0.1).unwrap();
    state.parent[1] = None;

    team.set_force(Vec3::new(1.0, 0.0, 0.0), ForceMode::VelocityChangeWithoutDepth);
    solver.step(&mut team, &mut state, &[], 0.02).unwrap();

    assert_eq!(team.force_mode, ForceMode::None);
    assert_eq!(team.impact_force, Vec3::ZERO);
    assert!((state.pos_x[1] - 0.02).abs() < 1e-5);
}

#[test]
fn reference_solver_rests_on_floor() {
    let mut solver = ReferenceSolver::default();
    let mut team = TeamRecord::new(ClothId(0));
    let mut state = ParticleState::from_seeds(&chain(3, 0.5), 0.1).unwrap();
    let floor = WorldCollider::from_anchor(
        ColliderShape::Plane,
        &Pose::from_position(Vec3::new(0.0, -0.75, 0.0)),
        Vec3::ZERO,
    );

    for _ in 0..120 {
        solver.step(&mut team, &mut state, &[floor], 1.0 / 60.0).unwrap();
    }

    let margin = solver.config().collision_margin;
    for i in 1..3 {
        assert!(state.pos_y[i] >= -0.75 + margin - 1e-3, "particle {i} below floor");
    }
}
