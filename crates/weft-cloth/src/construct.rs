//! Data generation and construction.
//!
//! A runtime build produces a [`PreBuildPayload`] from the live scene;
//! a pre-built cloth decodes one from its blob. Both are then resolved
//! into a [`ClothRuntime`] against the cloth's current configuration.

use std::collections::{HashMap, VecDeque};

use weft_math::Vec3;
use weft_render::RenderRegistry;
use weft_scene::{Scene, SkinnedMesh};
use weft_solver::{ParticleSeed, ParticleState};
use weft_types::constants::PRE_BUILD_VERSION;
use weft_types::{TransformId, WeftError, WeftResult};

use crate::config::{ClothKind, ClothParameters, ClothSerializeData};
use crate::prebuild::{AnchorRef, PayloadKind, PreBuildPayload, PrebuiltParticle};
use crate::process::{ClothInitData, ClothRuntime, ParticleAnchor};
use crate::selection::{bone_particles, SelectionData, VertexAttribute};

/// Resolves and validates a cloth declaration against the scene.
pub fn generate_initialization(data: &ClothSerializeData, scene: &Scene) -> WeftResult<ClothInitData> {
    data.parameters.validate()?;

    let alive = |t: TransformId, what: &str| -> WeftResult<()> {
        if scene.transforms.contains(t) {
            Ok(())
        } else {
            Err(WeftError::InvalidTransform(format!("{what} {t} does not exist")))
        }
    };
    alive(data.cloth_transform, "cloth transform")?;

    let mut bones = Vec::new();
    if data.kind.is_bone() {
        let roots = data.kind.root_bones();
        if roots.is_empty() {
            return Err(WeftError::InvalidConfig(format!(
                "{} has no root bones",
                data.kind.label()
            )));
        }
        for &root in roots {
            alive(root, "root bone")?;
        }
        bones = bone_particles(&scene.transforms, roots);
    }

    let renderers = data.kind.renderers().to_vec();
    if !data.kind.is_bone() && renderers.is_empty() {
        return Err(WeftError::InvalidConfig("mesh cloth has no renderers".into()));
    }
    for &handle in &renderers {
        if scene.renderers.get(handle).is_none() {
            return Err(WeftError::UnknownHandle(format!("{handle} is not in the scene")));
        }
    }

    let mut collider_anchors = Vec::with_capacity(data.colliders.len());
    for collider in &data.colliders {
        alive(collider.anchor, "collider anchor")?;
        if let Some(target) = collider.effective_target() {
            alive(target, "symmetry target")?;
        }
        collider_anchors.push(collider.anchor);
    }

    Ok(ClothInitData {
        cloth_transform: data.cloth_transform,
        bones,
        renderers,
        collider_anchors,
    })
}

fn payload_kind(kind: &ClothKind) -> PayloadKind {
    match kind {
        ClothKind::BoneCloth { .. } => PayloadKind::BoneCloth,
        ClothKind::BoneSpring { .. } => PayloadKind::BoneSpring,
        ClothKind::MeshCloth { .. } => PayloadKind::MeshCloth,
    }
}

/// Runtime construction: derives particles from the current scene.
///
/// `selection` is used when it fits the particle count, otherwise a
/// default one is derived.
pub fn construct_payload(
    kind: &ClothKind,
    init: &ClothInitData,
    selection: Option<&SelectionData>,
    registry: &RenderRegistry,
    scene: &Scene,
) -> WeftResult<PreBuildPayload> {
    let (particles, selection) = if kind.is_bone() {
        construct_bones(kind, init, selection, scene)?
    } else {
        construct_meshes(init, selection, registry, scene)?
    };
    Ok(PreBuildPayload {
        version: PRE_BUILD_VERSION,
        kind: payload_kind(kind),
        particles,
        selection,
    })
}

fn construct_bones(
    kind: &ClothKind,
    init: &ClothInitData,
    selection: Option<&SelectionData>,
    scene: &Scene,
) -> WeftResult<(Vec<PrebuiltParticle>, SelectionData)> {
    let selection = match selection {
        Some(s) if s.is_valid_for(init.bones.len()) => s.clone(),
        _ => SelectionData::for_bones(kind.root_bones(), &init.bones)
            .ok_or_else(|| WeftError::InvalidConfig("bone cloth has no particles".into()))?,
    };
    let root = scene
        .transforms
        .pose(init.cloth_transform)
        .ok_or_else(|| WeftError::InvalidTransform(format!("{} vanished", init.cloth_transform)))?;
    let index: HashMap<TransformId, usize> =
        init.bones.iter().enumerate().map(|(i, &t)| (t, i)).collect();

    let mut positions = Vec::with_capacity(init.bones.len());
    let mut parents = Vec::with_capacity(init.bones.len());
    let mut levels: Vec<u32> = Vec::with_capacity(init.bones.len());
    for &t in &init.bones {
        let node = scene
            .transforms
            .get(t)
            .ok_or_else(|| WeftError::InvalidTransform(format!("bone {t} vanished")))?;
        let parent = node.parent.and_then(|p| index.get(&p).copied());
        let level = parent.map_or(0, |p| levels[p] + 1);
        levels.push(level);
        positions.push(node.pose.position);
        parents.push(parent);
    }
    let max_level = levels.iter().copied().max().unwrap_or(0).max(1) as f32;

    let particles = (0..init.bones.len())
        .map(|i| {
            let position = positions[i];
            let local = match parents[i] {
                Some(p) => root.rotation.inverse() * (position - positions[p]),
                None => root.inverse_transform_point(position),
            };
            PrebuiltParticle {
                anchor: AnchorRef::Bone(i as u32),
                seed: ParticleSeed {
                    position,
                    parent: parents[i].map(|p| p as u32),
                    fixed: selection.attributes[i] != VertexAttribute::Move,
                    depth: levels[i] as f32 / max_level,
                },
                local,
            }
        })
        .collect();
    Ok((particles, selection))
}

/// Derives Fixed/Move for one mesh: vertices dominated by the lowest
/// weighted bone slot are fixed.
fn default_mesh_attributes(mesh: &SkinnedMesh) -> Vec<VertexAttribute> {
    let lowest = mesh.skinning_bone_mask().iter().position(|&u| u);
    (0..mesh.vertex_count())
        .map(|v| {
            let weights = &mesh.bone_weights[v];
            let dominant = (0..weights.len())
                .max_by(|&a, &b| weights[a].total_cmp(&weights[b]))
                .filter(|&k| weights[k] > 0.0)
                .map(|k| mesh.bone_indices[v][k] as usize);
            if dominant.is_some() && dominant == lowest {
                VertexAttribute::Fixed
            } else {
                VertexAttribute::Move
            }
        })
        .collect()
}

/// Breadth-first parent tree over triangle edges, rooted at non-moving vertices.
///
/// Returns `(parent, hops)` per vertex; unreachable vertices have no parent.
fn mesh_tree(mesh: &SkinnedMesh, attributes: &[VertexAttribute]) -> (Vec<Option<usize>>, Vec<Option<u32>>) {
    let n = mesh.vertex_count();
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
    for tri in mesh.indices.chunks_exact(3) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            let (a, b) = (a as usize, b as usize);
            if !adjacency[a].contains(&b) {
                adjacency[a].push(b);
                adjacency[b].push(a);
            }
        }
    }

    let mut parent = vec![None; n];
    let mut hops = vec![None; n];
    let mut queue = VecDeque::new();
    for v in 0..n {
        if attributes[v] != VertexAttribute::Move {
            hops[v] = Some(0);
            queue.push_back(v);
        }
    }
    while let Some(v) = queue.pop_front() {
        let next = hops[v].map_or(0, |h| h + 1);
        for &w in &adjacency[v] {
            if hops[w].is_none() {
                hops[w] = Some(next);
                parent[w] = Some(v);
                queue.push_back(w);
            }
        }
    }
    (parent, hops)
}

fn construct_meshes(
    init: &ClothInitData,
    selection: Option<&SelectionData>,
    registry: &RenderRegistry,
    scene: &Scene,
) -> WeftResult<(Vec<PrebuiltParticle>, SelectionData)> {
    let mut meshes = Vec::with_capacity(init.renderers.len());
    for &handle in &init.renderers {
        let renderer = scene
            .renderers
            .get(handle)
            .ok_or_else(|| WeftError::UnknownHandle(format!("{handle} left the scene")))?;
        let mesh_id = registry
            .get_binding(handle)
            .map_or(renderer.mesh, |b| b.original_mesh);
        let mesh = scene
            .meshes
            .get(mesh_id)
            .ok_or_else(|| WeftError::InvalidMesh(format!("{handle} has no mesh")))?;
        mesh.validate()?;
        let pose = scene
            .transforms
            .pose(renderer.transform)
            .ok_or_else(|| WeftError::InvalidTransform(format!("{} vanished", renderer.transform)))?;
        meshes.push((mesh, pose));
    }

    let total: usize = meshes.iter().map(|(m, _)| m.vertex_count()).sum();
    let selection = match selection {
        Some(s) if s.is_valid_for(total) => s.clone(),
        _ => SelectionData::new(
            meshes.iter().flat_map(|(m, _)| default_mesh_attributes(m)).collect(),
            false,
        ),
    };
    if selection.is_empty() {
        return Err(WeftError::InvalidMesh("mesh cloth has no vertices".into()));
    }

    let mut particles = Vec::with_capacity(total);
    let mut offset = 0;
    for (r, (mesh, pose)) in meshes.iter().enumerate() {
        let n = mesh.vertex_count();
        let attributes = &selection.attributes[offset..offset + n];
        let (parent, hops) = mesh_tree(mesh, attributes);
        let max_hops = hops.iter().flatten().copied().max().unwrap_or(0).max(1) as f32;

        for v in 0..n {
            let local = mesh.position(v);
            particles.push(PrebuiltParticle {
                anchor: AnchorRef::Vertex {
                    renderer: r as u32,
                    vertex: v as u32,
                },
                seed: ParticleSeed {
                    position: pose.transform_point(local),
                    parent: parent[v].map(|p| (p + offset) as u32),
                    fixed: attributes[v] != VertexAttribute::Move,
                    depth: hops[v].map_or(1.0, |h| h as f32 / max_hops),
                },
                local,
            });
        }
        offset += n;
    }
    Ok((particles, selection))
}

/// Turns a payload into runtime data bound to `init`.
pub fn resolve_payload(
    payload: &PreBuildPayload,
    kind: &ClothKind,
    init: &ClothInitData,
    parameters: &ClothParameters,
    scene: &Scene,
) -> WeftResult<ClothRuntime> {
    if payload.kind != payload_kind(kind) {
        return Err(WeftError::PreBuild(format!(
            "payload built for {:?}, cloth is {}",
            payload.kind,
            kind.label()
        )));
    }

    let mut anchors = Vec::with_capacity(payload.particles.len());
    for particle in &payload.particles {
        let anchor = match particle.anchor {
            AnchorRef::Bone(i) => init
                .bones
                .get(i as usize)
                .map(|&t| ParticleAnchor::Transform(t))
                .ok_or_else(|| WeftError::PreBuild(format!("bone particle {i} has no transform")))?,
            AnchorRef::Vertex { renderer, vertex } => {
                let handle = init.renderers.get(renderer as usize).copied().ok_or_else(|| {
                    WeftError::PreBuild(format!("renderer slot {renderer} is not configured"))
                })?;
                let vertex_count = scene
                    .renderers
                    .get(handle)
                    .and_then(|r| scene.meshes.get(r.mesh))
                    .map_or(0, SkinnedMesh::vertex_count);
                if vertex as usize >= vertex_count {
                    return Err(WeftError::PreBuild(format!(
                        "vertex {vertex} out of range for {handle} ({vertex_count} vertices)"
                    )));
                }
                ParticleAnchor::Vertex {
                    renderer: handle,
                    vertex: vertex as usize,
                }
            }
        };
        anchors.push(anchor);
    }

    let seeds: Vec<ParticleSeed> = payload.particles.iter().map(|p| p.seed).collect();
    let particles = ParticleState::from_seeds(&seeds, parameters.particle_mass)?;
    Ok(ClothRuntime {
        particles,
        anchors,
        local: payload.particles.iter().map(|p| p.local).collect::<Vec<Vec3>>(),
    })
}
