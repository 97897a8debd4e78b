//! Procedural scene content for tests, the CLI, and demos.
//!
//! These generators produce deterministic, resolution-configurable
//! bone chains and skinned sheets.

use weft_math::{Pose, Vec3};
use weft_types::{RenderHandle, TransformId};

use crate::mesh::{SkinnedMesh, MAX_INFLUENCES};
use crate::renderer::Renderer;
use crate::scene::Scene;
use crate::transform::TransformArena;

/// Creates a straight bone chain hanging along -Y from `origin`.
///
/// Bones are named `{prefix}{i}`; bone `0` is parented to `parent`
/// and every later bone to its predecessor.
///
/// # Example
/// ```
/// use weft_scene::TransformArena;
/// use weft_scene::generators::bone_chain;
/// use weft_math::Vec3;
/// let mut arena = TransformArena::new();
/// let chain = bone_chain(&mut arena, "hair", None, Vec3::ZERO, 4, 0.1);
/// assert_eq!(chain.len(), 4);
/// assert_eq!(arena.name(chain[3]), Some("hair3"));
/// ```
pub fn bone_chain(
    transforms: &mut TransformArena,
    prefix: &str,
    parent: Option<TransformId>,
    origin: Vec3,
    count: usize,
    spacing: f32,
) -> Vec<TransformId> {
    let mut chain = Vec::with_capacity(count);
    let mut up = parent;
    for i in 0..count {
        let position = origin - Vec3::Y * (spacing * i as f32);
        let id = transforms.create(format!("{prefix}{i}"), up, Pose::from_position(position));
        chain.push(id);
        up = Some(id);
    }
    chain
}

/// Generates a flat rectangular skinned grid in the XY plane.
///
/// The grid spans `[-width/2, width/2]` in X and `[0, -height]` in Y
/// (hanging down from the origin). Vertex rows are rigidly bound to
/// `bone_count` bone slots, top rows to slot 0.
///
/// # Arguments
/// - `cols`: Number of quads along X (vertex count = cols + 1).
/// - `rows`: Number of quads along Y (vertex count = rows + 1).
/// - `bone_count`: Number of bone slots (at least 1).
pub fn skinned_grid(
    name: &str,
    cols: usize,
    rows: usize,
    width: f32,
    height: f32,
    bone_count: usize,
) -> SkinnedMesh {
    let bone_count = bone_count.max(1);
    let verts_x = cols + 1;
    let verts_y = rows + 1;
    let mut mesh = SkinnedMesh::with_capacity(name, verts_x * verts_y, cols * rows * 2);
    mesh.bone_count = bone_count;

    let half_w = width / 2.0;
    for j in 0..verts_y {
        let v = j as f32 / rows.max(1) as f32;
        let bone = ((j * bone_count) / verts_y).min(bone_count - 1) as u16;
        for i in 0..verts_x {
            let u = i as f32 / cols.max(1) as f32;
            mesh.pos_x.push(-half_w + u * width);
            mesh.pos_y.push(-v * height);
            mesh.pos_z.push(0.0);

            let mut idx = [0u16; MAX_INFLUENCES];
            let mut w = [0.0f32; MAX_INFLUENCES];
            idx[0] = bone;
            w[0] = 1.0;
            mesh.bone_indices.push(idx);
            mesh.bone_weights.push(w);
        }
    }

    // Two triangles per quad
    for j in 0..rows {
        for i in 0..cols {
            let top_left = (j * verts_x + i) as u32;
            let top_right = top_left + 1;
            let bot_left = top_left + verts_x as u32;
            let bot_right = bot_left + 1;

            mesh.indices.extend_from_slice(&[top_left, bot_left, top_right]);
            mesh.indices.extend_from_slice(&[top_right, bot_left, bot_right]);
        }
    }

    mesh
}

/// Spawns a skinned sheet renderer into `scene`.
///
/// Creates a renderer transform named `name` at `origin`, a bone chain
/// `{name}_bone{i}` below it, a [`skinned_grid`] mesh, and the renderer
/// itself with the chain as its bone list.
#[allow(clippy::too_many_arguments)]
pub fn skinned_sheet(
    scene: &mut Scene,
    name: &str,
    origin: Vec3,
    cols: usize,
    rows: usize,
    width: f32,
    height: f32,
    bone_count: usize,
) -> RenderHandle {
    let root = scene
        .transforms
        .create(name, None, Pose::from_position(origin));
    let spacing = height / bone_count.max(1) as f32;
    let bones = bone_chain(
        &mut scene.transforms,
        &format!("{name}_bone"),
        Some(root),
        origin,
        bone_count.max(1),
        spacing,
    );
    let mesh = skinned_grid(&format!("{name}_mesh"), cols, rows, width, height, bone_count);
    let mesh_id = scene.meshes.insert(mesh);
    scene.renderers.add(Renderer::new(name, root, mesh_id, bones))
}
