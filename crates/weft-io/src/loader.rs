//! Scene file loading and instantiation.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};
use weft_cloth::{
    ClothKind, ClothSerializeData, ClothSerializeData2, ClothWorld, ColliderDesc, PreBuildData,
};
use weft_math::Pose;
use weft_scene::generators::{bone_chain, skinned_sheet};
use weft_scene::Scene;
use weft_solver::ReferenceSolver;
use weft_types::{ClothId, RenderHandle, TransformId, WeftError, WeftResult};

use crate::contract::{ClothDecl, ClothKindDecl, SceneDescription, SimulationParams};
use crate::validator::validate_description;

/// A description turned into live objects.
pub struct LoadedScene {
    pub world: ClothWorld,
    /// Cloth names paired with their ids, in declaration order.
    pub cloths: Vec<(String, ClothId)>,
    pub simulation: SimulationParams,
}

impl LoadedScene {
    /// Looks up a cloth by its declared name.
    pub fn cloth_id(&self, name: &str) -> Option<ClothId> {
        self.cloths.iter().find(|(n, _)| n == name).map(|(_, id)| *id)
    }
}

/// Reads a scene description. `.toml` files are parsed as TOML, anything
/// else as JSON.
pub fn load_description(path: &Path) -> WeftResult<SceneDescription> {
    let text = std::fs::read_to_string(path)?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let desc = if is_toml { parse_toml(&text)? } else { parse_json(&text)? };
    debug!(path = %path.display(), cloths = desc.cloths.len(), "scene description loaded");
    Ok(desc)
}

pub fn parse_json(text: &str) -> WeftResult<SceneDescription> {
    serde_json::from_str(text).map_err(|e| WeftError::Serialization(e.to_string()))
}

pub fn parse_toml(text: &str) -> WeftResult<SceneDescription> {
    toml::from_str(text).map_err(|e| WeftError::Serialization(e.to_string()))
}

/// Validates a description and builds the scene and cloth instances it
/// declares. Cloths are created but not started.
///
/// Pre-build paths are resolved against `base_dir` when given.
pub fn instantiate(desc: &SceneDescription, base_dir: Option<&Path>) -> WeftResult<LoadedScene> {
    validate_description(desc)?;

    let mut scene = Scene::new();
    scene.set_playing(desc.playing);
    let mut names: HashMap<String, TransformId> = HashMap::new();
    let mut sheets: HashMap<String, RenderHandle> = HashMap::new();

    for t in &desc.transforms {
        let parent = t.parent.as_ref().and_then(|p| names.get(p).copied());
        let id = scene
            .transforms
            .create(t.name.clone(), parent, Pose::from_position(t.position));
        names.insert(t.name.clone(), id);
    }
    for chain in &desc.chains {
        let parent = chain.parent.as_ref().and_then(|p| names.get(p).copied());
        let ids = bone_chain(
            &mut scene.transforms,
            &chain.prefix,
            parent,
            chain.origin,
            chain.count,
            chain.spacing,
        );
        names.extend(chain.bone_names().zip(ids));
    }
    for sheet in &desc.sheets {
        let handle = skinned_sheet(
            &mut scene,
            &sheet.name,
            sheet.origin,
            sheet.cols,
            sheet.rows,
            sheet.width,
            sheet.height,
            sheet.bones,
        );
        let renderer = scene
            .renderers
            .get(handle)
            .ok_or_else(|| WeftError::UnknownHandle(format!("renderer {handle}")))?;
        names.insert(sheet.name.clone(), renderer.transform);
        names.extend(sheet.bone_names().zip(renderer.bones.iter().flatten().copied()));
        sheets.insert(sheet.name.clone(), handle);
    }

    let solver = ReferenceSolver::new(desc.simulation.solver.clone());
    let mut world = ClothWorld::with_solver(scene, Box::new(solver));
    let mut cloths = Vec::with_capacity(desc.cloths.len());
    for decl in &desc.cloths {
        let (data, data2) = resolve_cloth(decl, &names, &sheets, base_dir)?;
        let id = world.create(data, data2);
        if decl.disable_auto_build {
            world.disable_auto_build(id);
        }
        cloths.push((decl.name.clone(), id));
    }

    info!(
        transforms = names.len(),
        renderers = sheets.len(),
        cloths = cloths.len(),
        "scene instantiated"
    );
    Ok(LoadedScene {
        world,
        cloths,
        simulation: desc.simulation.clone(),
    })
}

fn resolve_cloth(
    decl: &ClothDecl,
    names: &HashMap<String, TransformId>,
    sheets: &HashMap<String, RenderHandle>,
    base_dir: Option<&Path>,
) -> WeftResult<(ClothSerializeData, ClothSerializeData2)> {
    let transform = |name: &str| {
        names.get(name).copied().ok_or_else(|| {
            WeftError::InvalidTransform(format!("Cloth '{}': '{name}' is not declared", decl.name))
        })
    };
    let bones = |roots: &[String]| roots.iter().map(|r| transform(r)).collect::<WeftResult<Vec<_>>>();

    let kind = match &decl.kind {
        ClothKindDecl::BoneCloth { root_bones } => ClothKind::BoneCloth {
            root_bones: bones(root_bones)?,
        },
        ClothKindDecl::BoneSpring { root_bones } => ClothKind::BoneSpring {
            root_bones: bones(root_bones)?,
        },
        ClothKindDecl::MeshCloth { renderers } => ClothKind::MeshCloth {
            renderers: renderers
                .iter()
                .map(|r| {
                    sheets.get(r).copied().ok_or_else(|| {
                        WeftError::UnknownHandle(format!("Cloth '{}': renderer '{r}'", decl.name))
                    })
                })
                .collect::<WeftResult<Vec<_>>>()?,
        },
    };

    let mut data = ClothSerializeData::new(kind, transform(&decl.cloth_transform)?);
    data.parameters = decl.parameters.clone();
    for c in &decl.colliders {
        let mut collider = ColliderDesc::new(transform(&c.anchor)?, c.shape);
        collider.center = c.center;
        collider.symmetry = c.symmetry;
        collider.symmetry_target = c.symmetry_target.as_deref().map(|t| transform(t)).transpose()?;
        data.colliders.push(collider);
    }

    let pre_build = match &decl.pre_build {
        Some(path) => {
            let path = match base_dir {
                Some(dir) if path.is_relative() => dir.join(path),
                _ => path.clone(),
            };
            let blob = std::fs::read(&path)?;
            debug!(cloth = %decl.name, path = %path.display(), bytes = blob.len(), "pre-build blob read");
            PreBuildData::new(blob)
        }
        None => PreBuildData::default(),
    };
    let data2 = ClothSerializeData2 {
        selection: decl.selection.clone(),
        pre_build,
    };
    Ok((data, data2))
}
