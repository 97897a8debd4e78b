//! Scene description validation.
//!
//! Catches naming and range errors before anything is instantiated,
//! with one diagnostic per problem.

use std::collections::HashSet;

use weft_types::{WeftError, WeftResult};

use crate::contract::{ClothKindDecl, SceneDescription, SimulationParams};

/// Validates a scene description.
///
/// Checks:
/// - Run settings are positive and reasonable
/// - Declared names are unique and parents are declared first
/// - Sheets have a usable resolution
/// - Every cloth references declared transforms and sheets
/// - Cloth parameters are in range
pub fn validate_description(desc: &SceneDescription) -> WeftResult<()> {
    validate_simulation(&desc.simulation)?;

    let mut names: HashSet<String> = HashSet::new();
    let mut declare = |name: String| -> WeftResult<()> {
        if names.insert(name.clone()) {
            Ok(())
        } else {
            Err(WeftError::InvalidConfig(format!("Transform '{name}' is declared twice")))
        }
    };

    // Parents must already exist, so check in instantiation order.
    let mut known: HashSet<String> = HashSet::new();
    for t in &desc.transforms {
        if let Some(parent) = &t.parent {
            if !known.contains(parent) {
                return Err(WeftError::InvalidConfig(format!(
                    "Transform '{}' has undeclared parent '{parent}'",
                    t.name
                )));
            }
        }
        declare(t.name.clone())?;
        known.insert(t.name.clone());
    }
    for chain in &desc.chains {
        if chain.count == 0 || chain.spacing <= 0.0 {
            return Err(WeftError::InvalidConfig(format!(
                "Chain '{}' needs count >= 1 and positive spacing",
                chain.prefix
            )));
        }
        if let Some(parent) = &chain.parent {
            if !known.contains(parent) {
                return Err(WeftError::InvalidConfig(format!(
                    "Chain '{}' has undeclared parent '{parent}'",
                    chain.prefix
                )));
            }
        }
        for name in chain.bone_names() {
            declare(name.clone())?;
            known.insert(name);
        }
    }
    let mut sheets: HashSet<&str> = HashSet::new();
    for sheet in &desc.sheets {
        if sheet.cols == 0 || sheet.rows == 0 || sheet.bones == 0 {
            return Err(WeftError::InvalidConfig(format!(
                "Sheet '{}' needs cols, rows and bones >= 1",
                sheet.name
            )));
        }
        if sheet.width <= 0.0 || sheet.height <= 0.0 {
            return Err(WeftError::InvalidConfig(format!(
                "Sheet '{}' must have a positive size",
                sheet.name
            )));
        }
        declare(sheet.name.clone())?;
        known.insert(sheet.name.clone());
        for name in sheet.bone_names() {
            declare(name.clone())?;
            known.insert(name);
        }
        sheets.insert(&sheet.name);
    }

    let transform = |what: &str, cloth: &str, name: &str| -> WeftResult<()> {
        if known.contains(name) {
            Ok(())
        } else {
            Err(WeftError::InvalidConfig(format!(
                "Cloth '{cloth}': {what} '{name}' is not declared"
            )))
        }
    };

    let mut cloth_names: HashSet<&str> = HashSet::new();
    for cloth in &desc.cloths {
        if !cloth_names.insert(&cloth.name) {
            return Err(WeftError::InvalidConfig(format!(
                "Cloth '{}' is declared twice",
                cloth.name
            )));
        }
        transform("cloth transform", &cloth.name, &cloth.cloth_transform)?;
        match &cloth.kind {
            ClothKindDecl::BoneCloth { root_bones } | ClothKindDecl::BoneSpring { root_bones } => {
                if root_bones.is_empty() {
                    return Err(WeftError::InvalidConfig(format!(
                        "Cloth '{}' has no root bones",
                        cloth.name
                    )));
                }
                for bone in root_bones {
                    transform("root bone", &cloth.name, bone)?;
                }
            }
            ClothKindDecl::MeshCloth { renderers } => {
                if renderers.is_empty() {
                    return Err(WeftError::InvalidConfig(format!(
                        "Cloth '{}' has no renderers",
                        cloth.name
                    )));
                }
                if let Some(missing) = renderers.iter().find(|r| !sheets.contains(r.as_str())) {
                    return Err(WeftError::InvalidConfig(format!(
                        "Cloth '{}': renderer '{missing}' is not a declared sheet",
                        cloth.name
                    )));
                }
            }
        }
        for collider in &cloth.colliders {
            transform("collider anchor", &cloth.name, &collider.anchor)?;
            if let Some(target) = &collider.symmetry_target {
                transform("symmetry target", &cloth.name, target)?;
            }
        }
        cloth
            .parameters
            .validate()
            .map_err(|e| WeftError::InvalidConfig(format!("Cloth '{}': {e}", cloth.name)))?;
    }

    Ok(())
}

fn validate_simulation(params: &SimulationParams) -> WeftResult<()> {
    if params.dt <= 0.0 {
        return Err(WeftError::InvalidConfig("Timestep dt must be positive".into()));
    }
    if params.dt > 1.0 {
        return Err(WeftError::InvalidConfig(
            "Timestep dt > 1.0 is unreasonably large".into(),
        ));
    }
    if params.duration <= 0.0 {
        return Err(WeftError::InvalidConfig("Duration must be positive".into()));
    }
    if params.solver.iterations == 0 {
        return Err(WeftError::InvalidConfig(
            "Solver iterations must be >= 1".into(),
        ));
    }
    if params.solver.collision_margin < 0.0 {
        return Err(WeftError::InvalidConfig(
            "Collision margin must be non-negative".into(),
        ));
    }
    Ok(())
}
