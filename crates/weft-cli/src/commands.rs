//! CLI command implementations.

use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use weft_cloth::{ClothNotification, PreBuildData, PreBuildPayload, VertexAttribute};
use weft_io::{instantiate, load_description, validate_description};
use weft_math::Vec3;
use weft_telemetry::{EventFilter, TracingSink};

#[derive(Serialize)]
struct ClothSummary {
    name: String,
    state: String,
    built: bool,
    center: Vec3,
}

#[derive(Serialize)]
struct RunSummary {
    ticks: u32,
    sim_time: f32,
    wall_time: f64,
    builds: u32,
    contacts: u64,
    cloths: Vec<ClothSummary>,
}

/// Run a scene: build every cloth, tick, and report.
pub fn simulate(
    scene_path: &str,
    ticks: Option<u32>,
    output_path: Option<&str>,
    events: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Weft Simulation");
    println!("───────────────");
    println!("Scene: {scene_path}");
    println!();

    let path = Path::new(scene_path);
    let desc = load_description(path)?;
    let mut loaded = instantiate(&desc, path.parent())?;
    let world = &mut loaded.world;
    let notifications = world.subscribe();
    if events {
        world
            .events_mut()
            .add_filtered_sink(Box::new(TracingSink::new(tracing::Level::INFO)), EventFilter::Lifecycle);
    }

    for (_, id) in &loaded.cloths {
        world.start(*id);
    }

    let dt = loaded.simulation.dt;
    let ticks = ticks.unwrap_or_else(|| loaded.simulation.tick_count());
    println!(
        "Running: {} cloths, {ticks} ticks at dt={dt:.4}s, solver '{}'",
        loaded.cloths.len(),
        world.solver_name()
    );

    let start = Instant::now();
    let mut builds = 0u32;
    let mut contacts = 0u64;
    for _ in 0..ticks {
        let report = world.tick(dt);
        builds += report.builds;
        contacts += u64::from(report.contacts);
    }
    let wall_time = start.elapsed().as_secs_f64();
    world.events_mut().finalize();

    for notification in notifications.try_iter() {
        if let ClothNotification::BuildComplete { cloth, success } = notification {
            let name = loaded
                .cloths
                .iter()
                .find(|(_, id)| *id == cloth)
                .map_or("?", |(n, _)| n.as_str());
            println!("  Build {name}: {}", if success { "ok" } else { "failed" });
        }
    }

    let mut cloths = Vec::with_capacity(loaded.cloths.len());
    for (name, id) in &loaded.cloths {
        let api = world.cloth(*id);
        let state = api.state().map_or_else(|| "Destroyed".to_string(), |s| format!("{s:?}"));
        let summary = ClothSummary {
            name: name.clone(),
            built: api.team_id().is_some(),
            state,
            center: api.center_position(),
        };
        println!(
            "  {:<16} {:<14} center ({:.3}, {:.3}, {:.3})",
            summary.name, summary.state, summary.center.x, summary.center.y, summary.center.z
        );
        cloths.push(summary);
    }

    let summary = RunSummary {
        ticks,
        sim_time: ticks as f32 * dt,
        wall_time,
        builds,
        contacts,
        cloths,
    };
    println!();
    println!("  Wall time:     {:.3}s", summary.wall_time);
    println!("  Sim time:      {:.3}s", summary.sim_time);
    println!("  Contacts:      {}", summary.contacts);

    if let Some(out) = output_path {
        std::fs::write(out, serde_json::to_string_pretty(&summary)?)?;
        println!("Summary written to: {out}");
    }

    Ok(())
}

/// Bake one cloth of a scene into a pre-built blob.
pub fn prebuild(
    scene_path: &str,
    cloth_name: &str,
    output_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Weft Pre-Build");
    println!("──────────────");

    let path = Path::new(scene_path);
    let desc = load_description(path)?;
    let loaded = instantiate(&desc, path.parent())?;
    let id = loaded.cloth_id(cloth_name).ok_or_else(|| {
        let available: Vec<&str> = loaded.cloths.iter().map(|(n, _)| n.as_str()).collect();
        format!(
            "Unknown cloth: '{cloth_name}'. Available: {}",
            available.join(", ")
        )
    })?;

    let data = loaded.world.create_pre_build(id)?;
    std::fs::write(output_path, &data.blob)?;
    println!("Cloth:   {cloth_name}");
    println!("Bytes:   {}", data.blob.len());
    println!("Written: {output_path}");
    Ok(())
}

/// Inspect a pre-built blob.
pub fn inspect(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("Weft Pre-Build Inspector");
    println!("────────────────────────");
    println!();

    let data = PreBuildData::new(std::fs::read(path)?);
    match data.version() {
        Some(v) => println!("Version:      {v}"),
        None => return Err("File too short for a pre-build header".into()),
    }
    if !data.use_pre_build() {
        println!("Status:       outdated, a runtime build would be used");
        return Ok(());
    }

    let payload = PreBuildPayload::decode(&data.blob)?;
    let fixed = payload.particles.iter().filter(|p| p.seed.fixed).count();
    let roots = payload
        .particles
        .iter()
        .filter(|p| p.seed.parent.is_none())
        .count();

    println!("Kind:         {:?}", payload.kind);
    println!("Particles:    {}", payload.particles.len());
    println!("Roots:        {roots}");
    println!("Fixed:        {fixed}");
    println!(
        "Selection:    {} fixed / {} move / {} ignore{}",
        payload.selection.count(VertexAttribute::Fixed),
        payload.selection.count(VertexAttribute::Move),
        payload.selection.count(VertexAttribute::Ignore),
        if payload.selection.user_edit { " (user edited)" } else { "" }
    );
    Ok(())
}

/// Validate a scene description.
pub fn validate(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("Weft Validator");
    println!("──────────────");
    println!();
    println!("Validating scene: {path}");

    let desc = load_description(Path::new(path))?;
    match validate_description(&desc) {
        Ok(()) => println!(
            "✅ Scene is valid ({} transforms, {} chains, {} sheets, {} cloths, {} ticks).",
            desc.transforms.len(),
            desc.chains.len(),
            desc.sheets.len(),
            desc.cloths.len(),
            desc.simulation.tick_count()
        ),
        Err(e) => {
            println!("❌ Scene validation failed: {e}");
            return Err(e.into());
        }
    }
    Ok(())
}
