//! Scene probe
//!
//! Loads a scene snapshot from TOML or RON and runs one cast against it,
//! printing every reported hit. Useful for checking scene files and query
//! tuning without a running game.

use scene_query::foundation::logging;
use scene_query::prelude::*;
use std::env;
use std::error::Error;

const USAGE: &str = "Usage: scene_probe <scene.toml|scene.ron> <ox,oy,oz> <dx,dy,dz> <max_distance> \
                     [mode] [radius] [--config <config.toml|config.ron>] [--terrain]";

struct ProbeArgs {
    scene: String,
    config: Option<String>,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
    mode: CastMode,
    radius: f32,
    terrain: bool,
}

fn main() {
    logging::init_with_default("info");

    let args: Vec<String> = env::args().skip(1).collect();
    let probe = match parse_args(&args) {
        Ok(probe) => probe,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(&probe) {
        log::error!("Probe failed: {}", e);
        std::process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Result<ProbeArgs, Box<dyn Error>> {
    let mut positional = Vec::new();
    let mut config = None;
    let mut terrain = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().ok_or("--config needs a file path")?;
                config = Some(path.clone());
            }
            "--terrain" => terrain = true,
            _ => positional.push(arg.as_str()),
        }
    }

    if !(4..=6).contains(&positional.len()) {
        return Err(format!("expected 4 to 6 arguments, got {}", positional.len()).into());
    }

    Ok(ProbeArgs {
        scene: positional[0].to_string(),
        config,
        origin: parse_vec3(positional[1])?,
        direction: parse_vec3(positional[2])?,
        max_distance: positional[3].parse()?,
        mode: positional.get(4).map_or(Ok(CastMode::Closest), |m| m.parse())?,
        radius: positional.get(5).map_or(Ok(0.0), |r| r.parse())?,
        terrain,
    })
}

fn parse_vec3(text: &str) -> Result<Vec3, Box<dyn Error>> {
    let parts = text
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()?;
    match parts.as_slice() {
        &[x, y, z] => Ok(checked_vec3(x, y, z)?),
        _ => Err(format!("expected x,y,z but got '{text}'").into()),
    }
}

fn run(probe: &ProbeArgs) -> Result<(), Box<dyn Error>> {
    let config = match &probe.config {
        Some(path) => {
            log::info!("Loading config from {}", path);
            SpatialConfig::load_from_file(path)?
        }
        None => SpatialConfig::default(),
    };

    log::info!("Loading scene from {}", probe.scene);
    let snapshot = SceneSnapshot::load_from_file(&probe.scene)?;

    let world = SharedWorld::from_config(config)?;
    let stats = world.update(|w| w.apply_snapshot(&snapshot))?;
    log::info!(
        "Scene loaded: {} volumes, terrain {}",
        stats.inserted,
        if snapshot.terrain.is_some() { "present" } else { "absent" }
    );

    let mut flags = CastFlags::INCLUDE_ACTORS;
    if probe.terrain {
        flags |= CastFlags::INCLUDE_TERRAIN;
    }
    let query = CastQuery::sphere(probe.origin, probe.direction, probe.max_distance, probe.radius)
        .with_mode(probe.mode)
        .with_flags(flags);

    let guard = world.snapshot()?;
    let result = guard.cast(&query)?;
    log::info!("Cast {} from {:?}: hit = {}", probe.mode, probe.origin, result.is_hit());

    match &result {
        CastResult::Boolean(hit) => println!("{hit}"),
        _ => {
            for hit in result.hits() {
                let target = hit
                    .entity
                    .map_or_else(|| "terrain".to_string(), |entity| entity.to_string());
                println!(
                    "{target}\t{:.4}\t({:.4}, {:.4}, {:.4})",
                    hit.distance, hit.point.x, hit.point.y, hit.point.z
                );
            }
        }
    }

    Ok(())
}
