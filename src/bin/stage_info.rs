//! Stage inspector: loads a map document through the pager and prints a summary.
//!
//! Usage: cargo run --bin stage_info -- --map <PATH> [OPTIONS]
//!
//! Options:
//!   --map <PATH>       Map document, relative to --root (required)
//!   --root <DIR>       Directory maps are read from (default: ".")
//!   --config <FILE>    Editor config JSON (default: built-in defaults)
//!   --origin <X,Y,Z>   World offset of the stage (default: 0,0,0)

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use glam::IVec3;

use tilestage::config::{EditorConfig, EditorState};
use tilestage::stage::{ClassRegistry, DiskSource, StageKey, StagePager};

fn main() -> ExitCode {
    tilestage::core::logging::init();

    let args: Vec<String> = std::env::args().collect();
    let Some(map) = parse_str_arg(&args, "--map") else {
        eprintln!("usage: stage_info --map <PATH> [--root <DIR>] [--config <FILE>] [--origin X,Y,Z]");
        return ExitCode::FAILURE;
    };
    let root = PathBuf::from(parse_str_arg(&args, "--root").unwrap_or_else(|| ".".to_string()));
    let origin = parse_ivec3_arg(&args, "--origin").unwrap_or(IVec3::ZERO);

    let config = match parse_str_arg(&args, "--config") {
        Some(path) => match EditorConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Invalid config {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => EditorConfig::default(),
    };

    let classes = ClassRegistry::builtin();
    if let Err(e) = classes.validate() {
        eprintln!("Class table is inconsistent: {}", e);
        return ExitCode::FAILURE;
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("=== Tilestage Stage Info ===");
    println!("Root:   {}", root.display());
    println!("Map:    {}", map);
    println!("Origin: {},{},{}", origin.x, origin.y, origin.z);
    println!("Chunk size: {}", config.chunk_size);
    println!();

    let pager = StagePager::new(
        DiskSource::new(&root),
        Arc::new(classes),
        config,
        EditorState::default(),
    );

    if let Err(e) = runtime.block_on(pager.load_from_url(&map, origin)) {
        eprintln!("Load failed: {}", e);
        return ExitCode::FAILURE;
    }

    let key = StageKey::new(map.as_str(), origin);
    let printed = pager.with_stage(&key, |stage| {
        let grid = stage.grid();
        let mut coords: Vec<_> = grid.chunk_coords().copied().collect();
        coords.sort();

        println!("Chunks:  {}", grid.chunk_count());
        for coord in &coords {
            let raised = grid
                .chunk(*coord)
                .map(|c| c.iter().filter(|(_, _, t)| t.height != 0).count())
                .unwrap_or(0);
            println!("  {:>8}  {} raised tiles", coord.key(), raised);
        }

        println!("Objects: {}", stage.objects().len());
        for id in stage.objects().ids() {
            if let Some(state) = stage.objects().get(&id) {
                println!(
                    "  {:<16} class {:>3} at ({:.1}, {:.1}, {:.1})",
                    id, state.class_id, state.position.x, state.position.y, state.position.z
                );
            }
        }
    });

    pager.dispose();
    match printed {
        Some(()) => ExitCode::SUCCESS,
        None => ExitCode::FAILURE,
    }
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_ivec3_arg(args: &[String], flag: &str) -> Option<IVec3> {
    let raw = parse_str_arg(args, flag)?;
    let parts: Vec<i32> = raw.split(',').map(|p| p.trim().parse().ok()).collect::<Option<_>>()?;
    match parts[..] {
        [x, y, z] => Some(IVec3::new(x, y, z)),
        _ => None,
    }
}
