// CLI entry point for the level generator.
//
// Generates levels from a seed and prints a one-line summary per level.
// With `--json` the full in-memory `Level` is printed as JSON after each
// summary; it is an inspection dump, not a level file format. Set
// `RUST_LOG=debug` to see the search decisions of each stage.
//
// Usage:
//   generate [OPTIONS]
//     --seed <N>         Seed of the first level (default: 0)
//     --levels <N>       Number of levels, seeds N, N+1, ... (default: 1)
//     --config <PATH>    JSON config; omitted fields are an error
//     --json             Also print each level as JSON

use slingworks_gen::config::{GenConfig, ResolvedConfig};
use slingworks_gen::level::generate_level;
use slingworks_gen::prng::LevelRng;

struct Args {
    seed: u64,
    levels: u64,
    config: Option<String>,
    json: bool,
}

fn main() {
    env_logger::init();
    let args = parse_args();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Bad config: {e}");
            std::process::exit(1);
        }
    };

    for n in 0..args.levels {
        let seed = args.seed + n;
        let mut rng = LevelRng::new(seed);
        let level = generate_level(&config, &mut rng);
        let scene = &level.scene;
        println!(
            "level {n:02} (seed {seed}): {} structures, {} blocks, {} platforms, {} pigs, {} TNT, {} decorations, birds {:?}",
            scene.structures.len(),
            scene.block_count(),
            scene.platforms.len(),
            scene.pigs.len(),
            scene.tnt.len(),
            scene.decorations.len(),
            level.birds,
        );
        if args.json {
            match serde_json::to_string_pretty(&level) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Failed to serialize level {n}: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}

fn load_config(path: Option<&str>) -> Result<ResolvedConfig, String> {
    let raw = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?;
            GenConfig::from_json(&text).map_err(|e| format!("{path}: {e}"))?
        }
        None => GenConfig::default(),
    };
    raw.resolve().map_err(|e| e.to_string())
}

/// Parse command-line arguments with plain `std::env::args()` matching.
fn parse_args() -> Args {
    let mut parsed = Args {
        seed: 0,
        levels: 1,
        config: None,
        json: false,
    };
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--seed" => {
                i += 1;
                parsed.seed = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--seed requires a number");
                    std::process::exit(1);
                });
            }
            "--levels" => {
                i += 1;
                parsed.levels = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--levels requires a number");
                    std::process::exit(1);
                });
            }
            "--config" => {
                i += 1;
                parsed.config = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--config requires a path");
                    std::process::exit(1);
                }));
            }
            "--json" => parsed.json = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    parsed
}

fn print_usage() {
    println!("Usage: generate [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --seed <N>         Seed of the first level (default: 0)");
    println!("  --levels <N>       Number of levels (default: 1)");
    println!("  --config <PATH>    JSON config file");
    println!("  --json             Also print each level as JSON");
    println!("  --help, -h         Show this help");
}
