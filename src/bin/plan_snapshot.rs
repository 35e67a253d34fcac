// Offline planning tool: runs one turn of the planner against a saved world snapshot
//
// Usage:
//   cargo run --bin plan_snapshot -- <snapshot.json> [options]
//
// Options:
//   --budget <ms>          Planning budget (default: derived from tickRemainMs)
//   --seed <n>             Fixed RNG seed for agent order and random exploration
//   --ban <x,y,z>          Ban a target before planning (repeatable)
//   --config <path>        Path to Snake.toml (default: Snake.toml)
//
// Set SNAKE_PROFILE=1 for a search timing report on stderr.

use std::env;
use std::fs;
use std::process;
use std::time::{Duration, Instant};

use voxel_snake_bot::config::Config;
use voxel_snake_bot::geometry::Vec3;
use voxel_snake_bot::obstacles::ObstacleIndex;
use voxel_snake_bot::orchestrator::{budget_from_millis, TurnPlanner};
use voxel_snake_bot::simple_profiler;
use voxel_snake_bot::types::WorldSnapshot;

fn print_usage() {
    eprintln!("Snapshot Planning Tool");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  plan_snapshot <snapshot.json> [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --budget <ms>           Planning budget in milliseconds");
    eprintln!("  --seed <n>              Fixed RNG seed");
    eprintln!("  --ban <x,y,z>           Ban a target before planning (repeatable)");
    eprintln!("  --config <path>         Path to Snake.toml (default: Snake.toml)");
    eprintln!("  --help                  Show this help message");
}

fn parse_cell(s: &str) -> Result<Vec3, String> {
    let parts: Vec<i32> = s
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<i32>()
                .map_err(|e| format!("Invalid coordinate '{}': {}", p, e))
        })
        .collect::<Result<_, _>>()?;

    match parts.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(format!("Expected 'x,y,z', got '{}'", s)),
    }
}

fn next_arg<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    match args.get(i + 1) {
        Some(value) => value.as_str(),
        None => {
            eprintln!("Error: {} requires an argument", flag);
            process::exit(1);
        }
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.contains(&"--help".to_string()) {
        print_usage();
        process::exit(if args.contains(&"--help".to_string()) {
            0
        } else {
            1
        });
    }

    let snapshot_file = &args[1];
    let mut config_path = "Snake.toml".to_string();
    let mut budget_ms: Option<i64> = None;
    let mut seed: Option<u64> = None;
    let mut bans: Vec<Vec3> = Vec::new();

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--budget" => {
                let value = next_arg(&args, i, "--budget");
                budget_ms = Some(value.parse().unwrap_or_else(|e| {
                    eprintln!("Error: invalid budget '{}': {}", value, e);
                    process::exit(1);
                }));
                i += 1;
            }
            "--seed" => {
                let value = next_arg(&args, i, "--seed");
                seed = Some(value.parse().unwrap_or_else(|e| {
                    eprintln!("Error: invalid seed '{}': {}", value, e);
                    process::exit(1);
                }));
                i += 1;
            }
            "--ban" => {
                let value = next_arg(&args, i, "--ban");
                bans.push(parse_cell(value).unwrap_or_else(|e| {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }));
                i += 1;
            }
            "--config" => {
                config_path = next_arg(&args, i, "--config").to_string();
                i += 1;
            }
            _ => {
                eprintln!("Error: Unknown option '{}'", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let mut config = Config::from_file(&config_path).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from '{}': {}", config_path, e);
        eprintln!("Using default configuration");
        Config::default_hardcoded()
    });
    if seed.is_some() {
        config.policy.rng_seed = seed;
    }

    let contents = fs::read_to_string(snapshot_file).unwrap_or_else(|e| {
        eprintln!("Error reading snapshot '{}': {}", snapshot_file, e);
        process::exit(1);
    });
    let snapshot: WorldSnapshot = serde_json::from_str(&contents).unwrap_or_else(|e| {
        eprintln!("Error parsing snapshot '{}': {}", snapshot_file, e);
        process::exit(1);
    });

    let mut planner = TurnPlanner::new(&config);
    for cell in bans {
        planner.ban_target(cell);
    }

    let budget: Result<Duration, _> = match budget_ms {
        Some(ms) => budget_from_millis(ms),
        None => planner.budget_for(&snapshot),
    };
    let budget = budget.unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    println!("Snapshot:  {} (turn {})", snapshot_file, snapshot.turn);
    println!("World:     {} {}", snapshot.name, snapshot.map_size.0);
    println!("Agents:    {} live", snapshot.live_snakes().count());
    println!(
        "Blocked:   {} cells",
        ObstacleIndex::from_snapshot(&snapshot).cell_count()
    );
    println!("Budget:    {}ms\n", budget.as_millis());

    simple_profiler::reset();
    let started = Instant::now();
    let report = planner.plan_turn(&snapshot, budget);
    let total_ms = started.elapsed().as_millis() as u64;
    simple_profiler::merge_thread_local();

    for decision in &report.decisions {
        println!(
            "{:<42} {:<12} dir {} -> target {} ({} cells)",
            decision.agent_id,
            decision.tier,
            decision.direction,
            decision.target,
            decision.path.len()
        );
    }
    for agent_id in &report.skipped {
        println!("{:<42} {:<12} no decision", agent_id, "hold");
    }

    println!("\nCommand payload:");
    println!("{}", report.command_payload());

    simple_profiler::print_report(total_ms);
}
