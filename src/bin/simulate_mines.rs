//! Mine reset simulator - runs the countdown against in-memory worlds.
//!
//! Usage: cargo run --bin simulate_mines -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>   Scheduler config JSON (default: minereset.json)
//!   --ticks <N>       Countdown ticks to simulate (default: 10)
//!   --world <NAME>    World to create, repeatable (default: "world")
//!
//! Each tick stands for one minute of the countdown. When the store holds no
//! mines a demo mine is defined in the first world.

use std::sync::Arc;
use std::time::{Duration, Instant};

use minereset::block::BlockSpec;
use minereset::core::logging;
use minereset::core::types::{IVec3, Result};
use minereset::mine::{MineRegistry, MineState, MineStore};
use minereset::reset::{LogEventSink, RegionFiller, ResetController};
use minereset::schedule::{MineScheduler, SchedulerConfig, TickOutcome};
use minereset::world::{MemoryOccupants, MemoryWorld, MemoryWorlds, WorldId};

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_all_str_args(args: &[String], flag: &str) -> Vec<String> {
    args.windows(2)
        .filter(|pair| pair[0] == flag)
        .map(|pair| pair[1].clone())
        .collect()
}

fn demo_mine(world: &str) -> Result<MineState> {
    let mut mine = MineState::new("demo", WorldId::from(world), IVec3::new(0, 0, 0), IVec3::new(15, 7, 15));
    let composition = mine.composition_mut();
    composition.set("1:0".parse()?, 0.6)?;
    composition.set("16:0".parse()?, 0.25)?;
    composition.set("15:0".parse()?, 0.1)?;
    mine.set_surface(Some(BlockSpec::of(2)));
    mine.set_reset_delay(5);
    mine.set_reset_warnings(vec![3, 1]);
    Ok(mine)
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let config_path = parse_str_arg(&args, "--config").unwrap_or_else(|| "minereset.json".to_string());
    let ticks = parse_str_arg(&args, "--ticks")
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(10);
    let mut world_names = parse_all_str_args(&args, "--world");
    if world_names.is_empty() {
        world_names.push("world".to_string());
    }

    let config = SchedulerConfig::load(&config_path)?;

    println!("=== Mine Reset Simulator ===");
    println!("Config: {}", config_path);
    println!("Store:  {}", config.store_path.display());
    println!("Worlds: {}", world_names.join(", "));
    println!("Ticks:  {}", ticks);
    println!();

    let mut worlds = MemoryWorlds::new();
    for name in &world_names {
        worlds.insert(name.as_str(), MemoryWorld::new());
    }
    let worlds = Arc::new(worlds);

    let store = MineStore::new(&config.store_path);
    let mut registry = MineRegistry::new();
    let report = store.load(&mut registry, worlds.as_ref()).await?;
    for (name, e) in &report.failed {
        log::warn!("Skipped mine '{}': {}", name, e);
    }
    if registry.is_empty() {
        log::info!("No stored mines, defining a demo mine in '{}'", world_names[0]);
        registry.define(demo_mine(&world_names[0])?)?;
    }

    let controller = ResetController::new(
        worlds.clone(),
        Arc::new(MemoryOccupants::new()),
        Arc::new(LogEventSink),
        RegionFiller::with_current_runtime(),
    )
    .with_fill_seed(config.fill_seed);
    let scheduler = MineScheduler::new(Arc::new(controller));

    let start = Instant::now();
    let mut resets = 0usize;
    for tick in 1..=ticks {
        for (name, outcome) in scheduler.tick_all(&mut registry) {
            match outcome {
                TickOutcome::Reset => {
                    resets += 1;
                    println!("[tick {:>3}] {} reset", tick, name);
                }
                TickOutcome::Warning(minutes) => println!("[tick {:>3}] {} warning {:?}", tick, name, minutes),
                TickOutcome::Idle => {}
            }
        }

        // Let fills finish before the next simulated minute
        while registry.iter().any(|mine| scheduler.controller().is_resetting(mine.name())) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    println!();
    println!("{} reset(s) in {:.2?}", resets, start.elapsed());
    for mine in registry.iter() {
        let Some(world) = worlds.get(mine.world()) else {
            continue;
        };
        let bounds = mine.bounds();
        println!("{} ({}): next reset in {} min, {} cells", mine.name(), mine.world(), mine.time_until_reset(), bounds.volume());
        for (block, _) in mine.composition().iter() {
            println!("  {:>8}: {}", block.to_string(), world.count_in(bounds, block));
        }
        if let Some(surface) = mine.surface() {
            println!("  {:>8}: {} (surface)", surface.to_string(), world.count_in(bounds, surface));
        }
    }

    if config.autosave {
        store.save(&registry).await?;
        println!("Saved {} mine(s) to {}", registry.len(), store.path().display());
    }

    Ok(())
}
