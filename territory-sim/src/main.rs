use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use territory_core::{step, ConsoleObserver, EngineConfig, ObserverRegistry, TickMetrics};

mod loader;
mod tui;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a JSON map description. Falls back to a synthetic map when absent.
    #[arg(long)]
    map: Option<PathBuf>,

    /// Number of nations to seed when using the synthetic map.
    #[arg(long, default_value_t = 4)]
    nations: u32,

    /// Map width/height for the synthetic map.
    #[arg(long, default_value_t = 48)]
    map_size: u32,

    /// Number of ticks to run in headless mode.
    #[arg(short, long, default_value_t = 100)]
    ticks: u64,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print per-stage timing summary at the end.
    #[arg(long)]
    benchmark: bool,

    /// Enable the interactive TUI instead of running headless.
    #[arg(long)]
    tui: bool,

    /// Nation capacity for a loaded map (ignored for the synthetic map).
    #[arg(long, default_value_t = 16)]
    nation_capacity: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = std::str::FromStr::from_str(&args.log_level).unwrap_or(log::LevelFilter::Info);
    if args.tui {
        let target = Box::new(std::fs::File::create("territory-sim.log")?);
        env_logger::Builder::new()
            .filter_level(level)
            .format_timestamp(None)
            .target(env_logger::Target::Pipe(target))
            .init();
    } else {
        env_logger::Builder::new().filter_level(level).format_timestamp(None).init();
    }

    let config = EngineConfig::default();

    let (mut matrix, founding_commands) = if let Some(path) = &args.map {
        let map = loader::load_map(path)?;
        let matrix = territory_core::build_matrix(&map, args.nation_capacity, &config.matrix).map_err(anyhow::Error::msg)?;
        (matrix, Vec::new())
    } else {
        log::info!("no --map given, using a synthetic {}x{} map with {} nations", args.map_size, args.map_size, args.nations);
        loader::mock_scenario(args.map_size, args.map_size, args.nations)?
    };

    let mut observers = ObserverRegistry::new();
    observers.register(Box::new(ConsoleObserver::new(10)));

    let mut metrics = args.benchmark.then(TickMetrics::default);

    if args.tui {
        tui::run(&mut matrix, founding_commands, &config, &mut observers)?;
    } else {
        let mut pending = founding_commands;
        for tick in 0..args.ticks {
            let report = step(&mut matrix, tick, std::mem::take(&mut pending), &config, metrics.as_mut());
            observers.notify(&report);
        }
        if let Some(metrics) = &metrics {
            log::info!("ran {} ticks, avg {:.3}ms/tick", metrics.total_ticks, metrics.tick_avg_ms());
        }
    }

    Ok(())
}
