use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use rescue_swarm_core::geometry::Point;
use rescue_swarm_core::survivor::Survivor;
use rescue_swarm_core::zone::{Zone, ZoneKind};
use rescue_swarm_core::{SimConfig, World};

#[derive(Parser)]
#[command(name = "rescue-swarm")]
#[command(about = "Search-and-rescue swarm simulation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation on the built-in demo arena
    Run {
        /// Path to config file (JSON); defaults are used when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of timesteps to run
        #[arg(long, default_value_t = 2000)]
        steps: u64,

        /// Metrics sampling interval in timesteps
        #[arg(long, default_value_t = 50)]
        sample_every: u64,

        /// Number of survivors scattered over the arena
        #[arg(long, default_value_t = 3)]
        survivors: usize,

        /// Output directory for the run summary (optional)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Dump the default configuration to stdout
    DumpDefaultConfig,
}

/// Demo arena: a base block in the middle, safe strips around it, and a
/// danger/fire column along the right edge. The rectangles tile the arena
/// without gaps or overlaps.
fn demo_zones(config: &SimConfig) -> Vec<Zone> {
    let (w, h) = (config.arena_width, config.arena_height);
    let (bx0, bx1) = (w * 0.44, w * 0.56);
    let (by0, by1) = (h * 0.44, h * 0.56);
    let fire_top = h * 0.76;
    vec![
        Zone::rectangle(0, ZoneKind::Base, Point::new(bx0, by0), Point::new(bx1, by1)),
        Zone::rectangle(1, ZoneKind::Safe, Point::new(0.0, 0.0), Point::new(bx0, h)),
        Zone::rectangle(2, ZoneKind::Safe, Point::new(bx0, 0.0), Point::new(bx1, by0)),
        Zone::rectangle(3, ZoneKind::Safe, Point::new(bx0, by1), Point::new(bx1, h)),
        Zone::rectangle(4, ZoneKind::Danger, Point::new(bx1, 0.0), Point::new(w, fire_top)),
        Zone::rectangle(5, ZoneKind::Fire, Point::new(bx1, fire_top), Point::new(w, h)),
    ]
}

/// Deterministic survivor placement, alternating between the left safe strip
/// and the danger column so runs exercise both traversal weights.
fn scatter_survivors(count: usize, config: &SimConfig) -> Vec<Survivor> {
    let (w, h) = (config.arena_width, config.arena_height);
    (0..count)
        .map(|i| {
            let frac = (i as f64 + 1.0) / (count as f64 + 1.0);
            let location = if i % 2 == 0 {
                Point::new(w * 0.15, h * (0.1 + 0.8 * frac))
            } else {
                Point::new(w * 0.7, h * 0.6 * frac + h * 0.05)
            };
            let damage = ((0.2 + 0.6 * frac) * 100.0).round() / 100.0;
            Survivor::new(location, damage)
        })
        .collect()
}

fn load_config(path: Option<&PathBuf>) -> Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let file = File::open(path).context("failed to open config file")?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).context("failed to parse config")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::DumpDefaultConfig => {
            let config = SimConfig::default();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Run {
            config,
            steps,
            sample_every,
            survivors,
            out,
        } => {
            let sim_config = load_config(config.as_ref())?;
            sim_config.validate().context("config validation error")?;

            let zones = demo_zones(&sim_config);
            let rescue_targets = scatter_survivors(survivors, &sim_config);
            let mut world = World::new(zones, rescue_targets, sim_config)
                .context("failed to initialize world")?;

            tracing::info!(steps, survivors, "starting run");
            let summary = world
                .run(steps, sample_every)
                .context("simulation aborted on an invariant violation")?;

            println!(
                "Run complete: {} ticks, {} claims held, {} complete paths{}",
                world.current_timestep(),
                summary.final_claimed_count,
                summary.complete_path_count,
                if summary.stopped_early {
                    " (stopped early)"
                } else {
                    ""
                }
            );
            if let Some(last) = summary.samples.last() {
                println!(
                    "Final sample: {} settled, {} in path phase, {} messages delivered",
                    last.settled_count, last.create_paths_count, last.messages_delivered
                );
            }

            if let Some(out_dir) = out {
                std::fs::create_dir_all(&out_dir).context("failed to create output directory")?;
                let summary_path = out_dir.join("summary.json");
                let file = File::create(&summary_path).context("failed to create summary file")?;
                serde_json::to_writer_pretty(file, &summary).context("failed to write summary")?;
                println!("Results saved to {:?}", summary_path);
            }
        }
    }
    Ok(())
}
