//! `warehouse` — end-to-end run of the rust_wh robot fleet simulator.
//!
//! Generates a grid warehouse, lets the fulfillment controller serve a
//! stream of generated orders for an hour of simulated time, and writes
//! `events.csv`, `timeseries.csv` and `summary.json` to the output
//! directory.
//!
//! Run with:
//!   cargo run -p warehouse --release [-- config.json]
//!
//! Every key of the JSON config is optional; `RUST_LOG` controls logging.

mod layout;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use wh_control::{ControllerConfig, FulfillmentController, stock_levels};
use wh_core::{SimConfig, SimRng};
use wh_output::{CsvEventWriter, EVENTS_FILE, OutputObserver, StatsTracker};
use wh_sim::StepperBuilder;

use layout::LayoutConfig;

// ── Configuration ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
struct DemoConfig {
    simulation:     SimConfig,
    controller:     ControllerConfig,
    layout:         LayoutConfig,
    output_dir:     PathBuf,
    /// Time steps between statistics snapshots.
    snapshot_every: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        let mut controller = ControllerConfig::default();
        // A 2 m hop from rest takes just over 2 s with default kinematics.
        controller.pathfinding.hop_duration = 2.2;
        Self {
            simulation:     SimConfig::default(),
            controller,
            layout:         LayoutConfig::default(),
            output_dir:     PathBuf::from("output/warehouse"),
            snapshot_every: 100,
        }
    }
}

fn load_config(path: &Path) -> Result<DemoConfig> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| format!("parsing {}", path.display()))
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => DemoConfig::default(),
    };
    config.simulation.validate()?;

    // 1. Layout.  Child streams keep layout and controller draws independent.
    let mut rng = SimRng::new(config.simulation.seed);
    let (graph, fleet) = layout::generate(&config.layout, &mut rng.child(1))?;
    let stock: u32 = stock_levels(&fleet).values().sum();
    info!(
        waypoints = graph.waypoint_count(),
        edges = graph.edge_count(),
        bots = fleet.bot_count(),
        pods = fleet.pod_count(),
        units = stock,
        "layout generated"
    );

    // 2. Planner, controller and sinks.
    let planner = config.controller.pathfinding.build()?;
    let controller = FulfillmentController::new(config.controller, &graph, rng.child(2))?;
    let stats = Arc::new(Mutex::new(StatsTracker::new(config.snapshot_every)));
    let events = CsvEventWriter::create(&config.output_dir)?;

    let mut stepper = StepperBuilder::new(config.simulation.clone(), graph, fleet, planner)
        .controller(controller)
        .subscribe(Arc::clone(&stats))
        .subscribe(OutputObserver::new(events))
        .build()?;

    // 3. Run.
    let t0 = Instant::now();
    let run = stepper.execute()?;
    let elapsed = t0.elapsed();

    // 4. Report.
    let stats = stats.lock().map_err(|_| anyhow!("statistics sink poisoned"))?;
    let summary = stats.summary();
    stats.write_time_series(&config.output_dir.join("timeseries.csv"))?;
    let out = BufWriter::new(File::create(config.output_dir.join("summary.json"))?);
    serde_json::to_writer_pretty(out, &summary)?;

    println!();
    println!("Simulated {} steps in {:.3} s wall time", run.steps, elapsed.as_secs_f64());
    println!("{summary}");
    println!();

    let control = &stepper.controller;
    let tasks: u64 = stepper.fleet.bots().iter().map(|b| control.tasks_completed(b.id)).sum();
    println!(
        "tasks completed {}  |  abandoned {}  |  orders pending {}",
        tasks,
        control.abandoned_tasks(),
        control.orders().pending().count(),
    );
    println!("{:<10} {:<8} {:<10} {:<10}", "Station", "Kind", "Done", "Units");
    println!("{}", "-".repeat(40));
    for s in &control.stations().output {
        println!("{:<10} {:<8} {:<10} {:<10}", s.id.0, "output", s.orders_completed, s.items_picked);
    }
    for s in &control.stations().input {
        println!("{:<10} {:<8} {:<10} {:<10}", s.id.0, "input", s.bundles_processed, s.items_received);
    }
    println!();
    println!("Output written to {}/{{{EVENTS_FILE}, timeseries.csv, summary.json}}", config.output_dir.display());

    Ok(())
}
