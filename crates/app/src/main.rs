//! Skylane headless driver.
//!
//! Builds the generated world, runs the delivery pipeline to completion (or
//! to the tick cap) and prints a JSON run summary on stdout. Progress lines
//! go to stderr so stdout stays machine-readable.
//!
//! Usage:
//!   cargo run -p skylane --release
//!   cargo run -p skylane --release -- --parcels 200 --seed 7
//!   cargo run -p skylane --release -- --ticks 50000 --quiet

use bevy::prelude::*;
use serde::Serialize;

use simulation::parcels::Parcel;
use simulation::requests::{RequestPlan, MAX_REQUESTS, MEAN_REQUEST_INTERVAL_TICKS};
use simulation::road_network::RoadNetwork;
use simulation::sim_rng::{SimRng, DEFAULT_SEED};
use simulation::stats::{cab_only_route_distance, DeliveryStats};
use simulation::warehouse::Warehouse;
use simulation::{SimulationPlugin, TickCounter};

/// Hard cap on simulated ticks; the run stops with partial results if the
/// pipeline has not drained by then.
const DEFAULT_TICK_CAP: u64 = 200_000;

/// Stderr progress cadence, in ticks.
const PROGRESS_INTERVAL: u64 = 2_000;

struct RunArgs {
    ticks: u64,
    parcels: u32,
    seed: Option<u64>,
    quiet: bool,
}

fn parse_args() -> RunArgs {
    let mut args = RunArgs {
        ticks: DEFAULT_TICK_CAP,
        parcels: MAX_REQUESTS,
        seed: None,
        quiet: false,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--ticks" => args.ticks = parse_value(&flag, iter.next()),
            "--parcels" => args.parcels = parse_value(&flag, iter.next()),
            "--seed" => args.seed = Some(parse_value(&flag, iter.next())),
            "--quiet" => args.quiet = true,
            other => {
                eprintln!("unknown argument: {other}");
                eprintln!("usage: skylane [--ticks N] [--parcels N] [--seed N] [--quiet]");
                std::process::exit(2);
            }
        }
    }
    args
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> T {
    let Some(value) = value else {
        eprintln!("{flag} needs a value");
        std::process::exit(2);
    };
    match value.parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            eprintln!("{flag}: cannot parse {value:?}");
            std::process::exit(2);
        }
    }
}

/// End-of-run report printed as JSON on stdout.
#[derive(Serialize)]
struct RunSummary {
    ticks: u64,
    seed: u64,
    stats: DeliveryStats,
    /// Road distance driven plus air distance flown, over the whole run.
    combined_distance: f32,
    /// Greedy single-cab tour over the same destinations, for comparison.
    /// `null` when some destination has no road route.
    cab_only_baseline: Option<f32>,
}

fn main() {
    let args = parse_args();

    // Minimal headless app: no window, no renderer, no log subscriber. The
    // loop below steps the simulation schedule directly.
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(SimulationPlugin);

    // Keep the wall clock from ever triggering FixedUpdate on its own.
    app.insert_resource(Time::<Fixed>::from_seconds(1.0e9));

    app.insert_resource(RequestPlan::Poisson {
        mean: MEAN_REQUEST_INTERVAL_TICKS,
        max_requests: args.parcels,
    });
    if let Some(seed) = args.seed {
        app.insert_resource(SimRng::from_seed_u64(seed));
    }

    // Startup systems generate the world.
    app.update();

    loop {
        app.world_mut().run_schedule(FixedUpdate);

        let world = app.world();
        let stats = world.resource::<DeliveryStats>();
        let tick = world.resource::<TickCounter>().0;

        if !args.quiet && tick.is_multiple_of(PROGRESS_INTERVAL) {
            eprintln!(
                "tick {tick}: {}/{} delivered ({} assigned, {} queued)",
                stats.delivered, args.parcels, stats.assigned, stats.awaiting_assignment
            );
        }

        let drained = stats.requested >= args.parcels && stats.delivered == stats.requested;
        if drained || tick >= args.ticks {
            break;
        }
    }

    let world = app.world_mut();
    let destinations: Vec<Vec2> = world
        .query::<&Parcel>()
        .iter(world)
        .map(|parcel| parcel.destination)
        .collect();
    let stats = world.resource::<DeliveryStats>().clone();
    let ticks = world.resource::<TickCounter>().0;
    let warehouse_center = world.resource::<Warehouse>().center;

    if !args.quiet {
        eprintln!(
            "run complete at tick {ticks}: {}/{} parcels delivered",
            stats.delivered, stats.requested
        );
        eprintln!(
            "computing cab-only baseline over {} destinations",
            destinations.len()
        );
    }
    let cab_only_baseline = {
        let network = world.resource::<RoadNetwork>();
        cab_only_route_distance(network, warehouse_center, &destinations)
    };

    let summary = RunSummary {
        ticks,
        seed: args.seed.unwrap_or(DEFAULT_SEED),
        combined_distance: stats.cab_distance_total + stats.drone_distance_total,
        stats,
        cab_only_baseline,
    };
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("run summary serialization failed: {err}");
            std::process::exit(1);
        }
    }
}
