use bevy::prelude::*;

pub mod assignment;
pub mod cab_traffic;
pub mod config;
pub mod depots;
pub mod dispatch;
pub mod drones;
pub mod geometry;
pub mod parcels;
pub mod requests;
pub mod road_network;
pub mod sim_rng;
pub mod simulation_sets;
pub mod stats;
pub mod tsp;
pub mod warehouse;
pub mod world_init;

#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

pub use simulation_sets::SimulationSet;

// ---------------------------------------------------------------------------
// Core resources
// ---------------------------------------------------------------------------

/// Global tick counter, incremented at the top of each `FixedUpdate` pass.
/// The first simulated tick is tick 1.
#[derive(Resource, Default)]
pub struct TickCounter(pub u64);

/// Advance the tick counter. Runs first in `PreSim`; everything else this
/// tick sees the new value.
pub fn advance_tick(mut tick: ResMut<TickCounter>) {
    tick.0 = tick.0.wrapping_add(1);
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Phase contract for every system below.
        app.configure_sets(
            FixedUpdate,
            (
                SimulationSet::PreSim,
                SimulationSet::Simulation,
                SimulationSet::PostSim,
            )
                .chain(),
        );

        // Core resources and systems that don't belong to any feature.
        // The world resources start empty (warehouse at a placeholder);
        // `init_world` or a test harness replaces them.
        app.init_resource::<TickCounter>()
            .init_resource::<road_network::RoadNetwork>()
            .init_resource::<warehouse::Warehouse>()
            .init_resource::<world_init::ResidenceRegistry>()
            .add_systems(Startup, world_init::init_world)
            .add_systems(FixedUpdate, advance_tick.in_set(SimulationSet::PreSim));

        // Road world: deterministic RNG and cab traffic.
        app.add_plugins((sim_rng::SimRngPlugin, cab_traffic::CabTrafficPlugin));

        // Delivery pipeline: parcels, depot arrivals, dispatch, drone flight.
        app.add_plugins((
            parcels::ParcelsPlugin,
            depots::DepotsPlugin,
            dispatch::DispatchPlugin,
            drones::DronesPlugin,
        ));

        // Admission, assignment and reporting.
        app.add_plugins((
            requests::RequestsPlugin,
            assignment::AssignmentPlugin,
            stats::StatsPlugin,
        ));
    }
}
