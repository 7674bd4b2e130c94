//! # TestNetwork — headless integration test harness for Skylane
//!
//! Provides a fluent builder that wraps `bevy::app::App` + `SimulationPlugin`
//! for running integration tests without a window or renderer. Worlds are
//! hand-built: roads, warehouse, depots, cabs and parcels go in through the
//! builder methods, then `tick()` advances the simulation and the query and
//! assertion helpers inspect the resulting ECS state.

use bevy::app::App;
use bevy::prelude::*;

use crate::cab_traffic::{Cab, CabPaint, CabRoute, CabTrafficState, CargoHold, CAB_CAPACITY};
use crate::depots::{DepotId, PickupDepot, DEPOT_CAPACITY};
use crate::drones::{Drone, DroneId};
use crate::parcels::{Parcel, ParcelIds};
use crate::requests::{AssignmentQueue, RequestPlan, RequestState, ScriptedBatch};
use crate::road_network::{RoadNetwork, RoadNode};
use crate::sim_rng::SimRng;
use crate::stats::DeliveryStats;
use crate::warehouse::Warehouse;
use crate::world_init::{ResidenceRegistry, SkipWorldInit};
use crate::SimulationPlugin;
use crate::TickCounter;

/// A headless Bevy App wrapping `SimulationPlugin` for integration testing.
///
/// Use builder methods to lay out the network, then call `tick()` to advance
/// the simulation and query/assert on the resulting ECS state.
pub struct TestNetwork {
    app: App,
}

impl TestNetwork {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Create a new **empty** network: no roads, no warehouse, no depots, no
    /// cabs. The cab spawner and Poisson admission are switched off so only
    /// hand-placed actors act.
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);

        // Insert the marker BEFORE SimulationPlugin so init_world skips.
        app.insert_resource(SkipWorldInit);
        app.add_plugins(SimulationPlugin);

        // Keep the wall clock from ever triggering FixedUpdate on its own;
        // tick() runs the schedule directly.
        app.insert_resource(Time::<Fixed>::from_seconds(1.0e9));

        // Tests drive admissions explicitly through scripted batches.
        app.insert_resource(RequestPlan::Scripted {
            batches: Vec::new(),
        });

        // Run one update so Startup systems execute (init_world will no-op).
        app.update();

        let mut net = Self { app };
        net.world_mut().resource_mut::<CabTrafficState>().auto_spawn = false;
        net
    }

    /// Create the full generated world the headless binary runs: arterial
    /// grid, warehouse, depot ring, residences, cab spawner and Poisson
    /// admission all live. Deterministic for a given RNG seed.
    pub fn with_generated_world() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(SimulationPlugin);
        app.insert_resource(Time::<Fixed>::from_seconds(1.0e9));
        // Run one update so Startup systems execute (init_world runs fully).
        app.update();
        Self { app }
    }

    // -----------------------------------------------------------------------
    // World Setup (builder pattern — consumes and returns Self)
    // -----------------------------------------------------------------------

    /// Lay a straight east-west road of `len` cells along row `row`.
    pub fn with_road_row(mut self, row: usize, len: usize) -> Self {
        {
            let mut network = self.app.world_mut().resource_mut::<RoadNetwork>();
            for x in 0..len - 1 {
                network.add_edge(RoadNode(x, row), RoadNode(x + 1, row));
            }
        }
        self
    }

    /// Put the warehouse on the road node at `(x, row)`.
    pub fn with_warehouse(mut self, x: usize, row: usize) -> Self {
        let world = self.app.world_mut();
        let center = RoadNode(x, row).world_pos();
        let nearest_edge = {
            let network = world.resource::<RoadNetwork>();
            match network.nearest_edge(center) {
                Some(edge) => edge,
                None => panic!("with_warehouse needs a road first"),
            }
        };
        world.insert_resource(Warehouse {
            center,
            nearest_edge,
        });
        self
    }

    /// Place a depot (with its parked drone) on the road node at `(x, row)`,
    /// shelf capacity `DEPOT_CAPACITY`.
    pub fn with_depot(self, x: usize, row: usize) -> Self {
        self.with_depot_capacity(x, row, DEPOT_CAPACITY)
    }

    /// Place a depot with an explicit shelf capacity.
    pub fn with_depot_capacity(mut self, x: usize, row: usize, capacity: usize) -> Self {
        let world = self.app.world_mut();
        let center = RoadNode(x, row).world_pos();
        let nearest_edge = {
            let network = world.resource::<RoadNetwork>();
            match network.nearest_edge(center) {
                Some(edge) => edge,
                None => panic!("with_depot needs a road first"),
            }
        };
        let index = world.query::<&PickupDepot>().iter(world).count() as u32;
        let drone_entity = world.spawn_empty().id();
        let depot_entity = world
            .spawn(PickupDepot::new(
                DepotId(index),
                center,
                capacity,
                nearest_edge,
                drone_entity,
            ))
            .id();
        world
            .entity_mut(drone_entity)
            .insert(Drone::new(DroneId(index), depot_entity, center));
        self
    }

    /// Spawn a cab driving the road along `row` from `x0` to `x1`, its hold
    /// empty. Endpoints must already be connected (use `with_road_row` first).
    pub fn with_cab(mut self, x0: usize, x1: usize, row: usize) -> Self {
        let world = self.app.world_mut();
        let route = {
            let network = world.resource::<RoadNetwork>();
            let Some(path) = network.path(RoadNode(x0, row), RoadNode(x1, row)) else {
                panic!("with_cab endpoints are not connected");
            };
            CabRoute::new(path, network)
        };
        let id = {
            let mut state = world.resource_mut::<CabTrafficState>();
            state.spawned += 1;
            state.allocate_id()
        };
        world.spawn((
            Cab { id },
            route,
            CargoHold::new(CAB_CAPACITY),
            CabPaint::Free,
        ));
        self
    }

    /// Spawn a parcel destined for `destination`, already waiting in the
    /// assignment queue and counted as requested.
    pub fn with_parcel(mut self, destination: Vec2) -> Self {
        let world = self.app.world_mut();
        let id = world.resource_mut::<ParcelIds>().allocate();
        let entity = world.spawn(Parcel::new(id, destination)).id();
        world.resource_mut::<AssignmentQueue>().0.push_back(entity);
        world.resource_mut::<RequestState>().requested += 1;
        self
    }

    /// Register a residence centered on `at` for request admission to draw
    /// destinations from.
    pub fn with_residence(mut self, at: Vec2) -> Self {
        let half = 2.0;
        let corners = [
            at + Vec2::new(-half, -half),
            at + Vec2::new(half, -half),
            at + Vec2::new(half, half),
            at + Vec2::new(-half, half),
        ];
        self.app
            .world_mut()
            .resource_mut::<ResidenceRegistry>()
            .add(corners);
        self
    }

    /// Replace the request plan with scripted admission batches.
    pub fn with_scripted_requests(mut self, batches: Vec<ScriptedBatch>) -> Self {
        self.app
            .world_mut()
            .insert_resource(RequestPlan::Scripted { batches });
        self
    }

    /// Switch to Poisson admission with the given mean gap and budget.
    pub fn with_poisson_requests(mut self, mean: f64, max_requests: u32) -> Self {
        self.app.world_mut().insert_resource(RequestPlan::Poisson {
            mean,
            max_requests,
        });
        self
    }

    /// Reseed the simulation RNG.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.app
            .world_mut()
            .insert_resource(SimRng::from_seed_u64(seed));
        self
    }

    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Run N simulation ticks by executing the `FixedUpdate` schedule
    /// directly. The first tick after construction is tick 1.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.world_mut().run_schedule(FixedUpdate);
        }
    }

    // -----------------------------------------------------------------------
    // Queries (note: Bevy's World::query() requires &mut World)
    // -----------------------------------------------------------------------

    /// Access the ECS world mutably (needed for queries in Bevy).
    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    /// Get a reference to any resource.
    pub fn resource<T: Resource>(&self) -> &T {
        self.app.world().resource::<T>()
    }

    /// Current tick count.
    pub fn tick_count(&self) -> u64 {
        self.resource::<TickCounter>().0
    }

    /// Get the delivery statistics.
    pub fn stats(&self) -> &DeliveryStats {
        self.resource::<DeliveryStats>()
    }

    /// Number of parcels waiting in the assignment queue.
    pub fn queued_parcels(&self) -> usize {
        self.resource::<AssignmentQueue>().0.len()
    }

    /// The n-th queued parcel's entity, front of the queue first.
    pub fn queued_parcel(&self, index: usize) -> Entity {
        match self.resource::<AssignmentQueue>().0.get(index) {
            Some(&entity) => entity,
            None => panic!("no queued parcel at index {index}"),
        }
    }

    /// Get a parcel by entity.
    pub fn parcel(&self, entity: Entity) -> &Parcel {
        match self.app.world().get::<Parcel>(entity) {
            Some(parcel) => parcel,
            None => panic!("{entity:?} is not a parcel"),
        }
    }

    /// Entity of the depot placed n-th by the builder.
    pub fn depot_entity(&mut self, index: u32) -> Entity {
        let world = self.app.world_mut();
        let found = world
            .query::<(Entity, &PickupDepot)>()
            .iter(world)
            .find(|(_, depot)| depot.id == DepotId(index));
        match found {
            Some((entity, _)) => entity,
            None => panic!("no depot with index {index}"),
        }
    }

    /// The depot placed n-th by the builder.
    pub fn depot(&mut self, index: u32) -> &PickupDepot {
        let entity = self.depot_entity(index);
        match self.app.world().get::<PickupDepot>(entity) {
            Some(depot) => depot,
            None => unreachable!(),
        }
    }

    /// The drone homed at the depot placed n-th by the builder.
    pub fn drone_of(&mut self, index: u32) -> &Drone {
        let depot_entity = self.depot_entity(index);
        let drone_entity = match self.app.world().get::<PickupDepot>(depot_entity) {
            Some(depot) => depot.drone,
            None => unreachable!(),
        };
        match self.app.world().get::<Drone>(drone_entity) {
            Some(drone) => drone,
            None => panic!("depot {index} has no drone"),
        }
    }

    /// Entity of the cab spawned n-th by the builder.
    pub fn cab_entity(&mut self, index: u32) -> Entity {
        let world = self.app.world_mut();
        let found = world
            .query::<(Entity, &Cab)>()
            .iter(world)
            .find(|(_, cab)| cab.id.0 == index);
        match found {
            Some((entity, _)) => entity,
            None => panic!("no cab with id {index}"),
        }
    }

    /// Count all cab entities.
    pub fn cab_count(&mut self) -> usize {
        let world = self.app.world_mut();
        world
            .query_filtered::<Entity, With<Cab>>()
            .iter(world)
            .count()
    }

    /// Count all parcel entities.
    pub fn parcel_count(&mut self) -> usize {
        let world = self.app.world_mut();
        world
            .query_filtered::<Entity, With<Parcel>>()
            .iter(world)
            .count()
    }

    /// Count parcels whose delivery has completed.
    pub fn delivered_count(&mut self) -> usize {
        let world = self.app.world_mut();
        world
            .query::<&Parcel>()
            .iter(world)
            .filter(|parcel| parcel.is_delivered())
            .count()
    }

    // -----------------------------------------------------------------------
    // Assertions
    // -----------------------------------------------------------------------

    /// Assert every undelivered parcel sits in exactly one custody set (the
    /// assignment queue, a cab hold, a depot shelf, or a drone's cargo) and
    /// every delivered parcel sits in none.
    pub fn assert_custody_exclusive(&mut self) {
        use std::collections::HashMap;

        let world = self.app.world_mut();
        let mut held: HashMap<Entity, u32> = HashMap::new();
        let queued: Vec<Entity> = world
            .resource::<AssignmentQueue>()
            .0
            .iter()
            .copied()
            .collect();
        for entity in queued {
            *held.entry(entity).or_default() += 1;
        }
        let in_holds: Vec<Entity> = world
            .query::<&CargoHold>()
            .iter(world)
            .flat_map(|hold| hold.parcels().to_vec())
            .collect();
        for entity in in_holds {
            *held.entry(entity).or_default() += 1;
        }
        let on_shelves: Vec<Entity> = world
            .query::<&PickupDepot>()
            .iter(world)
            .flat_map(|depot| depot.received().to_vec())
            .collect();
        for entity in on_shelves {
            *held.entry(entity).or_default() += 1;
        }
        let in_cargo: Vec<Entity> = world
            .query::<&Drone>()
            .iter(world)
            .flat_map(|drone| drone.cargo().to_vec())
            .collect();
        for entity in in_cargo {
            *held.entry(entity).or_default() += 1;
        }

        let parcels: Vec<(Entity, bool)> = world
            .query::<(Entity, &Parcel)>()
            .iter(world)
            .map(|(entity, parcel)| (entity, parcel.is_delivered()))
            .collect();
        for (entity, delivered) in parcels {
            let count = held.get(&entity).copied().unwrap_or(0);
            if delivered {
                assert_eq!(
                    count, 0,
                    "Expected delivered parcel {entity:?} in no custody set, found it in {count}"
                );
            } else {
                assert_eq!(
                    count, 1,
                    "Expected live parcel {entity:?} in exactly one custody set, found it in {count}"
                );
            }
        }
    }

    /// Assert no cab hold, depot shelf or drone cargo exceeds its capacity,
    /// and no depot carries more reservations-plus-shelf than it has slots.
    pub fn assert_capacities_respected(&mut self) {
        let world = self.app.world_mut();
        let holds: Vec<(usize, usize)> = world
            .query::<&CargoHold>()
            .iter(world)
            .map(|hold| (hold.len(), hold.capacity()))
            .collect();
        for (len, capacity) in holds {
            assert!(len <= capacity, "Cab hold over capacity: {len}/{capacity}");
        }
        let depots: Vec<(usize, usize, usize)> = world
            .query::<&PickupDepot>()
            .iter(world)
            .map(|depot| (depot.received().len(), depot.pending_load(), depot.capacity))
            .collect();
        for (shelf, pending, capacity) in depots {
            assert!(
                shelf <= capacity,
                "Depot shelf over capacity: {shelf}/{capacity}"
            );
            assert!(
                pending <= capacity,
                "Depot reservations over capacity: {pending}/{capacity}"
            );
        }
        let cargos: Vec<(usize, usize)> = world
            .query::<&Drone>()
            .iter(world)
            .map(|drone| (drone.cargo().len(), drone.capacity))
            .collect();
        for (len, capacity) in cargos {
            assert!(
                len <= capacity,
                "Drone cargo over capacity: {len}/{capacity}"
            );
        }
    }
}
