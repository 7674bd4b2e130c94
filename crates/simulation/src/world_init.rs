// =============================================================================
// World generation: arterial road grid, warehouse, depot ring with one drone
// per depot, and the residence pool delivery destinations are drawn from.
// =============================================================================

use bevy::prelude::*;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::config::{
    CELL_SIZE, GRID_HEIGHT, GRID_WIDTH, RESIDENCE_SIZE, ROAD_SPACING, WORLD_HEIGHT, WORLD_WIDTH,
};
use crate::depots::{DepotId, PickupDepot, DEPOT_CAPACITY};
use crate::drones::{Drone, DroneId};
use crate::geometry::polygon_centroid;
use crate::road_network::{RoadNetwork, RoadNode};
use crate::sim_rng::SimRng;
use crate::warehouse::Warehouse;

/// Marker resource that, when present, causes `init_world` to skip map
/// generation. Used by the test harness to start from a hand-built world.
#[derive(Resource)]
pub struct SkipWorldInit;

/// Pickup depots placed on the arterial ring around the warehouse.
pub const DEPOT_COUNT: usize = 11;

/// Radius of the depot ring, in world units.
pub const DEPOT_RING_RADIUS: f32 = WORLD_WIDTH * 0.35;

/// Chance that a candidate lot beside a road actually gets a residence.
const RESIDENCE_FILL: f64 = 0.7;

/// How far residence lots sit from the road center line, in cells.
const LOT_SETBACK_CELLS: f32 = 1.5;

pub fn init_world(
    mut commands: Commands,
    mut rng: ResMut<SimRng>,
    skip: Option<Res<SkipWorldInit>>,
) {
    if skip.is_some() {
        return;
    }

    // --- Roads ---
    let mut network = RoadNetwork::default();
    build_arterial_grid(&mut network);

    // --- Warehouse ---
    let Some(warehouse) = place_warehouse(&network) else {
        panic!("arterial grid generation produced an empty road network");
    };

    // --- Depots and their drones ---
    spawn_depot_ring(&mut commands, &network);

    // --- Residences ---
    let registry = generate_residences(&mut rng.0);
    info!(
        "world ready: {} road nodes, {} road edges, {} depots, {} residences",
        network.node_count(),
        network.edge_count(),
        DEPOT_COUNT,
        registry.len()
    );

    commands.insert_resource(network);
    commands.insert_resource(warehouse);
    commands.insert_resource(registry);
}

// =============================================================================
// Road grid
// =============================================================================

/// Lay an arterial road down every `ROAD_SPACING`-th row and column, cell by
/// cell so edge ids line up with single-cell route steps.
fn build_arterial_grid(network: &mut RoadNetwork) {
    for y in (0..GRID_HEIGHT).step_by(ROAD_SPACING) {
        for x in 0..GRID_WIDTH - 1 {
            network.add_edge(RoadNode(x, y), RoadNode(x + 1, y));
        }
    }
    for x in (0..GRID_WIDTH).step_by(ROAD_SPACING) {
        for y in 0..GRID_HEIGHT - 1 {
            network.add_edge(RoadNode(x, y), RoadNode(x, y + 1));
        }
    }
}

/// Nodes where an arterial row meets an arterial column.
fn is_arterial_crossing(node: RoadNode) -> bool {
    node.0.is_multiple_of(ROAD_SPACING) && node.1.is_multiple_of(ROAD_SPACING)
}

// =============================================================================
// Warehouse
// =============================================================================

/// Put the warehouse at the road node nearest the map center. Its
/// `nearest_edge` is what cab routes get threaded through and what
/// assignment filters candidate cabs by.
fn place_warehouse(network: &RoadNetwork) -> Option<Warehouse> {
    let center = Vec2::new(WORLD_WIDTH, WORLD_HEIGHT) * 0.5;
    let hub = network.nearest_node(center)?;
    let hub_pos = hub.world_pos();
    let nearest_edge = network.nearest_edge(hub_pos)?;
    Some(Warehouse {
        center: hub_pos,
        nearest_edge,
    })
}

// =============================================================================
// Depot ring
// =============================================================================

/// Place `DEPOT_COUNT` depots on a ring around the map center, each snapped
/// to the nearest unoccupied arterial crossing. Crossings see traffic from
/// both directions, so cab routes pass depot edges often enough for
/// assignment to find a carrier.
///
/// Depot and drone reference each other, so the drone entity is reserved
/// first and its component filled in once the depot entity exists.
fn spawn_depot_ring(commands: &mut Commands, network: &RoadNetwork) {
    let center = Vec2::new(WORLD_WIDTH, WORLD_HEIGHT) * 0.5;
    let mut used: Vec<RoadNode> = Vec::new();

    for i in 0..DEPOT_COUNT {
        let angle = std::f32::consts::TAU * i as f32 / DEPOT_COUNT as f32;
        let target = center + DEPOT_RING_RADIUS * Vec2::new(angle.cos(), angle.sin());
        let Some(node) = nearest_free_crossing(network, target, &used) else {
            panic!(
                "only {} arterial crossings available for {} depots",
                used.len(),
                DEPOT_COUNT
            );
        };
        used.push(node);

        let depot_center = node.world_pos();
        let Some(nearest_edge) = network.nearest_edge(depot_center) else {
            panic!("no road edge near depot site {:?}", depot_center);
        };

        let drone_entity = commands.spawn_empty().id();
        let depot_entity = commands
            .spawn(PickupDepot::new(
                DepotId(i as u32),
                depot_center,
                DEPOT_CAPACITY,
                nearest_edge,
                drone_entity,
            ))
            .id();
        commands
            .entity(drone_entity)
            .insert(Drone::new(DroneId(i as u32), depot_entity, depot_center));
    }
}

/// Arterial crossing closest to `target` that no earlier depot took.
fn nearest_free_crossing(
    network: &RoadNetwork,
    target: Vec2,
    used: &[RoadNode],
) -> Option<RoadNode> {
    network
        .nodes()
        .iter()
        .copied()
        .filter(|&node| is_arterial_crossing(node) && !used.contains(&node))
        .min_by(|a, b| {
            let da = a.world_pos().distance_squared(target);
            let db = b.world_pos().distance_squared(target);
            da.total_cmp(&db)
        })
}

// =============================================================================
// Residences
// =============================================================================

/// One generated residence: a jittered quad beside a road, addressed by its
/// centroid.
#[derive(Debug, Clone)]
pub struct Residence {
    pub id: u32,
    pub corners: [Vec2; 4],
    pub centroid: Vec2,
}

/// All residences generated at startup. Delivery destinations are drawn
/// uniformly from this pool.
#[derive(Resource, Debug, Default)]
pub struct ResidenceRegistry {
    residences: Vec<Residence>,
}

impl ResidenceRegistry {
    pub fn add(&mut self, corners: [Vec2; 4]) {
        let id = self.residences.len() as u32;
        self.residences.push(Residence {
            id,
            corners,
            centroid: polygon_centroid(&corners),
        });
    }

    pub fn len(&self) -> usize {
        self.residences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residences.is_empty()
    }

    pub fn residences(&self) -> &[Residence] {
        &self.residences
    }

    /// Centroid of a uniformly drawn residence.
    pub fn random_destination(&self, rng: &mut ChaCha8Rng) -> Vec2 {
        self.residences[rng.gen_range(0..self.residences.len())].centroid
    }
}

/// Scatter residence quads along both sides of every arterial, skipping
/// lots that would stick out of the world. Odd cell indices keep lots away
/// from crossings.
fn generate_residences(rng: &mut ChaCha8Rng) -> ResidenceRegistry {
    let mut registry = ResidenceRegistry::default();
    for y in (0..GRID_HEIGHT).step_by(ROAD_SPACING) {
        for x in (1..GRID_WIDTH - 1).step_by(2) {
            for side in [-1.0f32, 1.0] {
                place_lot(
                    rng,
                    &mut registry,
                    RoadNode(x, y).world_pos(),
                    Vec2::new(0.0, side),
                );
            }
        }
    }
    for x in (0..GRID_WIDTH).step_by(ROAD_SPACING) {
        for y in (1..GRID_HEIGHT - 1).step_by(2) {
            for side in [-1.0f32, 1.0] {
                place_lot(
                    rng,
                    &mut registry,
                    RoadNode(x, y).world_pos(),
                    Vec2::new(side, 0.0),
                );
            }
        }
    }
    registry
}

/// Maybe drop one residence quad beside the road cell at `road`, set back
/// in direction `dir` with positional and per-corner jitter.
fn place_lot(rng: &mut ChaCha8Rng, registry: &mut ResidenceRegistry, road: Vec2, dir: Vec2) {
    if !rng.gen_bool(RESIDENCE_FILL) {
        return;
    }
    let jitter = Vec2::new(rng.gen_range(-4.0..4.0), rng.gen_range(-4.0..4.0));
    let lot = road + dir * LOT_SETBACK_CELLS * CELL_SIZE + jitter;
    if lot.x < RESIDENCE_SIZE
        || lot.y < RESIDENCE_SIZE
        || lot.x > WORLD_WIDTH - RESIDENCE_SIZE
        || lot.y > WORLD_HEIGHT - RESIDENCE_SIZE
    {
        return;
    }
    let half = RESIDENCE_SIZE * 0.5;
    let mut corner = |dx: f32, dy: f32| {
        lot + Vec2::new(
            dx * half + rng.gen_range(-1.0..1.0),
            dy * half + rng.gen_range(-1.0..1.0),
        )
    };
    let corners = [
        corner(-1.0, -1.0),
        corner(1.0, -1.0),
        corner(1.0, 1.0),
        corner(-1.0, 1.0),
    ];
    registry.add(corners);
}
