//! Cab spawning and per-tick route stepping.

use bevy::prelude::*;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::road_network::{EdgeId, RoadNetwork, RoadNode};
use crate::sim_rng::SimRng;
use crate::warehouse::Warehouse;
use crate::TickCounter;

use super::constants::{
    CAB_CAPACITY, CAB_SPEED_CELLS_PER_TICK, MAX_CABS, SPAWN_INTERVAL_TICKS, WAREHOUSE_ROUTE_SHARE,
};
use super::types::{Cab, CabPaint, CabRoute, CabTrafficState, CargoHold};

/// Top up the cab population every few ticks. A share of trips is routed
/// via the warehouse's road edge so assignment always has warehouse-bound
/// cabs to consider.
pub fn spawn_cabs(
    mut commands: Commands,
    tick: Res<TickCounter>,
    mut state: ResMut<CabTrafficState>,
    mut rng: ResMut<SimRng>,
    network: Res<RoadNetwork>,
    warehouse: Res<Warehouse>,
    cabs: Query<(), With<Cab>>,
) {
    if !state.auto_spawn || !tick.0.is_multiple_of(SPAWN_INTERVAL_TICKS) {
        return;
    }
    if network.node_count() < 2 {
        return;
    }
    let alive = cabs.iter().count();
    for _ in alive..MAX_CABS {
        let Some(route) = plan_trip(&mut rng.0, &network, &warehouse) else {
            continue;
        };
        let id = state.allocate_id();
        state.spawned += 1;
        debug!("cab {:?} enters service ({} route nodes)", id, route.nodes().len());
        commands.spawn((
            Cab { id },
            route,
            CargoHold::new(CAB_CAPACITY),
            CabPaint::Free,
        ));
    }
}

/// Pick a random trip across the network, threading it through the
/// warehouse with probability [`WAREHOUSE_ROUTE_SHARE`]. `None` when the
/// draw degenerates (same origin and destination, or no connecting path);
/// the spawner just tries again on its next pass.
fn plan_trip(
    rng: &mut ChaCha8Rng,
    network: &RoadNetwork,
    warehouse: &Warehouse,
) -> Option<CabRoute> {
    let nodes = network.nodes();
    let origin = nodes[rng.gen_range(0..nodes.len())];
    let dest = nodes[rng.gen_range(0..nodes.len())];
    let via_warehouse = rng.gen_bool(WAREHOUSE_ROUTE_SHARE);
    if origin == dest {
        return None;
    }
    let path = if via_warehouse {
        route_via_edge(network, origin, dest, warehouse.nearest_edge)?
    } else {
        network.path(origin, dest)?
    };
    if path.len() < 2 {
        return None;
    }
    Some(CabRoute::new(path, network))
}

/// Path from `origin` to `dest` that traverses `via` itself, not merely
/// one of its endpoints. Enters at whichever endpoint is closer to the
/// origin and leaves from the other, so `passes_edge(via)` holds for the
/// whole pre-warehouse stretch of the trip.
pub(super) fn route_via_edge(
    network: &RoadNetwork,
    origin: RoadNode,
    dest: RoadNode,
    via: EdgeId,
) -> Option<Vec<RoadNode>> {
    let edge = network.edge(via);
    let to_a = network.path(origin, edge.a)?;
    let to_b = network.path(origin, edge.b)?;
    let (mut path, exit) = if to_a.len() <= to_b.len() {
        (to_a, edge.b)
    } else {
        (to_b, edge.a)
    };
    path.push(exit);
    let tail = network.path(exit, dest)?;
    path.extend_from_slice(&tail[1..]);
    Some(path)
}

/// Advance every cab along its route. A cab that finished its route lingers
/// for one tick so arrival detection has seen its final edge, then despawns
/// once its hold is empty.
pub fn step_cab_traffic(
    mut commands: Commands,
    mut state: ResMut<CabTrafficState>,
    mut cabs: Query<(Entity, &Cab, &mut CabRoute, &CargoHold)>,
) {
    for (entity, cab, mut route, hold) in &mut cabs {
        if route.is_complete() {
            if hold.is_empty() {
                state.completed += 1;
                commands.entity(entity).despawn();
            } else {
                warn!(
                    "cab {:?} finished its route still holding {:?}; keeping it parked",
                    cab.id,
                    hold.parcels()
                );
            }
            continue;
        }
        route.advance(CAB_SPEED_CELLS_PER_TICK);
    }
}
