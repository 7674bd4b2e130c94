//! Parcel assignment: nearest depot with room, then the closest
//! warehouse-bound cab whose route passes that depot.
//!
//! Assignment is depot-first, and the ordering is load-bearing: the cab
//! step needs the depot's road edge to filter candidate routes. A depot
//! reservation survives a failed cab attempt, so a retried parcel repeats
//! only the cab leg. Both steps signal transient failure with `None`; the
//! queue drain re-enqueues such parcels at the tail and tries again next
//! tick.

use bevy::prelude::*;

use crate::cab_traffic::{Cab, CabPaint, CabRoute, CargoHold};
use crate::depots::PickupDepot;
use crate::geometry::euclidean_distance;
use crate::parcels::Parcel;
use crate::requests::AssignmentQueue;
use crate::road_network::RoadNetwork;
use crate::warehouse::Warehouse;

/// Reserve a depot slot for `parcel`: depots are ranked by straight-line
/// distance from the parcel destination, and the first with spare capacity
/// wins. Returns the chosen depot entity, or `None` when every depot is
/// full. Calling this for a parcel that already has a depot is a caller
/// bug; it is logged and ignored.
pub fn assign_parcel_to_depot(
    parcel_entity: Entity,
    parcel: &mut Parcel,
    depots: &mut Query<(Entity, &mut PickupDepot)>,
) -> Option<Entity> {
    if parcel.assigned_depot.is_some() {
        warn!(
            "parcel {:?} already assigned to depot {:?}; ignoring re-assignment",
            parcel.id, parcel.assigned_depot
        );
        return None;
    }
    let mut ranked: Vec<(Entity, f32)> = depots
        .iter()
        .map(|(entity, depot)| {
            (entity, euclidean_distance(parcel.destination, depot.center))
        })
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

    for (depot_entity, _) in ranked {
        let Ok((_, mut depot)) = depots.get_mut(depot_entity) else {
            unreachable!("depot {:?} vanished during assignment", depot_entity);
        };
        if !depot.has_capacity() {
            continue;
        }
        depot.reserve(parcel_entity);
        parcel.assigned_depot = Some(depot_entity);
        debug!("parcel {:?} assigned to depot {:?}", parcel.id, depot.id);
        return Some(depot_entity);
    }
    debug!("no depot has capacity for parcel {:?}", parcel.id);
    None
}

/// Pick a cab to haul `parcel` from the warehouse to its reserved depot.
/// Candidates are cabs whose remaining route still passes the warehouse
/// edge, closest-to-warehouse first; the first with hold space whose route
/// also passes the depot edge wins. The road-distance delta between the
/// depot and warehouse legs is charged to `parcel.distance_cab`. `None`
/// when no cab qualifies this tick.
pub fn assign_parcel_to_cab(
    parcel_entity: Entity,
    parcel: &mut Parcel,
    cabs: &mut Query<(Entity, &Cab, &CabRoute, &mut CargoHold, &mut CabPaint)>,
    depots: &Query<(Entity, &mut PickupDepot)>,
    warehouse: &Warehouse,
    network: &RoadNetwork,
) -> Option<Entity> {
    let Some(depot_entity) = parcel.assigned_depot else {
        panic!(
            "cab assignment for parcel {:?} with no depot; depot-before-cab ordering was violated",
            parcel.id
        );
    };
    let Ok((_, depot)) = depots.get(depot_entity) else {
        panic!(
            "parcel {:?} assigned to missing depot {:?}",
            parcel.id, depot_entity
        );
    };
    let depot_edge = depot.nearest_edge;
    let depot_center = depot.center;

    let mut ranked: Vec<(Entity, f32)> = Vec::new();
    for (cab_entity, _, route, _, _) in cabs.iter() {
        if !route.passes_edge(warehouse.nearest_edge) {
            continue;
        }
        let Some(to_warehouse) = network.driving_distance(route.position(), warehouse.center)
        else {
            continue;
        };
        ranked.push((cab_entity, to_warehouse));
    }
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

    for (cab_entity, to_warehouse) in ranked {
        let Ok((_, cab, route, mut hold, mut paint)) = cabs.get_mut(cab_entity) else {
            unreachable!("cab {:?} vanished during assignment", cab_entity);
        };
        if !hold.has_space() || !route.passes_edge(depot_edge) {
            continue;
        }
        let Some(to_depot) = network.driving_distance(route.position(), depot_center) else {
            continue;
        };
        hold.load(parcel_entity);
        *paint = CabPaint::Hauling;
        parcel.distance_cab += to_depot - to_warehouse;
        debug!(
            "parcel {:?} riding cab {:?}: {:.1} to the warehouse, {:.1} on to the depot",
            parcel.id,
            cab.id,
            to_warehouse,
            to_depot - to_warehouse
        );
        return Some(cab_entity);
    }
    debug!("no warehouse-bound cab can serve parcel {:?}", parcel.id);
    None
}

/// Both assignment steps for one parcel. A parcel retried after a cab
/// failure keeps its depot slot and skips straight to the cab step.
/// `false` means the caller should re-enqueue.
pub fn try_assign(
    parcel_entity: Entity,
    parcel: &mut Parcel,
    depots: &mut Query<(Entity, &mut PickupDepot)>,
    cabs: &mut Query<(Entity, &Cab, &CabRoute, &mut CargoHold, &mut CabPaint)>,
    warehouse: &Warehouse,
    network: &RoadNetwork,
) -> bool {
    let depot_assigned = match parcel.assigned_depot {
        Some(_) => true,
        None => assign_parcel_to_depot(parcel_entity, parcel, depots).is_some(),
    };
    if !depot_assigned {
        return false;
    }
    assign_parcel_to_cab(parcel_entity, parcel, cabs, depots, warehouse, network).is_some()
}

/// Drain the retry queue once: each pending parcel, including the ones
/// admitted earlier this tick, gets one depot-then-cab attempt. Failures
/// go back to the tail and are not re-attempted until the next tick.
pub fn drain_assignment_queue(
    mut queue: ResMut<AssignmentQueue>,
    mut parcels: Query<&mut Parcel>,
    mut depots: Query<(Entity, &mut PickupDepot)>,
    mut cabs: Query<(Entity, &Cab, &CabRoute, &mut CargoHold, &mut CabPaint)>,
    warehouse: Res<Warehouse>,
    network: Res<RoadNetwork>,
) {
    let pending = queue.0.len();
    for _ in 0..pending {
        let Some(parcel_entity) = queue.0.pop_front() else {
            break;
        };
        let Ok(mut parcel) = parcels.get_mut(parcel_entity) else {
            panic!("queued {:?} is not a parcel entity", parcel_entity);
        };
        let assigned = try_assign(
            parcel_entity,
            &mut parcel,
            &mut depots,
            &mut cabs,
            &warehouse,
            &network,
        );
        if !assigned {
            queue.0.push_back(parcel_entity);
        }
    }
}

pub struct AssignmentPlugin;

impl Plugin for AssignmentPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            drain_assignment_queue
                .after(crate::requests::admit_requests)
                .in_set(crate::SimulationSet::PostSim),
        );
    }
}
