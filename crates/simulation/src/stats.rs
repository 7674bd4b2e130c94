//! Run statistics for the delivery pipeline.
//!
//! [`DeliveryStats`] is rebuilt from world state at the end of every tick
//! rather than folded incrementally, so it stays correct no matter which
//! systems mutated parcels this tick. The headless driver serializes it
//! into the end-of-run summary.

use bevy::prelude::*;
use serde::Serialize;

use crate::cab_traffic::CabTrafficState;
use crate::drones::Drone;
use crate::parcels::Parcel;
use crate::requests::{AssignmentQueue, RequestState};
use crate::road_network::RoadNetwork;

#[derive(Resource, Debug, Default, Clone, Serialize)]
pub struct DeliveryStats {
    /// Requests admitted so far.
    pub requested: u32,
    /// Parcels holding a depot reservation (delivered ones included).
    pub assigned: u32,
    pub delivered: u32,
    /// Parcels sitting in the retry queue.
    pub awaiting_assignment: usize,
    /// Sum of per-parcel cab-leg road distances.
    pub cab_distance_total: f32,
    /// Sum of per-parcel drone-leg distances at delivery.
    pub drone_distance_total: f32,
    pub flights_flown: u64,
    /// Lifetime flight distance summed over all drones.
    pub flight_distance_total: f32,
    pub cabs_spawned: u64,
    pub cabs_completed: u64,
}

/// Rebuild [`DeliveryStats`] from the world after this tick's assignment
/// drain.
pub fn collect_delivery_stats(
    mut stats: ResMut<DeliveryStats>,
    state: Res<RequestState>,
    queue: Res<AssignmentQueue>,
    traffic: Res<CabTrafficState>,
    parcels: Query<&Parcel>,
    drones: Query<&Drone>,
) {
    stats.requested = state.requested;
    stats.awaiting_assignment = queue.0.len();
    stats.assigned = parcels.iter().filter(|p| p.assigned_depot.is_some()).count() as u32;
    stats.delivered = parcels.iter().filter(|p| p.is_delivered()).count() as u32;
    stats.cab_distance_total = parcels.iter().map(|p| p.distance_cab).sum();
    stats.drone_distance_total = parcels
        .iter()
        .filter(|p| p.is_delivered())
        .map(|p| p.distance_drone)
        .sum();
    stats.flights_flown = drones.iter().map(|d| d.flights_flown).sum();
    stats.flight_distance_total = drones.iter().map(|d| d.lifetime_distance).sum();
    stats.cabs_spawned = traffic.spawned;
    stats.cabs_completed = traffic.completed;
}

/// Road distance a single cab would drive to deliver to `destinations`
/// directly from the warehouse, visiting greedily nearest-first. The
/// comparison baseline for the cab-plus-drone scheme. `None` if any leg is
/// unreachable on the network.
pub fn cab_only_route_distance(
    network: &RoadNetwork,
    warehouse_center: Vec2,
    destinations: &[Vec2],
) -> Option<f32> {
    let mut remaining: Vec<Vec2> = destinations.to_vec();
    let mut current = warehouse_center;
    let mut total = 0.0;
    while !remaining.is_empty() {
        let mut best: Option<(usize, f32)> = None;
        for (i, &dest) in remaining.iter().enumerate() {
            let d = network.driving_distance(current, dest)?;
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((i, d));
            }
        }
        let (idx, dist) = best?;
        total += dist;
        current = remaining.swap_remove(idx);
    }
    Some(total)
}

pub struct StatsPlugin;

impl Plugin for StatsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DeliveryStats>().add_systems(
            FixedUpdate,
            collect_delivery_stats
                .after(crate::assignment::drain_assignment_queue)
                .in_set(crate::SimulationSet::PostSim),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CELL_SIZE;
    use crate::road_network::RoadNode;

    #[test]
    fn test_cab_only_baseline_visits_greedily() {
        let mut net = RoadNetwork::default();
        for x in 0..6 {
            net.add_edge(RoadNode(x, 0), RoadNode(x + 1, 0));
        }
        let warehouse = RoadNode(0, 0).world_pos();
        let near = RoadNode(2, 0).world_pos();
        let far = RoadNode(6, 0).world_pos();
        // Greedy: 2 cells to the near stop, then 4 more to the far one.
        let total = cab_only_route_distance(&net, warehouse, &[far, near]);
        assert_eq!(total, Some(6.0 * CELL_SIZE));
    }

    #[test]
    fn test_cab_only_baseline_empty_is_zero() {
        let net = RoadNetwork::default();
        assert_eq!(cab_only_route_distance(&net, Vec2::ZERO, &[]), Some(0.0));
    }

    #[test]
    fn test_cab_only_baseline_unreachable_is_none() {
        let mut net = RoadNetwork::default();
        net.add_edge(RoadNode(0, 0), RoadNode(1, 0));
        net.add_edge(RoadNode(10, 10), RoadNode(11, 10));
        let warehouse = RoadNode(0, 0).world_pos();
        let island = RoadNode(10, 10).world_pos();
        assert_eq!(cab_only_route_distance(&net, warehouse, &[island]), None);
    }
}
