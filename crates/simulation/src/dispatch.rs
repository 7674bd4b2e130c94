//! Depot dispatch: when a drone launches and which parcels it carries.
//!
//! A parked drone accumulates idle ticks while its depot shelf is
//! non-empty. Past the idle timeout, flight preparation runs: the farthest
//! shelf parcel fixes a delivery sector (an angular wedge approximating
//! what the drone's range can reach in that direction), in-sector parcels
//! are trimmed nearest-out to the drone's capacity, and the survivors are
//! flown on a closed tour planned by [`crate::tsp::plan_tour`].

use bevy::prelude::*;

use crate::depots::PickupDepot;
use crate::drones::{Drone, FlightStop, RouteStop, DRONE_MAX_IDLE_TICKS};
use crate::geometry::{bearing, euclidean_distance};
use crate::parcels::{Parcel, ParcelId};
use crate::tsp::plan_tour;

/// Angular wedge used to pre-filter one flight's candidates. Bounds are in
/// degrees with `theta1 <= theta2`; both the angular and the radial test
/// are inclusive, so the farthest shelf parcel always qualifies.
#[derive(Debug, Clone, Copy)]
pub struct DeliverySector {
    center: Vec2,
    radius: f32,
    theta1: f32,
    theta2: f32,
    full_circle: bool,
}

impl DeliverySector {
    /// Sector reaching out to `farthest`, of half-width
    /// `(range/radius − 2) / 2` radians around the bearing there. A
    /// non-positive width clamps to a zero-width ray; a description whose
    /// absolute bounds sum past 360° collapses to the full circle.
    pub fn around_farthest(center: Vec2, farthest: Vec2, range: f32) -> Self {
        let radius = euclidean_distance(center, farthest);
        let theta = (range / radius - 2.0).max(0.0);
        let heading = bearing(center, farthest);
        let theta1 = (heading - theta / 2.0).to_degrees();
        let theta2 = (heading + theta / 2.0).to_degrees();
        let full_circle = theta1.abs() + theta2.abs() > 360.0;
        Self {
            center,
            radius,
            theta1,
            theta2,
            full_circle,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn is_full_circle(&self) -> bool {
        self.full_circle
    }

    pub fn contains(&self, point: Vec2) -> bool {
        if euclidean_distance(self.center, point) > self.radius {
            return false;
        }
        if self.full_circle {
            return true;
        }
        let angle = bearing(self.center, point).to_degrees();
        let span = self.theta2 - self.theta1;
        (angle - self.theta1).rem_euclid(360.0) <= span
    }
}

struct Candidate {
    entity: Entity,
    id: ParcelId,
    destination: Vec2,
    from_depot: f32,
}

/// Dispatch evaluation for one depot and its drone. Counts idle ticks
/// while parcels wait on the shelf and the drone is parked; past the
/// timeout, prepares and launches a flight.
pub fn tick_depot(depot: &mut PickupDepot, drone: &mut Drone, parcels: &Query<&Parcel>) {
    if !drone.parked || depot.received().is_empty() {
        return;
    }
    drone.idle_ticks += 1;
    if drone.idle_ticks <= DRONE_MAX_IDLE_TICKS {
        return;
    }
    prepare_flight(depot, drone, parcels);
}

fn prepare_flight(depot: &mut PickupDepot, drone: &mut Drone, parcels: &Query<&Parcel>) {
    let shelf: Vec<Candidate> = depot
        .received()
        .iter()
        .map(|&entity| {
            let Ok(parcel) = parcels.get(entity) else {
                panic!(
                    "depot {:?} shelf holds {:?} which is not a parcel entity",
                    depot.id, entity
                );
            };
            Candidate {
                entity,
                id: parcel.id,
                destination: parcel.destination,
                from_depot: euclidean_distance(depot.center, parcel.destination),
            }
        })
        .collect();

    let sector = {
        let Some(farthest) = shelf.iter().max_by(|a, b| a.from_depot.total_cmp(&b.from_depot))
        else {
            unreachable!("flight preparation ran on an empty shelf at depot {:?}", depot.id);
        };
        DeliverySector::around_farthest(depot.center, farthest.destination, drone.range)
    };

    let mut candidates: Vec<Candidate> = shelf
        .into_iter()
        .filter(|c| sector.contains(c.destination))
        .collect();

    while candidates.len() > drone.capacity {
        let Some(nearest) = candidates
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.from_depot.total_cmp(&b.from_depot))
            .map(|(idx, _)| idx)
        else {
            unreachable!("candidate list outnumbering capacity cannot be empty");
        };
        let trimmed = candidates.remove(nearest);
        debug!(
            "parcel {:?} stays on the shelf at depot {:?}: drone {:?} is full",
            trimmed.id, depot.id, drone.id
        );
    }

    for candidate in &candidates {
        depot.take_received(candidate.entity);
        drone.load_cargo(candidate.entity);
    }
    assert!(
        !drone.cargo().is_empty(),
        "flight preparation at depot {:?} chose no parcels (sector radius {:.1})",
        depot.id,
        sector.radius()
    );

    let destinations: Vec<Vec2> = candidates.iter().map(|c| c.destination).collect();
    let order = plan_tour(depot.center, &destinations);
    let mut stops = Vec::with_capacity(order.len() + 2);
    stops.push(FlightStop {
        stop: RouteStop::Home,
        pos: depot.center,
    });
    for idx in order {
        stops.push(FlightStop {
            stop: RouteStop::Delivery(candidates[idx].entity),
            pos: destinations[idx],
        });
    }
    stops.push(FlightStop {
        stop: RouteStop::Home,
        pos: depot.center,
    });

    info!(
        "drone {:?} launching from depot {:?} with {} parcels after {} idle ticks",
        drone.id,
        depot.id,
        drone.cargo().len(),
        drone.idle_ticks
    );
    drone.launch(stops);
}

/// Evaluate dispatch at every depot.
pub fn evaluate_depot_dispatch(
    mut depots: Query<&mut PickupDepot>,
    mut drones: Query<&mut Drone>,
    parcels: Query<&Parcel>,
) {
    for mut depot in &mut depots {
        let drone_entity = depot.drone;
        let Ok(mut drone) = drones.get_mut(drone_entity) else {
            panic!("depot {:?} bound to missing drone {:?}", depot.id, drone_entity);
        };
        tick_depot(&mut depot, &mut drone, &parcels);
    }
}

pub struct DispatchPlugin;

impl Plugin for DispatchPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            evaluate_depot_dispatch
                .after(crate::depots::process_cab_arrivals)
                .in_set(crate::SimulationSet::Simulation),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_contains_its_farthest_point() {
        let farthest = Vec2::new(200.0, 0.0);
        let sector = DeliverySector::around_farthest(Vec2::ZERO, farthest, 500.0);
        assert!(!sector.is_full_circle());
        assert!(sector.contains(farthest));
    }

    #[test]
    fn test_sector_filters_by_angle_and_radius() {
        // range 500 at radius 200 gives a half-width of 0.25 rad ≈ 14.3°.
        let sector = DeliverySector::around_farthest(Vec2::ZERO, Vec2::new(200.0, 0.0), 500.0);
        let inside_angle = Vec2::new(150.0 * 0.985, 150.0 * 0.174); // ~10°
        let outside_angle = Vec2::new(150.0 * 0.940, 150.0 * 0.342); // ~20°
        let beyond_radius = Vec2::new(250.0, 0.0);
        assert!(sector.contains(inside_angle));
        assert!(!sector.contains(outside_angle));
        assert!(!sector.contains(beyond_radius));
    }

    #[test]
    fn test_negative_width_clamps_to_ray() {
        // radius 400 with range 500 makes range/radius − 2 negative; only
        // points on the exact bearing (and within radius) remain.
        let sector = DeliverySector::around_farthest(Vec2::ZERO, Vec2::new(400.0, 0.0), 500.0);
        assert!(sector.contains(Vec2::new(400.0, 0.0)));
        assert!(sector.contains(Vec2::new(100.0, 0.0)));
        assert!(!sector.contains(Vec2::new(100.0, 10.0)));
    }

    #[test]
    fn test_wide_sector_collapses_to_full_circle() {
        // radius 50 with range 500 describes a wedge wider than the full
        // turn, so every direction within the radius qualifies.
        let sector = DeliverySector::around_farthest(Vec2::ZERO, Vec2::new(50.0, 0.0), 500.0);
        assert!(sector.is_full_circle());
        assert!(sector.contains(Vec2::new(-30.0, 20.0)));
        assert!(sector.contains(Vec2::new(0.0, -49.0)));
        assert!(!sector.contains(Vec2::new(0.0, -51.0)));
    }

    #[test]
    fn test_sector_wraps_across_the_negative_x_axis() {
        // Heading 175° with a ~71.6° half-width: the wedge spans the ±180°
        // seam, and a point at -170° lies inside it.
        let heading = 175.0_f32.to_radians();
        let farthest = Vec2::new(200.0 * heading.cos(), 200.0 * heading.sin());
        let sector = DeliverySector::around_farthest(Vec2::ZERO, farthest, 900.0);
        assert!(!sector.is_full_circle());
        let wrapped = 190.0_f32.to_radians();
        let inside = Vec2::new(150.0 * wrapped.cos(), 150.0 * wrapped.sin());
        assert!(sector.contains(inside));
        let outside = Vec2::new(150.0, 0.0);
        assert!(!sector.contains(outside));
    }
}
