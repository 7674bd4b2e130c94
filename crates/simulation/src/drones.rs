//! Delivery drones and their per-tick flight kinematics.
//!
//! A drone belongs to exactly one depot. Parked, it sits at the depot
//! center accumulating idle ticks whenever parcels wait on the shelf.
//! Launched, it flies a closed multi-stop route at constant speed along
//! straight segments: step toward the current stop, snap onto it when the
//! remaining distance fits in one step, deliver if the stop is a parcel
//! destination, advance the cursor, and park again once the route is
//! exhausted.

use bevy::prelude::*;

use crate::geometry::bearing;
use crate::parcels::Parcel;

/// Parcels a drone can carry per flight.
pub const DRONE_CAPACITY: usize = 2;

/// Flight speed, distance units per tick.
pub const DRONE_SPEED: f32 = 2.0;

/// Nominal flight range, used by the dispatch sector geometry.
pub const DRONE_RANGE: f32 = 500.0;

/// Idle ticks (parked, shelf non-empty) after which dispatch must launch.
pub const DRONE_MAX_IDLE_TICKS: u32 = 30;

/// Stable external drone identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DroneId(pub u32);

/// What kind of stop a route entry is. Tagged explicitly; flight code never
/// guesses from coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteStop {
    Home,
    Delivery(Entity),
}

/// One stop of a planned flight: the tag plus its fixed world position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightStop {
    pub stop: RouteStop,
    pub pos: Vec2,
}

/// An owned stop sequence with an explicit cursor. The cursor only moves
/// forward; exhaustion ends the flight.
#[derive(Debug, Default)]
pub struct FlightRoute {
    stops: Vec<FlightStop>,
    next: usize,
}

impl FlightRoute {
    pub fn new(stops: Vec<FlightStop>) -> Self {
        Self { stops, next: 0 }
    }

    pub fn current(&self) -> Option<FlightStop> {
        self.stops.get(self.next).copied()
    }

    pub fn advance(&mut self) {
        self.next += 1;
    }

    pub fn is_exhausted(&self) -> bool {
        self.next >= self.stops.len()
    }

    /// Delivery stops not yet visited.
    pub fn remaining_deliveries(&self) -> usize {
        self.stops[self.next.min(self.stops.len())..]
            .iter()
            .filter(|s| matches!(s.stop, RouteStop::Delivery(_)))
            .count()
    }

    pub fn clear(&mut self) {
        self.stops.clear();
        self.next = 0;
    }

    pub fn stops(&self) -> &[FlightStop] {
        &self.stops
    }
}

/// One delivery drone.
#[derive(Component, Debug)]
pub struct Drone {
    pub id: DroneId,
    pub home_depot: Entity,
    pub home: Vec2,
    pub capacity: usize,
    pub speed: f32,
    pub range: f32,
    pub parked: bool,
    pub position: Vec2,
    /// Ticks spent parked while the depot shelf was non-empty.
    pub idle_ticks: u32,
    /// Distance flown on the current (or just-finished) flight.
    pub flight_distance: f32,
    /// Distance flown over the drone's lifetime.
    pub lifetime_distance: f32,
    pub flights_flown: u64,
    route: FlightRoute,
    cargo: Vec<Entity>,
}

impl Drone {
    pub fn new(id: DroneId, home_depot: Entity, home: Vec2) -> Self {
        Self {
            id,
            home_depot,
            home,
            capacity: DRONE_CAPACITY,
            speed: DRONE_SPEED,
            range: DRONE_RANGE,
            parked: true,
            position: home,
            idle_ticks: 0,
            flight_distance: 0.0,
            lifetime_distance: 0.0,
            flights_flown: 0,
            route: FlightRoute::default(),
            cargo: Vec::new(),
        }
    }

    pub fn cargo(&self) -> &[Entity] {
        &self.cargo
    }

    pub fn route(&self) -> &FlightRoute {
        &self.route
    }

    pub fn load_cargo(&mut self, parcel: Entity) {
        assert!(
            self.cargo.len() < self.capacity,
            "drone {:?} over capacity loading {:?}: cargo {:?} (capacity {})",
            self.id,
            parcel,
            self.cargo,
            self.capacity
        );
        assert!(
            !self.cargo.contains(&parcel),
            "drone {:?} already carries {:?}: cargo {:?}",
            self.id,
            parcel,
            self.cargo
        );
        self.cargo.push(parcel);
    }

    pub fn drop_cargo(&mut self, parcel: Entity) {
        match self.cargo.iter().position(|&p| p == parcel) {
            Some(idx) => {
                self.cargo.remove(idx);
            }
            None => panic!(
                "drone {:?} dropping {:?} not in cargo: {:?}",
                self.id, parcel, self.cargo
            ),
        }
    }

    /// Begin a flight over a planned closed tour. The tour starts at the
    /// home stop (the drone's current position); the cursor is set past it
    /// so the first target is the first real leg.
    pub fn launch(&mut self, stops: Vec<FlightStop>) {
        assert!(
            self.parked,
            "drone {:?} launched while already flying (route {:?})",
            self.id,
            self.route.stops()
        );
        assert!(
            !self.cargo.is_empty(),
            "drone {:?} launched with empty cargo",
            self.id
        );
        assert!(
            stops.len() >= 2 && stops[0].stop == RouteStop::Home,
            "drone {:?} launched with malformed tour {:?}",
            self.id,
            stops
        );
        self.position = stops[0].pos;
        self.route = FlightRoute::new(stops);
        self.route.advance();
        self.parked = false;
        self.flight_distance = 0.0;
        self.idle_ticks = 0;
    }

    /// Land and reset: called when the route cursor runs off the end.
    fn end_flight(&mut self) {
        self.route.clear();
        self.position = self.home;
        self.parked = true;
        self.idle_ticks = 0;
        self.lifetime_distance += self.flight_distance;
        self.flights_flown += 1;
    }
}

/// One cruise step toward `target`: returns the new position and the
/// distance covered. Snaps exactly onto the target when the remaining
/// distance fits within one step, so arrival can be tested with `==`.
fn cruise_step(position: Vec2, target: Vec2, speed: f32) -> (Vec2, f32) {
    let remaining = position.distance(target);
    if remaining <= speed {
        return (target, remaining);
    }
    let theta = bearing(position, target);
    let next = position + Vec2::new(speed * theta.cos(), speed * theta.sin());
    (next, speed)
}

/// Advance one drone by one tick of flight. No-op while parked.
pub fn tick_drone_if_flying(drone: &mut Drone, parcels: &mut Query<&mut Parcel>) {
    if drone.parked {
        return;
    }
    let Some(target) = drone.route.current() else {
        unreachable!("drone {:?} unparked with exhausted route", drone.id);
    };

    let (next, stepped) = cruise_step(drone.position, target.pos, drone.speed);
    drone.position = next;
    drone.flight_distance += stepped;

    if drone.position != target.pos {
        return;
    }
    if let RouteStop::Delivery(parcel_entity) = target.stop {
        let Ok(mut parcel) = parcels.get_mut(parcel_entity) else {
            panic!(
                "drone {:?} arrived at {:?} which is not a parcel entity",
                drone.id, parcel_entity
            );
        };
        parcel.mark_delivered(drone.flight_distance);
        let flight_distance = drone.flight_distance;
        drone.drop_cargo(parcel_entity);
        debug!(
            "parcel {:?} delivered by drone {:?} at {:.1} units into the flight",
            parcel.id, drone.id, flight_distance
        );
    }
    drone.route.advance();
    if drone.route.is_exhausted() {
        debug!(
            "drone {:?} landed: {:.1} units flown this flight",
            drone.id, drone.flight_distance
        );
        drone.end_flight();
    }
}

/// Step every in-flight drone.
pub fn step_drones(mut drones: Query<&mut Drone>, mut parcels: Query<&mut Parcel>) {
    for mut drone in &mut drones {
        tick_drone_if_flying(&mut drone, &mut parcels);
    }
}

pub struct DronesPlugin;

impl Plugin for DronesPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            step_drones
                .after(crate::dispatch::evaluate_depot_dispatch)
                .in_set(crate::SimulationSet::Simulation),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_drone() -> Drone {
        Drone::new(DroneId(0), Entity::from_raw(50), Vec2::ZERO)
    }

    fn home_stop() -> FlightStop {
        FlightStop {
            stop: RouteStop::Home,
            pos: Vec2::ZERO,
        }
    }

    #[test]
    fn test_new_drone_is_parked_at_home() {
        let d = test_drone();
        assert!(d.parked);
        assert_eq!(d.position, Vec2::ZERO);
        assert!(d.cargo().is_empty());
        assert!(d.route().is_exhausted());
    }

    #[test]
    fn test_route_cursor_advances_to_exhaustion() {
        let mut route = FlightRoute::new(vec![
            home_stop(),
            FlightStop {
                stop: RouteStop::Delivery(Entity::from_raw(1)),
                pos: Vec2::new(3.0, 4.0),
            },
            home_stop(),
        ]);
        assert_eq!(route.remaining_deliveries(), 1);
        route.advance();
        route.advance();
        assert_eq!(route.remaining_deliveries(), 0);
        assert!(!route.is_exhausted());
        route.advance();
        assert!(route.is_exhausted());
    }

    #[test]
    fn test_launch_resets_flight_state() {
        let mut d = test_drone();
        d.flight_distance = 17.0;
        d.idle_ticks = 31;
        d.load_cargo(Entity::from_raw(1));
        d.launch(vec![
            home_stop(),
            FlightStop {
                stop: RouteStop::Delivery(Entity::from_raw(1)),
                pos: Vec2::new(10.0, 0.0),
            },
            home_stop(),
        ]);
        assert!(!d.parked);
        assert_eq!(d.flight_distance, 0.0);
        assert_eq!(d.idle_ticks, 0);
        let current = d.route().current().unwrap();
        assert_eq!(current.stop, RouteStop::Delivery(Entity::from_raw(1)));
    }

    #[test]
    #[should_panic(expected = "empty cargo")]
    fn test_launch_with_empty_cargo_panics() {
        let mut d = test_drone();
        d.launch(vec![home_stop(), home_stop()]);
    }

    #[test]
    #[should_panic(expected = "over capacity")]
    fn test_cargo_over_capacity_panics() {
        let mut d = test_drone();
        d.load_cargo(Entity::from_raw(1));
        d.load_cargo(Entity::from_raw(2));
        d.load_cargo(Entity::from_raw(3));
    }

    #[test]
    #[should_panic(expected = "not in cargo")]
    fn test_drop_absent_cargo_panics() {
        let mut d = test_drone();
        d.drop_cargo(Entity::from_raw(4));
    }

    #[test]
    fn test_cruise_step_partial() {
        let (pos, stepped) = cruise_step(Vec2::ZERO, Vec2::new(10.0, 0.0), 2.0);
        assert_eq!(pos, Vec2::new(2.0, 0.0));
        assert_eq!(stepped, 2.0);
    }

    #[test]
    fn test_cruise_step_snaps_onto_target() {
        let target = Vec2::new(3.0, 4.0);
        let (pos, stepped) = cruise_step(Vec2::new(3.0, 2.5), target, 2.0);
        assert_eq!(pos, target);
        assert_eq!(stepped, 1.5);
    }

    #[test]
    fn test_cruise_reaches_target_in_ceil_ticks() {
        let target = Vec2::new(3.0, 4.0);
        let speed = 2.0;
        let mut pos = Vec2::ZERO;
        let expected_ticks = (pos.distance(target) / speed).ceil() as u32;
        let mut ticks = 0;
        while pos != target {
            let (next, _) = cruise_step(pos, target, speed);
            pos = next;
            ticks += 1;
            assert!(ticks <= expected_ticks, "overshot: {} ticks", ticks);
        }
        assert_eq!(ticks, expected_ticks);
    }
}
