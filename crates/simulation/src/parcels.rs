//! Parcel entities and their delivery lifecycle.
//!
//! A parcel is created when a delivery request is admitted, travels
//! warehouse → cab → pickup depot → drone, and becomes terminal once
//! delivered. The entity carries its own flags and distance accounting;
//! custody (who currently holds the parcel) lives in the holder sets of
//! the retry queue, cab holds, depot sets and drone cargo.

use bevy::prelude::*;

/// Stable external parcel identity, in request order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParcelId(pub u32);

/// Allocates [`ParcelId`]s monotonically.
#[derive(Resource, Default)]
pub struct ParcelIds {
    next: u32,
}

impl ParcelIds {
    pub fn allocate(&mut self) -> ParcelId {
        let id = ParcelId(self.next);
        self.next += 1;
        id
    }
}

/// A parcel en route from the warehouse to a residence.
#[derive(Component, Debug)]
pub struct Parcel {
    pub id: ParcelId,
    /// Centroid of the destination residence.
    pub destination: Vec2,
    /// Depot chosen by assignment; set exactly once.
    pub assigned_depot: Option<Entity>,
    pub reached_depot: bool,
    pub reached_destination: bool,
    /// Road distance accumulated on the cab leg.
    pub distance_cab: f32,
    /// Flight distance at the moment of delivery; frozen afterwards.
    pub distance_drone: f32,
}

impl Parcel {
    pub fn new(id: ParcelId, destination: Vec2) -> Self {
        Self {
            id,
            destination,
            assigned_depot: None,
            reached_depot: false,
            reached_destination: false,
            distance_cab: 0.0,
            distance_drone: 0.0,
        }
    }

    /// Terminal state: delivered parcels are out of every holder set.
    pub fn is_delivered(&self) -> bool {
        self.reached_destination
    }

    pub fn mark_reached_depot(&mut self) {
        self.reached_depot = true;
    }

    /// Record delivery at `flight_distance` flown since launch.
    pub fn mark_delivered(&mut self, flight_distance: f32) {
        self.reached_destination = true;
        self.distance_drone = flight_distance;
    }
}

/// Spawn a parcel entity for a new delivery request.
pub fn create_parcel(commands: &mut Commands, ids: &mut ParcelIds, destination: Vec2) -> Entity {
    let id = ids.allocate();
    commands.spawn(Parcel::new(id, destination)).id()
}

pub struct ParcelsPlugin;

impl Plugin for ParcelsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ParcelIds>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parcel_ids_are_monotonic() {
        let mut ids = ParcelIds::default();
        assert_eq!(ids.allocate(), ParcelId(0));
        assert_eq!(ids.allocate(), ParcelId(1));
        assert_eq!(ids.allocate(), ParcelId(2));
    }

    #[test]
    fn test_new_parcel_starts_unassigned() {
        let p = Parcel::new(ParcelId(7), Vec2::new(10.0, 20.0));
        assert!(p.assigned_depot.is_none());
        assert!(!p.reached_depot);
        assert!(!p.is_delivered());
        assert_eq!(p.distance_cab, 0.0);
        assert_eq!(p.distance_drone, 0.0);
    }

    #[test]
    fn test_mark_delivered_records_flight_distance() {
        let mut p = Parcel::new(ParcelId(0), Vec2::ZERO);
        p.mark_delivered(123.5);
        assert!(p.is_delivered());
        assert_eq!(p.distance_drone, 123.5);
    }
}
