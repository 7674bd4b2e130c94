//! Pickup depots: the intermediate hop between cab and drone.
//!
//! A depot tracks two disjoint parcel sets: `assigned` (riding a cab toward
//! the depot) and `received` (waiting on the shelf for a drone). The only
//! transition between them is cab drop-off, detected per tick by comparing
//! each hauling cab's current road edge against the depot's nearest edge.

use bevy::prelude::*;

use crate::cab_traffic::{Cab, CabPaint, CabRoute, CargoHold};
use crate::parcels::Parcel;
use crate::road_network::EdgeId;

/// Parcels a depot can have in flight toward it or on the shelf.
pub const DEPOT_CAPACITY: usize = 2;

/// Stable external depot identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DepotId(pub u32);

/// One pickup depot. The drone entity is bound at world init; exactly one
/// drone per depot, never shared.
#[derive(Component, Debug)]
pub struct PickupDepot {
    pub id: DepotId,
    pub center: Vec2,
    pub capacity: usize,
    pub nearest_edge: EdgeId,
    pub drone: Entity,
    assigned: Vec<Entity>,
    received: Vec<Entity>,
}

impl PickupDepot {
    pub fn new(
        id: DepotId,
        center: Vec2,
        capacity: usize,
        nearest_edge: EdgeId,
        drone: Entity,
    ) -> Self {
        Self {
            id,
            center,
            capacity,
            nearest_edge,
            drone,
            assigned: Vec::new(),
            received: Vec::new(),
        }
    }

    /// Parcels counted against capacity: en route plus on the shelf. A slot
    /// frees only when a drone departs with the parcel.
    pub fn pending_load(&self) -> usize {
        self.assigned.len() + self.received.len()
    }

    pub fn has_capacity(&self) -> bool {
        self.pending_load() < self.capacity
    }

    pub fn assigned(&self) -> &[Entity] {
        &self.assigned
    }

    pub fn received(&self) -> &[Entity] {
        &self.received
    }

    /// Reserve a slot for a parcel that assignment just routed here.
    pub fn reserve(&mut self, parcel: Entity) {
        assert!(
            !self.assigned.contains(&parcel) && !self.received.contains(&parcel),
            "depot {:?} already tracks {:?} (assigned {:?}, received {:?})",
            self.id,
            parcel,
            self.assigned,
            self.received
        );
        assert!(
            self.pending_load() < self.capacity,
            "depot {:?} over capacity reserving {:?} ({} pending, capacity {})",
            self.id,
            parcel,
            self.pending_load(),
            self.capacity
        );
        self.assigned.push(parcel);
    }

    /// Cab drop-off: move a parcel from `assigned` to `received`. The
    /// upstream capacity check makes overflow here statically impossible,
    /// so both failure modes are fatal bookkeeping bugs.
    pub fn receive(&mut self, parcel: Entity) {
        let idx = match self.assigned.iter().position(|&p| p == parcel) {
            Some(idx) => idx,
            None => panic!(
                "depot {:?} received {:?} that was never assigned (assigned {:?})",
                self.id, parcel, self.assigned
            ),
        };
        assert!(
            self.received.len() < self.capacity,
            "depot {:?} shelf over capacity receiving {:?} (received {:?}, capacity {})",
            self.id,
            parcel,
            self.received,
            self.capacity
        );
        self.assigned.remove(idx);
        self.received.push(parcel);
    }

    /// Hand a shelf parcel to the drone. Fatal if the parcel is not on the
    /// shelf.
    pub fn take_received(&mut self, parcel: Entity) {
        match self.received.iter().position(|&p| p == parcel) {
            Some(idx) => {
                self.received.remove(idx);
            }
            None => panic!(
                "depot {:?} asked to hand over {:?} not on shelf (received {:?})",
                self.id, parcel, self.received
            ),
        }
    }
}

/// Arrival detection for one cab: drop every carried parcel whose depot
/// edge the cab is currently on.
pub fn tick_cab(
    cab: &Cab,
    route: &CabRoute,
    hold: &mut CargoHold,
    paint: &mut CabPaint,
    depots: &mut Query<&mut PickupDepot>,
    parcels: &mut Query<&mut Parcel>,
) {
    if hold.is_empty() {
        return;
    }
    let current = route.current_edge();
    let mut arrivals: Vec<(Entity, Entity)> = Vec::new();
    for &parcel_entity in hold.parcels() {
        let Ok(parcel) = parcels.get(parcel_entity) else {
            panic!(
                "cab {:?} holds {:?} which is not a parcel entity",
                cab.id, parcel_entity
            );
        };
        let Some(depot_entity) = parcel.assigned_depot else {
            panic!(
                "parcel {:?} rides cab {:?} without an assigned depot",
                parcel.id, cab.id
            );
        };
        let Ok(depot) = depots.get(depot_entity) else {
            panic!(
                "parcel {:?} assigned to missing depot {:?}",
                parcel.id, depot_entity
            );
        };
        if depot.nearest_edge == current {
            arrivals.push((parcel_entity, depot_entity));
        }
    }
    for (parcel_entity, depot_entity) in arrivals {
        let Ok(mut depot) = depots.get_mut(depot_entity) else {
            unreachable!("depot {:?} vanished mid-tick", depot_entity);
        };
        depot.receive(parcel_entity);
        let Ok(mut parcel) = parcels.get_mut(parcel_entity) else {
            unreachable!("parcel {:?} vanished mid-tick", parcel_entity);
        };
        parcel.mark_reached_depot();
        hold.unload(parcel_entity);
        debug!(
            "parcel {:?} dropped at depot {:?} by cab {:?}",
            parcel.id, depot.id, cab.id
        );
    }
    if hold.is_empty() {
        *paint = CabPaint::Free;
    }
}

/// Run arrival detection across all hauling cabs.
pub fn process_cab_arrivals(
    mut cabs: Query<(&Cab, &CabRoute, &mut CargoHold, &mut CabPaint)>,
    mut depots: Query<&mut PickupDepot>,
    mut parcels: Query<&mut Parcel>,
) {
    for (cab, route, mut hold, mut paint) in &mut cabs {
        tick_cab(cab, route, &mut hold, &mut paint, &mut depots, &mut parcels);
    }
}

pub struct DepotsPlugin;

impl Plugin for DepotsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            process_cab_arrivals.in_set(crate::SimulationSet::Simulation),
        );
    }
}
