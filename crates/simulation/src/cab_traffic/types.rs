//! Components and resources for cab traffic.

use bevy::prelude::*;

use crate::road_network::{EdgeId, RoadNetwork, RoadNode};

/// Stable external cab identity; survives as long as the cab entity does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CabId(pub u32);

/// Marker + identity component of one cab.
#[derive(Component, Debug)]
pub struct Cab {
    pub id: CabId,
}

/// Cosmetic paint: hauling cabs are repainted so a run can be watched or
/// inspected; nothing reads this for decisions.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CabPaint {
    Free,
    Hauling,
}

/// A cab's planned route: an A* node path with a fractional progress
/// cursor. The route is fixed at spawn; only `progress` moves.
#[derive(Component, Debug)]
pub struct CabRoute {
    nodes: Vec<RoadNode>,
    edges: Vec<EdgeId>,
    progress: f32,
}

impl CabRoute {
    /// Build a route from a node path produced by `network.path`. Panics on
    /// paths shorter than two nodes; the spawner never emits those.
    pub fn new(nodes: Vec<RoadNode>, network: &RoadNetwork) -> Self {
        assert!(
            nodes.len() >= 2,
            "cab route needs at least two nodes, got {:?}",
            nodes
        );
        let edges = network.route_edges(&nodes);
        Self {
            nodes,
            edges,
            progress: 0.0,
        }
    }

    fn segment_index(&self) -> usize {
        (self.progress.floor() as usize).min(self.edges.len() - 1)
    }

    /// Road edge the cab currently occupies. After completion this stays
    /// pinned to the final edge.
    pub fn current_edge(&self) -> EdgeId {
        self.edges[self.segment_index()]
    }

    /// Edges not yet fully traversed, current segment first.
    pub fn remaining_edges(&self) -> &[EdgeId] {
        &self.edges[self.segment_index()..]
    }

    /// Whether the not-yet-traversed part of the route passes `edge`.
    pub fn passes_edge(&self, edge: EdgeId) -> bool {
        self.remaining_edges().contains(&edge)
    }

    /// World-space position interpolated along the current segment.
    pub fn position(&self) -> Vec2 {
        let seg = self.segment_index();
        let frac = (self.progress - seg as f32).clamp(0.0, 1.0);
        self.nodes[seg]
            .world_pos()
            .lerp(self.nodes[seg + 1].world_pos(), frac)
    }

    /// Advance by `cells` grid cells, clamped at the route end.
    pub fn advance(&mut self, cells: f32) {
        let end = (self.nodes.len() - 1) as f32;
        self.progress = (self.progress + cells).min(end);
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= (self.nodes.len() - 1) as f32
    }

    pub fn nodes(&self) -> &[RoadNode] {
        &self.nodes
    }
}

/// Parcels currently on board a cab. Capacity and membership invariants are
/// enforced fatally; assignment pre-checks `has_space` so a violation here
/// is a bookkeeping bug, not load.
#[derive(Component, Debug)]
pub struct CargoHold {
    capacity: usize,
    parcels: Vec<Entity>,
}

impl CargoHold {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            parcels: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.parcels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parcels.is_empty()
    }

    pub fn has_space(&self) -> bool {
        self.parcels.len() < self.capacity
    }

    pub fn parcels(&self) -> &[Entity] {
        &self.parcels
    }

    pub fn load(&mut self, parcel: Entity) {
        assert!(
            self.parcels.len() < self.capacity,
            "hold over capacity loading {:?}: {:?} already held (capacity {})",
            parcel,
            self.parcels,
            self.capacity
        );
        assert!(
            !self.parcels.contains(&parcel),
            "hold already carries {:?}: {:?}",
            parcel,
            self.parcels
        );
        self.parcels.push(parcel);
    }

    pub fn unload(&mut self, parcel: Entity) {
        match self.parcels.iter().position(|&p| p == parcel) {
            Some(idx) => {
                self.parcels.remove(idx);
            }
            None => panic!(
                "unloading {:?} not in hold: {:?}",
                parcel, self.parcels
            ),
        }
    }
}

/// Spawner bookkeeping for the cab population.
#[derive(Resource, Debug)]
pub struct CabTrafficState {
    next_cab_id: u32,
    /// Spawner top-up switch; tests turn this off to hand-place cabs.
    pub auto_spawn: bool,
    /// Cabs spawned since simulation start.
    pub spawned: u64,
    /// Cabs that finished their route and despawned.
    pub completed: u64,
}

impl Default for CabTrafficState {
    fn default() -> Self {
        Self {
            next_cab_id: 0,
            auto_spawn: true,
            spawned: 0,
            completed: 0,
        }
    }
}

impl CabTrafficState {
    pub fn allocate_id(&mut self) -> CabId {
        let id = CabId(self.next_cab_id);
        self.next_cab_id += 1;
        id
    }
}
