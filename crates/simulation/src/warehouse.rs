//! The central warehouse all parcels originate from.

use bevy::prelude::*;

use crate::road_network::EdgeId;

/// Singleton warehouse resource, placed by world init. `nearest_edge` is the
/// road edge cabs must have on their route to count as warehouse-bound.
#[derive(Resource, Debug, Clone, Copy)]
pub struct Warehouse {
    pub center: Vec2,
    pub nearest_edge: EdgeId,
}

/// Placeholder at the origin so systems can inject `Res<Warehouse>` before
/// world generation (or a test harness) installs the real layout.
impl Default for Warehouse {
    fn default() -> Self {
        Self {
            center: Vec2::ZERO,
            nearest_edge: EdgeId(0),
        }
    }
}
