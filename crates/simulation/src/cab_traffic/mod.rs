//! Cab traffic on the road network.
//!
//! Cabs are the road-vehicle collaborator of the delivery pipeline: they
//! drive A* routes between random nodes and, when assigned, haul parcels
//! from the warehouse to pickup depots along the way.
//!
//! Key behaviors:
//! - A spawner keeps the cab population topped up; a tunable share of
//!   routes is threaded through the warehouse road edge so warehouse-bound
//!   cabs exist for assignment to find
//! - Cabs advance along their route at a fixed fraction of a cell per tick,
//!   so the current road edge never skips an edge of the route
//! - A cab finishing its route lingers one tick (arrival detection sees the
//!   final edge) and despawns only with an empty hold
//! - Holds enforce capacity and double-insertion invariants fatally
//! - Paint is cosmetic: hauling cabs are repainted, free cabs painted back

mod constants;
mod plugin;
mod systems;
mod types;

#[cfg(test)]
mod tests;

pub use constants::{CAB_CAPACITY, CAB_SPEED_CELLS_PER_TICK, MAX_CABS};
pub use plugin::CabTrafficPlugin;
pub use systems::{spawn_cabs, step_cab_traffic};
pub use types::{Cab, CabId, CabPaint, CabRoute, CabTrafficState, CargoHold};
