//! Tunables for the cab traffic collaborator.

/// Target number of cabs kept alive on the network.
pub const MAX_CABS: usize = 24;

/// Parcels a cab can haul concurrently.
pub const CAB_CAPACITY: usize = 2;

/// Route advance per tick, in grid cells. Must stay ≤ 1.0 so the current
/// edge index moves at most one step per tick and arrival detection can
/// never hop over a depot's edge.
pub const CAB_SPEED_CELLS_PER_TICK: f32 = 0.5;

/// Ticks between spawner top-up passes.
pub const SPAWN_INTERVAL_TICKS: u64 = 4;

/// Probability that a freshly spawned cab's route is threaded through the
/// warehouse road edge.
pub const WAREHOUSE_ROUTE_SHARE: f64 = 0.5;
