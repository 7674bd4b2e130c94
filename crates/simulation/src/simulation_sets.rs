//! Deterministic simulation ordering via `SystemSet` phases.
//!
//! These sets establish a **contract** for system execution order within the
//! `FixedUpdate` schedule.  Plugins place their systems into the appropriate
//! set so that inter-plugin ordering is explicit and testable rather than
//! relying on implicit timing assumptions.
//!
//! # FixedUpdate phases (`SimulationSet`)
//!
//! ```text
//! PreSim  →  Simulation  →  PostSim
//! ```
//!
//! * **PreSim** – Tick counter and cab traffic: the road world advances one
//!   time unit before any logistics logic reads it.
//! * **Simulation** – The delivery pipeline proper, internally chained:
//!   cab arrival detection, then depot dispatch evaluation, then drone
//!   kinematics.  A parcel dropped at a depot this tick is therefore visible
//!   to the dispatch decision in the same tick, and a freshly launched drone
//!   flies its first step in the same tick.
//! * **PostSim** – Request admission, the assignment queue drain, and stats
//!   aggregation.  New parcels enter the world only after all in-flight
//!   state has settled, so an admitted parcel can never be dispatched in
//!   the tick it was created.
//!
//! Systems within one phase that touch the same holder sets (depot
//! `received`, cab holds, drone cargo) carry explicit `.chain()` / `.after()`
//! constraints in their plugins; order between phases needs none.

use bevy::prelude::*;

/// Ordered phases for systems running in the `FixedUpdate` schedule.
///
/// Configured as a chain: `PreSim` → `Simulation` → `PostSim`.
/// Individual plugins use `.in_set(SimulationSet::X)` when registering their
/// systems, which gives them automatic ordering relative to other phases
/// while retaining the ability to add fine-grained `.after()` / `.before()`
/// constraints within the same phase.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Pre-simulation: tick counter, cab traffic stepping and respawn.
    PreSim,
    /// Core logistics: cab arrivals → depot dispatch → drone flight.
    Simulation,
    /// Post-simulation: request admission, assignment retries, stats.
    PostSim,
}
