//! Delivery request admission and the assignment retry queue.
//!
//! Requests arrive either Poisson-spaced (gaps drawn from the simulation
//! RNG, destinations drawn uniformly from the residence registry) or as
//! scripted fixed-tick batches with explicit destinations. Every admitted
//! parcel lands in the FIFO [`AssignmentQueue`]; the assignment drain picks
//! it up in the same tick's PostSim phase.

use std::collections::VecDeque;

use bevy::prelude::*;

use crate::parcels::{create_parcel, ParcelIds};
use crate::sim_rng::{poisson, SimRng};
use crate::world_init::ResidenceRegistry;
use crate::TickCounter;

/// Mean Poisson gap between consecutive requests, in ticks.
pub const MEAN_REQUEST_INTERVAL_TICKS: f64 = 2.0;

/// Requests admitted over a default run.
pub const MAX_REQUESTS: u32 = 1000;

/// How parcel requests arrive.
#[derive(Resource, Debug, Clone)]
pub enum RequestPlan {
    /// Poisson-spaced arrivals with random residence destinations, capped
    /// at `max_requests`. A zero gap admits several parcels in one tick.
    Poisson { mean: f64, max_requests: u32 },
    /// Explicit batches at fixed ticks, for tests and demo runs.
    Scripted { batches: Vec<ScriptedBatch> },
}

#[derive(Debug, Clone)]
pub struct ScriptedBatch {
    pub tick: u64,
    pub destinations: Vec<Vec2>,
}

impl Default for RequestPlan {
    fn default() -> Self {
        Self::Poisson {
            mean: MEAN_REQUEST_INTERVAL_TICKS,
            max_requests: MAX_REQUESTS,
        }
    }
}

/// Admission bookkeeping carried across ticks.
#[derive(Resource, Debug, Default)]
pub struct RequestState {
    /// Tick the next Poisson request falls due; `None` until the opening
    /// gap has been drawn.
    next_request_tick: Option<u64>,
    /// Requests admitted so far, across both plans.
    pub requested: u32,
}

/// FIFO retry queue of parcels awaiting depot-and-cab assignment.
#[derive(Resource, Debug, Default)]
pub struct AssignmentQueue(pub VecDeque<Entity>);

/// Admit this tick's parcel requests per the active [`RequestPlan`].
pub fn admit_requests(
    mut commands: Commands,
    tick: Res<TickCounter>,
    plan: Res<RequestPlan>,
    mut state: ResMut<RequestState>,
    mut rng: ResMut<SimRng>,
    mut ids: ResMut<ParcelIds>,
    mut queue: ResMut<AssignmentQueue>,
    residences: Res<ResidenceRegistry>,
) {
    match &*plan {
        RequestPlan::Poisson { mean, max_requests } => {
            if residences.is_empty() {
                return;
            }
            let mut next = match state.next_request_tick {
                Some(t) => t,
                None => tick.0 + poisson(&mut rng.0, *mean),
            };
            while state.requested < *max_requests && next <= tick.0 {
                let destination = residences.random_destination(&mut rng.0);
                admit(&mut commands, &mut ids, &mut queue, &mut state, destination);
                next += poisson(&mut rng.0, *mean);
            }
            state.next_request_tick = Some(next);
        }
        RequestPlan::Scripted { batches } => {
            for batch in batches {
                if batch.tick != tick.0 {
                    continue;
                }
                for &destination in &batch.destinations {
                    admit(&mut commands, &mut ids, &mut queue, &mut state, destination);
                }
            }
        }
    }
}

fn admit(
    commands: &mut Commands,
    ids: &mut ParcelIds,
    queue: &mut AssignmentQueue,
    state: &mut RequestState,
    destination: Vec2,
) {
    let entity = create_parcel(commands, ids, destination);
    queue.0.push_back(entity);
    state.requested += 1;
    debug!("delivery request for {:?} admitted", destination);
}

pub struct RequestsPlugin;

impl Plugin for RequestsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RequestPlan>()
            .init_resource::<RequestState>()
            .init_resource::<AssignmentQueue>()
            .add_systems(
                FixedUpdate,
                admit_requests.in_set(crate::SimulationSet::PostSim),
            );
    }
}
