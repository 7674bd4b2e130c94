//! Plugin registration for cab traffic.

use bevy::prelude::*;

use super::systems::{spawn_cabs, step_cab_traffic};
use super::types::CabTrafficState;

pub struct CabTrafficPlugin;

impl Plugin for CabTrafficPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CabTrafficState>().add_systems(
            FixedUpdate,
            (spawn_cabs, step_cab_traffic)
                .chain()
                .after(crate::advance_tick)
                .in_set(crate::SimulationSet::PreSim),
        );
    }
}
