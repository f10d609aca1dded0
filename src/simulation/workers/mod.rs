//! Worker ants: types, per-state behavior, chamber construction, and
//! caste assignment at hatch.

pub mod behavior;
pub mod construction;
pub mod types;

use rand::Rng;

use crate::simulation::params::SimulationParams;

pub use behavior::{process_worker, sync_carried_brood, WorkerContext};
pub use types::{Caste, ChamberKind, Worker, WorkerState};

/// Pick a caste for a hatching brood item.
///
/// First-generation brood only ever hatches into foragers or nurses.
/// Ordinary brood draws from the weighted caste distribution, with a
/// small male chance once the colony is mature and large enough.
pub fn assign_caste<R: Rng>(
    first_generation: bool,
    mature: bool,
    population: usize,
    params: &SimulationParams,
    rng: &mut R,
) -> Caste {
    if first_generation {
        return if rng.gen_bool(0.5) {
            Caste::Forager
        } else {
            Caste::Nurse
        };
    }

    if mature && population >= params.male_min_population && rng.gen_bool(params.male_chance) {
        return Caste::Male;
    }

    let total =
        params.forager_weight + params.digger_weight + params.nurse_weight + params.guard_weight;
    let mut roll = rng.gen::<f32>() * total;
    for (caste, weight) in [
        (Caste::Forager, params.forager_weight),
        (Caste::Digger, params.digger_weight),
        (Caste::Nurse, params.nurse_weight),
        (Caste::Guard, params.guard_weight),
    ] {
        if roll < weight {
            return caste;
        }
        roll -= weight;
    }
    Caste::Forager
}
