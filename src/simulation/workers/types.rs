//! Worker types: castes, behavioral states, and the worker struct

use serde::{Deserialize, Serialize};

use crate::pathfind::PathCache;
use crate::simulation::agent::AgentBody;
use crate::simulation::params::SimulationParams;
use crate::simulation::types::{BroodId, Carried, CellCoord, WorkerId};

/// Behavioral role fixed at hatch for the worker's whole life
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Caste {
    Forager,
    Digger,
    Nurse,
    Guard,
    Male,
}

/// Colony chamber functions a worker can excavate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChamberKind {
    FoodStore,
    Nursery,
    Rest,
}

/// What a worker is currently doing
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum WorkerState {
    /// Short wait, then a caste-appropriate dispatch
    Idle,
    /// Generic fallback: a few random steps, then idle
    Wander { remaining: u32 },
    /// Heading for the rest chamber (or the deep fallback point)
    GoRest,
    /// Regenerating energy until full
    Sleep,
    /// Forager climbing toward the surface
    AscendToSurface,
    /// Forager scanning the surface for food sources
    SearchFood,
    /// Forager hauling a food unit back to storage
    ReturnFood,
    /// Digger carving free exploratory tunnels
    ExploreDig,
    /// Digger or nurse carving a chamber footprint
    BuildChamber { kind: ChamberKind },
    /// Nurse hauling a brood item back toward the nursery
    TransportBrood { brood: BroodId },
    /// Nurse holding position next to the nearest brood
    TendBrood,
    /// Nurse feeding a larva on a timer
    FeedLarva,
    /// Guard oscillating near the entrance
    Patrol,
    /// Guard holding position at the first brood item
    GuardBrood,
    /// Male climbing toward the surface
    AscendMale,
    /// Male drifting along the surface
    SurfaceWander,
}

impl WorkerState {
    /// States that mostly travel; these get stuck detection and the
    /// forced wander reset.
    pub fn is_travel(&self) -> bool {
        matches!(
            self,
            WorkerState::AscendToSurface
                | WorkerState::ReturnFood
                | WorkerState::GoRest
                | WorkerState::TransportBrood { .. }
                | WorkerState::Patrol
                | WorkerState::AscendMale
        )
    }
}

/// One worker ant
#[derive(Clone, Debug)]
pub struct Worker {
    pub id: WorkerId,
    pub body: AgentBody,
    pub caste: Caste,
    pub state: WorkerState,
    /// Fatigue gauge 0-100; low values force a rest detour
    pub energy: f32,
    pub carried: Carried,
    pub path_cache: PathCache,
    pub state_timer: f32,
    pub last_cell: CellCoord,
    pub stuck_ticks: u32,
    pub stall_strikes: u32,
    /// Exploratory digging bookkeeping
    pub dig_quota: u32,
    pub dig_dir: i32,
    /// Patrol oscillation direction
    pub patrol_dir: i32,
}

impl Worker {
    /// Hatch a worker at a cell with its permanent caste
    pub fn new(id: WorkerId, cell: CellCoord, caste: Caste, params: &SimulationParams) -> Self {
        Worker {
            id,
            body: AgentBody::at_cell(cell, params.worker_speed, params.dig_duration),
            caste,
            state: WorkerState::Idle,
            energy: 100.0,
            carried: Carried::None,
            path_cache: PathCache::new(),
            state_timer: 0.0,
            last_cell: cell,
            stuck_ticks: 0,
            stall_strikes: 0,
            dig_quota: 0,
            dig_dir: 1,
            patrol_dir: 1,
        }
    }

    pub fn is_carrying(&self) -> bool {
        !self.carried.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_travel_state_classification() {
        assert!(WorkerState::AscendToSurface.is_travel());
        assert!(WorkerState::TransportBrood { brood: BroodId(0) }.is_travel());
        assert!(!WorkerState::Idle.is_travel());
        assert!(!WorkerState::Sleep.is_travel());
        assert!(!WorkerState::FeedLarva.is_travel());
    }

    #[test]
    fn test_new_worker_defaults() {
        let params = SimulationParams::default();
        let worker = Worker::new(WorkerId(3), CellCoord::new(5, 12), Caste::Nurse, &params);
        assert_eq!(worker.state, WorkerState::Idle);
        assert_eq!(worker.energy, 100.0);
        assert!(!worker.is_carrying());
    }
}
