//! Read-only per-tick snapshots for the renderer, audio, and UI.
//!
//! External collaborators consume these views after each tick and push
//! their mutations back through the command queue. Capturing a snapshot
//! is also the moment the dirty-cell list changes hands.

use serde::Serialize;

use crate::grid::CellKind;
use crate::simulation::colony::BroodStage;
use crate::simulation::founder::FounderState;
use crate::simulation::types::{Carried, CellCoord, WorkerId};
use crate::simulation::workers::{Caste, WorkerState};
use crate::simulation::world::{SimulationStats, SimulationWorld};

/// Founder view
#[derive(Clone, Copy, Debug, Serialize)]
pub struct FounderView {
    pub state: FounderState,
    pub x: f32,
    pub y: f32,
    pub cell: CellCoord,
    pub has_wings: bool,
    pub wing_energy: f32,
    pub facing_left: bool,
}

/// Per-worker view
#[derive(Clone, Copy, Debug, Serialize)]
pub struct WorkerView {
    pub id: WorkerId,
    pub caste: Caste,
    pub state: WorkerState,
    pub x: f32,
    pub y: f32,
    pub cell: CellCoord,
    pub energy: f32,
    pub carrying: Carried,
    pub facing_left: bool,
}

/// Per-brood view
#[derive(Clone, Copy, Debug, Serialize)]
pub struct BroodView {
    pub x: f32,
    pub y: f32,
    pub stage: BroodStage,
    pub first_generation: bool,
}

/// Colony aggregates
#[derive(Clone, Debug, Serialize)]
pub struct ColonyView {
    pub food: f32,
    pub deliveries: u32,
    pub nanitics_hatched: u32,
    pub food_chamber: Option<CellCoord>,
    pub nursery: Option<CellCoord>,
    pub rest_chamber: Option<CellCoord>,
    pub stored_markers: Vec<CellCoord>,
    pub seal: Option<CellCoord>,
}

/// Everything an external consumer may read after a tick
#[derive(Clone, Debug, Serialize)]
pub struct WorldSnapshot<'a> {
    pub tick: u64,
    pub cols: usize,
    pub rows: usize,
    pub surface_row: usize,
    pub cells: &'a [CellKind],
    pub noise: &'a [f32],
    /// Cells whose kind changed since the last snapshot; taking the
    /// snapshot clears the grid's list
    pub dirty: Vec<CellCoord>,
    pub empty_underground: usize,
    pub founder: FounderView,
    pub workers: Vec<WorkerView>,
    pub brood: Vec<BroodView>,
    pub colony: ColonyView,
    pub stats: SimulationStats,
}

impl<'a> WorldSnapshot<'a> {
    pub fn capture(world: &'a mut SimulationWorld) -> Self {
        let dirty = world.grid.take_dirty();
        let founder = FounderView {
            state: world.founder.state,
            x: world.founder.body.x,
            y: world.founder.body.y,
            cell: world.founder.body.cell,
            has_wings: world.founder.has_wings,
            wing_energy: world.founder.wing_energy,
            facing_left: world.founder.body.facing_left,
        };
        let workers = world
            .workers
            .iter()
            .map(|w| WorkerView {
                id: w.id,
                caste: w.caste,
                state: w.state,
                x: w.body.x,
                y: w.body.y,
                cell: w.body.cell,
                energy: w.energy,
                carrying: w.carried,
                facing_left: w.body.facing_left,
            })
            .collect();
        let brood = world
            .colony
            .brood
            .iter()
            .map(|b| BroodView {
                x: b.x,
                y: b.y,
                stage: b.stage(),
                first_generation: b.first_generation,
            })
            .collect();
        let colony = ColonyView {
            food: world.colony.food,
            deliveries: world.colony.deliveries,
            nanitics_hatched: world.colony.nanitics_hatched,
            food_chamber: world.colony.food_chamber,
            nursery: world.colony.nursery,
            rest_chamber: world.colony.rest_chamber,
            stored_markers: world.colony.stored_markers.clone(),
            seal: world.founder.seal,
        };

        WorldSnapshot {
            tick: world.tick_count,
            cols: world.grid.cols,
            rows: world.grid.rows,
            surface_row: world.grid.surface_row,
            cells: world.grid.cells(),
            noise: world.grid.noise_values(),
            dirty,
            empty_underground: world.grid.count_empty(),
            founder,
            workers,
            brood,
            colony,
            stats: world.stats,
        }
    }
}
