//! Simulation world and tick loop.
//!
//! Owns the grid, the colony, the founder, and the worker roster, and
//! advances them through a single `tick` entry point. External callers
//! mutate the world only through the command queue; everything else they
//! see is a read-only snapshot.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::simulation::colony::Colony;
use crate::simulation::founder::{Founder, FounderState};
use crate::simulation::params::SimulationParams;
use crate::simulation::snapshot::WorldSnapshot;
use crate::simulation::types::{CellCoord, Command, SpeedFactor, WorkerId, CELL_SIZE};
use crate::simulation::workers::{self, Worker, WorkerContext};

/// Statistics tracked across the run
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct SimulationStats {
    pub population: usize,
    pub peak_population: usize,
    pub eggs_laid: u32,
    pub workers_hatched: u32,
    pub deliveries: u32,
    pub cells_dug: u64,
}

/// The whole mutable simulation state
#[derive(Clone, Debug)]
pub struct SimulationWorld {
    pub grid: Grid,
    pub colony: Colony,
    pub founder: Founder,
    pub workers: Vec<Worker>,
    pub params: SimulationParams,
    pub speed: SpeedFactor,
    pub paused: bool,
    pub tick_count: u64,
    pub stats: SimulationStats,
    commands: Vec<Command>,
    next_worker_id: u32,
    rng: ChaCha8Rng,
    pub seed: u64,
}

impl SimulationWorld {
    /// Build a world: generate terrain from the seed and land the
    /// founding queen in the middle of the surface.
    pub fn new(cols: usize, rows: usize, seed: u64, params: SimulationParams) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let grid = Grid::generate(cols, rows, seed as u32, &mut rng);
        let start = CellCoord::new(cols as i32 / 2, grid.surface_row as i32);
        let founder = Founder::new(start, &params);

        SimulationWorld {
            grid,
            colony: Colony::new(),
            founder,
            workers: Vec::new(),
            params,
            speed: SpeedFactor::X1,
            paused: false,
            tick_count: 0,
            stats: SimulationStats::default(),
            commands: Vec::new(),
            next_worker_id: 0,
            rng,
            seed,
        }
    }

    /// Queue a command for the start of the next tick
    pub fn push_command(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn population(&self) -> usize {
        self.workers.len()
    }

    /// Advance the simulation by one tick.
    ///
    /// Order is fixed: drain commands, then the founder thinks, then
    /// every worker in roster order, then brood advances and hatches.
    /// No agent acts more than once per tick. Pausing freezes timers and
    /// in-flight actions without discarding anything.
    pub fn tick(&mut self, dt: f32) {
        self.apply_commands();
        if self.paused {
            return;
        }
        let dt = dt.min(self.params.max_dt) * self.speed.multiplier();

        // Founder
        self.founder.update(&mut self.grid, &self.params, dt);
        if !self.founder.body.busy() {
            let population = self.workers.len();
            self.founder.think(
                &mut self.grid,
                &mut self.colony,
                population,
                &self.params,
                &mut self.rng,
            );
        }

        // Workers, in population order
        let ctx = self.worker_context();
        for i in 0..self.workers.len() {
            let worker = &mut self.workers[i];
            worker.body.update(&mut self.grid, dt);
            workers::sync_carried_brood(worker, &mut self.colony);
            if !worker.body.busy() {
                workers::process_worker(
                    worker,
                    &mut self.grid,
                    &mut self.colony,
                    ctx,
                    &self.params,
                    &mut self.rng,
                    dt,
                );
            }
        }

        // Brood: advance timers and retire hatched items into workers
        let hatched = self.colony.advance_brood(dt);
        for brood in hatched {
            let mature = self.founder.state == FounderState::Mature;
            let caste = workers::assign_caste(
                brood.first_generation,
                mature,
                self.workers.len(),
                &self.params,
                &mut self.rng,
            );
            let id = WorkerId(self.next_worker_id);
            self.next_worker_id += 1;
            let cell = brood.cell();
            self.workers.push(Worker::new(id, cell, caste, &self.params));
            self.stats.workers_hatched += 1;

            if brood.first_generation {
                self.colony.nanitics_hatched += 1;
                self.founder.notify_nanitic_hatched(
                    &mut self.grid,
                    self.colony.nanitics_hatched,
                    &self.params,
                );
            }
        }

        self.tick_count += 1;
        self.update_stats();
    }

    fn worker_context(&self) -> WorkerContext {
        let surface = self.grid.surface_row as i32;
        let fallback = CellCoord::new(self.grid.cols as i32 / 2, surface);
        WorkerContext {
            entrance: self.founder.entrance.unwrap_or(fallback),
            nest: self.founder.nest.unwrap_or(fallback),
            mature: self.founder.state == FounderState::Mature,
        }
    }

    fn apply_commands(&mut self) {
        let commands = std::mem::take(&mut self.commands);
        for command in commands {
            match command {
                Command::PlaceFood { x, y, amount } => {
                    if amount == 0 {
                        continue;
                    }
                    let max_x = self.grid.cols as f32 * CELL_SIZE;
                    let max_y = self.grid.rows as f32 * CELL_SIZE;
                    self.colony.food_sources.push(crate::simulation::colony::FoodSource {
                        x: x.clamp(0.0, max_x - 1.0),
                        y: y.clamp(0.0, max_y - 1.0),
                        amount,
                    });
                }
                Command::SetSpeed(speed) => self.speed = speed,
                Command::SetPaused(paused) => self.paused = paused,
                Command::Resize { cols, rows } => self.resize(cols, rows),
            }
        }
    }

    /// Regenerate the grid at a new size and migrate everything across.
    ///
    /// Dug tunnels shift with the surface row (see `Grid::resized`);
    /// agent, chamber, brood and food coordinates shift the same way and
    /// are clamped into bounds. Best-effort: tunnel connectivity after
    /// extreme resizes is not guaranteed.
    fn resize(&mut self, cols: usize, rows: usize) {
        if cols < 8 || rows < 8 {
            return;
        }
        let next = self.grid.resized(cols, rows, &mut self.rng);
        let offset = self.grid.migration_offset(&next);
        self.grid = next;

        let clamp = |cell: CellCoord, grid: &Grid| -> CellCoord {
            CellCoord::new(
                cell.col.clamp(0, grid.cols as i32 - 1),
                (cell.row + offset).clamp(0, grid.rows as i32 - 1),
            )
        };

        self.founder.entrance = self.founder.entrance.map(|c| clamp(c, &self.grid));
        self.founder.nest = self.founder.nest.map(|c| clamp(c, &self.grid));
        self.founder.seal = self.founder.seal.map(|c| clamp(c, &self.grid));
        self.colony.food_chamber = self.colony.food_chamber.map(|c| clamp(c, &self.grid));
        self.colony.nursery = self.colony.nursery.map(|c| clamp(c, &self.grid));
        self.colony.rest_chamber = self.colony.rest_chamber.map(|c| clamp(c, &self.grid));
        for marker in &mut self.colony.stored_markers {
            *marker = clamp(*marker, &self.grid);
        }

        let founder_cell = clamp(self.founder.body.cell, &self.grid);
        self.founder.body.snap_to(founder_cell);
        for worker in &mut self.workers {
            let cell = clamp(worker.body.cell, &self.grid);
            worker.body.snap_to(cell);
            worker.path_cache.invalidate();
        }

        let shift = offset as f32 * CELL_SIZE;
        let max_x = self.grid.cols as f32 * CELL_SIZE - 1.0;
        let max_y = self.grid.rows as f32 * CELL_SIZE - 1.0;
        for brood in &mut self.colony.brood {
            brood.x = brood.x.clamp(0.0, max_x);
            brood.y = (brood.y + shift).clamp(0.0, max_y);
        }
        for source in &mut self.colony.food_sources {
            source.x = source.x.clamp(0.0, max_x);
            source.y = (source.y + shift).clamp(0.0, max_y);
        }
    }

    fn update_stats(&mut self) {
        self.stats.population = self.workers.len();
        self.stats.peak_population = self.stats.peak_population.max(self.workers.len());
        self.stats.eggs_laid = self.colony.eggs_laid_total();
        self.stats.deliveries = self.colony.deliveries;
        self.stats.cells_dug = self.grid.dug_total();
    }

    /// Take the per-tick snapshot for the renderer and friends; this
    /// also takes and clears the dirty-cell list.
    pub fn snapshot(&mut self) -> WorldSnapshot<'_> {
        WorldSnapshot::capture(self)
    }
}

/// Drive a world for a number of fixed-dt ticks, reporting progress
pub fn run_headless(world: &mut SimulationWorld, ticks: u64, dt: f32, report_every: u64) {
    for _ in 0..ticks {
        world.tick(dt);
        if report_every > 0 && world.tick_count % report_every == 0 {
            println!(
                "tick {}: founder {:?}, {} workers, {:.1} food, {} deliveries",
                world.tick_count,
                world.founder.state,
                world.workers.len(),
                world.colony.food,
                world.colony.deliveries
            );
        }
    }
}
