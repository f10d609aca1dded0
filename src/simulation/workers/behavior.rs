//! Worker state machines.
//!
//! One think per worker per tick, dispatched by state. Every "move
//! toward X" call site falls back to a random walk, and travel states
//! carry stuck detection, so no worker is ever wedged for good.

use rand::Rng;

use crate::grid::Grid;
use crate::simulation::colony::{BroodStage, Colony};
use crate::simulation::params::SimulationParams;
use crate::simulation::types::{BroodId, Carried, CellCoord, CELL_SIZE};
use crate::simulation::workers::construction;
use crate::simulation::workers::types::{Caste, ChamberKind, Worker, WorkerState};

/// Chance per think to give up an empty surface search
const SEARCH_GIVE_UP_CHANCE: f64 = 0.02;
/// Chance per think to pause during surface wandering
const SURFACE_PAUSE_CHANCE: f64 = 0.35;

/// Read-only facts a worker think needs about the rest of the colony
#[derive(Clone, Copy, Debug)]
pub struct WorkerContext {
    pub entrance: CellCoord,
    pub nest: CellCoord,
    pub mature: bool,
}

/// One thinking step for a worker; the tick driver calls this only
/// while no move or dig is in flight.
pub fn process_worker<R: Rng>(
    worker: &mut Worker,
    grid: &mut Grid,
    colony: &mut Colony,
    ctx: WorkerContext,
    params: &SimulationParams,
    rng: &mut R,
    dt: f32,
) {
    validate_carried(worker, colony);
    if track_stuck(worker, grid, params, rng) {
        return;
    }

    match worker.state {
        WorkerState::Idle => process_idle(worker, colony, ctx, params, rng, dt),
        WorkerState::Wander { remaining } => process_wander(worker, grid, remaining, params, rng),
        WorkerState::GoRest => process_go_rest(worker, grid, colony, ctx, params, rng),
        WorkerState::Sleep => process_sleep(worker, params, dt),
        WorkerState::AscendToSurface => process_ascend(worker, grid, ctx, params, rng, false),
        WorkerState::SearchFood => process_search_food(worker, grid, colony, params, rng),
        WorkerState::ReturnFood => process_return_food(worker, grid, colony, ctx, params, rng),
        WorkerState::ExploreDig => process_explore_dig(worker, grid, params, rng),
        WorkerState::BuildChamber { kind } => {
            process_build_chamber(worker, grid, colony, ctx, kind, params, rng)
        }
        WorkerState::TransportBrood { brood } => {
            process_transport_brood(worker, grid, colony, brood, params, rng)
        }
        WorkerState::TendBrood => process_tend_brood(worker, grid, colony, params, rng, dt),
        WorkerState::FeedLarva => process_feed_larva(worker, colony, params, dt),
        WorkerState::Patrol => process_patrol(worker, grid, ctx, params, rng, dt),
        WorkerState::GuardBrood => process_guard_brood(worker, grid, colony, params, rng, dt),
        WorkerState::AscendMale => process_ascend(worker, grid, ctx, params, rng, true),
        WorkerState::SurfaceWander => process_surface_wander(worker, grid, params, rng),
    }
}

/// Keep a carried brood item riding along with its carrier
pub fn sync_carried_brood(worker: &Worker, colony: &mut Colony) {
    if let Carried::Brood(id) = worker.carried {
        if let Some(brood) = colony.brood_get_mut(id) {
            brood.x = worker.body.x;
            brood.y = worker.body.y;
        }
    }
}

/// Drop payload references that no longer resolve (the brood hatched
/// while being carried).
fn validate_carried(worker: &mut Worker, colony: &Colony) {
    if let Carried::Brood(id) = worker.carried {
        if colony.brood_get(id).is_none() {
            worker.carried = Carried::None;
            if matches!(worker.state, WorkerState::TransportBrood { .. }) {
                worker.state = WorkerState::Idle;
            }
        }
    }
}

/// Stuck detection for travel states: invalidate the path cache, try to
/// dig an escape hole, fall back to a random step, and eventually force
/// a reset to plain wandering. Returns true when an escape action
/// consumed this think.
fn track_stuck<R: Rng>(
    worker: &mut Worker,
    grid: &mut Grid,
    params: &SimulationParams,
    rng: &mut R,
) -> bool {
    if !worker.state.is_travel() {
        worker.stuck_ticks = 0;
        worker.last_cell = worker.body.cell;
        return false;
    }

    if worker.body.cell == worker.last_cell {
        worker.stuck_ticks += 1;
    } else {
        worker.stuck_ticks = 0;
        worker.last_cell = worker.body.cell;
    }

    if worker.stuck_ticks <= params.stuck_threshold {
        return false;
    }

    worker.stuck_ticks = 0;
    worker.stall_strikes += 1;
    worker.path_cache.invalidate();

    if worker.stall_strikes >= params.stall_strike_limit
        && matches!(
            worker.state,
            WorkerState::AscendToSurface | WorkerState::Patrol | WorkerState::AscendMale
        )
    {
        worker.stall_strikes = 0;
        worker.state = WorkerState::Wander {
            remaining: rng.gen_range(params.wander_steps_min..=params.wander_steps_max),
        };
        return false;
    }

    if escape_dig(worker, grid, rng) {
        return true;
    }
    random_walk(worker, grid, params, rng)
}

fn process_idle<R: Rng>(
    worker: &mut Worker,
    colony: &Colony,
    ctx: WorkerContext,
    params: &SimulationParams,
    rng: &mut R,
    dt: f32,
) {
    worker.state_timer -= dt;
    if worker.state_timer > 0.0 {
        return;
    }
    worker.state_timer = rng.gen_range(params.idle_wait_min..params.idle_wait_max);
    worker.stall_strikes = 0;

    // Tired workers take a rest detour before anything else
    if worker.energy < params.low_energy_threshold {
        worker.state = WorkerState::GoRest;
        return;
    }

    match worker.caste {
        Caste::Forager => {
            worker.state = if worker.is_carrying() {
                WorkerState::ReturnFood
            } else {
                WorkerState::AscendToSurface
            };
        }
        Caste::Digger => {
            if ctx.mature && colony.food_chamber.is_none() {
                worker.state = WorkerState::BuildChamber { kind: ChamberKind::FoodStore };
            } else if colony.nursery.is_some() && colony.rest_chamber.is_none() {
                worker.state = WorkerState::BuildChamber { kind: ChamberKind::Rest };
            } else {
                worker.dig_quota = rng.gen_range(params.dig_quota_min..=params.dig_quota_max);
                worker.dig_dir = if rng.gen_bool(0.5) { 1 } else { -1 };
                worker.state = WorkerState::ExploreDig;
            }
        }
        Caste::Nurse => {
            if colony.nursery.is_none() && colony.food_chamber.is_some() {
                worker.state = WorkerState::BuildChamber { kind: ChamberKind::Nursery };
            } else if !colony.brood.is_empty() {
                worker.state = WorkerState::TendBrood;
                worker.state_timer = params.tend_duration;
            } else {
                worker.state = WorkerState::Wander {
                    remaining: rng.gen_range(params.wander_steps_min..=params.wander_steps_max),
                };
            }
        }
        Caste::Guard => {
            if !colony.brood.is_empty() && rng.gen_bool(params.guard_brood_chance) {
                worker.state = WorkerState::GuardBrood;
                worker.state_timer = rng.gen_range(params.guard_dwell_min..params.guard_dwell_max);
            } else {
                worker.patrol_dir = if rng.gen_bool(0.5) { 1 } else { -1 };
                worker.state = WorkerState::Patrol;
                worker.state_timer = rng.gen_range(4.0..8.0);
            }
        }
        Caste::Male => {
            worker.state = WorkerState::AscendMale;
        }
    }
}

fn process_wander<R: Rng>(
    worker: &mut Worker,
    grid: &mut Grid,
    remaining: u32,
    params: &SimulationParams,
    rng: &mut R,
) {
    if remaining == 0 {
        worker.state = WorkerState::Idle;
        return;
    }
    random_walk(worker, grid, params, rng);
    worker.state = WorkerState::Wander { remaining: remaining - 1 };
}

fn process_go_rest<R: Rng>(
    worker: &mut Worker,
    grid: &mut Grid,
    colony: &Colony,
    ctx: WorkerContext,
    params: &SimulationParams,
    rng: &mut R,
) {
    // The nest chamber is the deep fallback before a rest chamber exists
    let target = colony.rest_chamber.unwrap_or(ctx.nest);
    if approach(worker, grid, target, params, rng) {
        worker.state = WorkerState::Sleep;
    }
}

fn process_sleep(worker: &mut Worker, params: &SimulationParams, dt: f32) {
    worker.energy += params.rest_regen_rate * dt;
    if worker.energy >= 100.0 {
        worker.energy = 100.0;
        worker.state = WorkerState::Idle;
    }
}

/// Shared climb-to-surface logic for foragers and males
fn process_ascend<R: Rng>(
    worker: &mut Worker,
    grid: &mut Grid,
    ctx: WorkerContext,
    params: &SimulationParams,
    rng: &mut R,
    male: bool,
) {
    if worker.body.cell.row <= grid.surface_row as i32 {
        worker.state = if male {
            WorkerState::SurfaceWander
        } else {
            WorkerState::SearchFood
        };
        return;
    }

    let target = CellCoord::new(ctx.entrance.col, grid.surface_row as i32);
    let start = worker.body.cell;
    if let Some(step) = worker.path_cache.next_step(grid, start, target) {
        if worker.body.move_to(grid, step.col, step.row) {
            charge_step(worker, params);
            return;
        }
    }

    // No path: climb or dig upward, biased toward the entrance column
    let toward = (ctx.entrance.col - start.col).signum();
    let candidates = [(toward, -1), (0, -1), (toward, 0), (-toward, -1)];
    for (dc, dr) in candidates {
        if dc == 0 && dr == 0 {
            continue;
        }
        let next = start.offset(dc, dr);
        if next.row < grid.surface_row as i32 {
            continue;
        }
        if worker.body.move_to(grid, next.col, next.row) {
            charge_step(worker, params);
            return;
        }
    }
    random_walk(worker, grid, params, rng);
}

fn process_search_food<R: Rng>(
    worker: &mut Worker,
    grid: &mut Grid,
    colony: &mut Colony,
    params: &SimulationParams,
    rng: &mut R,
) {
    if worker.is_carrying() {
        worker.state = WorkerState::ReturnFood;
        return;
    }
    if worker.energy < params.low_energy_threshold {
        worker.state = WorkerState::Idle;
        return;
    }

    let index = match colony.nearest_food_source(worker.body.x) {
        Some(i) => i,
        None => {
            if rng.gen_bool(SEARCH_GIVE_UP_CHANCE) {
                worker.state = WorkerState::Idle;
            } else {
                surface_step(worker, grid, if rng.gen_bool(0.5) { 1 } else { -1 }, params);
            }
            return;
        }
    };

    let source = colony.food_sources[index];
    let dx = source.x - worker.body.x;
    let dy = source.y - worker.body.y;
    if (dx * dx + dy * dy).sqrt() <= params.capture_radius * CELL_SIZE {
        colony.take_food_unit(index);
        worker.carried = Carried::Food(1.0);
        worker.state = WorkerState::ReturnFood;
        return;
    }

    if !surface_step(worker, grid, dx.signum() as i32, params) {
        random_walk(worker, grid, params, rng);
    }
}

fn process_return_food<R: Rng>(
    worker: &mut Worker,
    grid: &mut Grid,
    colony: &mut Colony,
    ctx: WorkerContext,
    params: &SimulationParams,
    rng: &mut R,
) {
    // A built food chamber is preferred over the nest chamber
    let target = colony.food_chamber.unwrap_or(ctx.nest);
    if approach(worker, grid, target, params, rng) {
        if !worker.carried.is_none() {
            colony.deposit_food(params.food_per_delivery, target, params.stored_marker_cap);
        }
        worker.carried = Carried::None;
        worker.state = WorkerState::Idle;
    }
}

fn process_explore_dig<R: Rng>(
    worker: &mut Worker,
    grid: &mut Grid,
    params: &SimulationParams,
    rng: &mut R,
) {
    if worker.dig_quota == 0 {
        worker.state = WorkerState::Idle;
        return;
    }
    if rng.gen_bool(params.explore_reverse_chance) {
        worker.dig_dir = -worker.dig_dir;
    }

    let start = worker.body.cell;
    let dir = worker.dig_dir;
    let candidates = [(dir, 0), (dir, 1), (0, 1), (dir, -1)];
    for (dc, dr) in candidates {
        let next = start.offset(dc, dr);
        let in_band = next.row > grid.surface_row as i32
            && next.row < grid.rows as i32 - crate::grid::BEDROCK_ROWS as i32
            && next.col >= params.grid_margin
            && next.col < grid.cols as i32 - params.grid_margin;
        if in_band && grid.is_diggable(next.col, next.row) {
            if worker.body.move_to(grid, next.col, next.row) {
                worker.dig_quota -= 1;
            }
            return;
        }
    }

    let ahead = start.offset(dir, 0);
    if grid.is_walkable(ahead.col, ahead.row) && worker.body.move_to(grid, ahead.col, ahead.row) {
        charge_step(worker, params);
    } else if !random_walk(worker, grid, params, rng) {
        worker.dig_dir = -worker.dig_dir;
    }
}

fn process_build_chamber<R: Rng>(
    worker: &mut Worker,
    grid: &mut Grid,
    colony: &mut Colony,
    ctx: WorkerContext,
    kind: ChamberKind,
    params: &SimulationParams,
    rng: &mut R,
) {
    if construction::committed(kind, colony).is_some() {
        worker.state = WorkerState::Idle;
        return;
    }
    let center = match construction::chamber_center(kind, ctx.nest, colony) {
        Some(c) => c,
        None => {
            worker.state = WorkerState::Idle;
            return;
        }
    };

    match construction::nearest_diggable(center, worker.body.cell, grid, params) {
        None => {
            construction::commit(kind, colony, center);
            worker.state = WorkerState::Idle;
        }
        Some(target) => {
            if worker.body.cell.chebyshev(&target) <= 1 {
                worker.body.move_to(grid, target.col, target.row);
            } else if !step_via_path(worker, grid, target, params)
                && !dig_or_step_toward(worker, grid, target, params)
            {
                random_walk(worker, grid, params, rng);
            }
        }
    }
}

fn process_transport_brood<R: Rng>(
    worker: &mut Worker,
    grid: &mut Grid,
    colony: &mut Colony,
    brood_id: BroodId,
    params: &SimulationParams,
    rng: &mut R,
) {
    let nursery = match colony.nursery {
        Some(n) => n,
        None => {
            worker.carried = Carried::None;
            worker.state = WorkerState::TendBrood;
            worker.state_timer = params.tend_duration;
            return;
        }
    };

    if worker.carried != Carried::Brood(brood_id) {
        // Not holding it yet: walk over and pick it up
        let brood_cell = match colony.brood_get(brood_id) {
            Some(b) => b.cell(),
            None => {
                worker.state = WorkerState::Idle;
                return;
            }
        };
        if worker.body.cell.chebyshev(&brood_cell) <= 1 {
            worker.carried = Carried::Brood(brood_id);
        } else {
            approach(worker, grid, brood_cell, params, rng);
        }
        return;
    }

    if worker.body.cell.chebyshev(&nursery) <= 1 {
        let (nx, ny) = nursery.center();
        if let Some(brood) = colony.brood_get_mut(brood_id) {
            brood.x = nx;
            brood.y = ny;
        }
        worker.carried = Carried::None;
        worker.state = WorkerState::TendBrood;
        worker.state_timer = params.tend_duration;
    } else {
        approach(worker, grid, nursery, params, rng);
    }
}

fn process_tend_brood<R: Rng>(
    worker: &mut Worker,
    grid: &mut Grid,
    colony: &mut Colony,
    params: &SimulationParams,
    rng: &mut R,
    dt: f32,
) {
    let nearest = colony
        .brood
        .iter()
        .min_by_key(|b| b.cell().chebyshev(&worker.body.cell))
        .map(|b| (b.id, b.cell(), b.stage()));
    let (id, cell, stage) = match nearest {
        Some(n) => n,
        None => {
            worker.state = WorkerState::Idle;
            return;
        }
    };

    // Stray brood gets hauled back before any tending
    if let Some(nursery) = colony.nursery {
        if cell.chebyshev(&nursery) as f32 > params.nursery_radius {
            worker.state = WorkerState::TransportBrood { brood: id };
            return;
        }
    }

    if worker.body.cell.chebyshev(&cell) <= 1 {
        if stage == BroodStage::Larva && colony.food > 0.0 {
            worker.state = WorkerState::FeedLarva;
            worker.state_timer = params.feed_duration;
            return;
        }
        worker.state_timer -= dt;
        if worker.state_timer <= 0.0 {
            worker.state = WorkerState::Idle;
        }
    } else {
        approach(worker, grid, cell, params, rng);
    }
}

fn process_feed_larva(worker: &mut Worker, colony: &mut Colony, params: &SimulationParams, dt: f32) {
    worker.state_timer -= dt;
    if worker.state_timer <= 0.0 {
        colony.feed_larva(params.larva_feed_cost);
        worker.state = WorkerState::TendBrood;
        worker.state_timer = params.tend_duration;
    }
}

fn process_patrol<R: Rng>(
    worker: &mut Worker,
    grid: &mut Grid,
    ctx: WorkerContext,
    params: &SimulationParams,
    rng: &mut R,
    dt: f32,
) {
    worker.state_timer -= dt;
    if worker.state_timer <= 0.0 {
        worker.state = WorkerState::Idle;
        return;
    }

    if worker.body.cell.chebyshev(&ctx.entrance) > params.guard_patrol_radius + 2 {
        approach(worker, grid, ctx.entrance, params, rng);
        return;
    }

    let next = worker.body.cell.offset(worker.patrol_dir, 0);
    let beyond = (next.col - ctx.entrance.col).abs() > params.guard_patrol_radius;
    if beyond || !grid.is_walkable(next.col, next.row) {
        worker.patrol_dir = -worker.patrol_dir;
        return;
    }
    if worker.body.move_to(grid, next.col, next.row) {
        charge_step(worker, params);
    }
}

fn process_guard_brood<R: Rng>(
    worker: &mut Worker,
    grid: &mut Grid,
    colony: &Colony,
    params: &SimulationParams,
    rng: &mut R,
    dt: f32,
) {
    let cell = match colony.brood.first() {
        Some(b) => b.cell(),
        None => {
            worker.state = WorkerState::Patrol;
            worker.state_timer = rng.gen_range(4.0..8.0);
            return;
        }
    };

    if worker.body.cell.chebyshev(&cell) <= 1 {
        worker.state_timer -= dt;
        if worker.state_timer <= 0.0 {
            worker.state = WorkerState::Idle;
        }
    } else {
        approach(worker, grid, cell, params, rng);
    }
}

fn process_surface_wander<R: Rng>(
    worker: &mut Worker,
    grid: &mut Grid,
    params: &SimulationParams,
    rng: &mut R,
) {
    if worker.energy < params.low_energy_threshold {
        worker.state = WorkerState::Idle;
        return;
    }
    if worker.body.cell.row > grid.surface_row as i32 {
        worker.state = WorkerState::AscendMale;
        return;
    }
    if rng.gen_bool(SURFACE_PAUSE_CHANCE) {
        return;
    }
    surface_step(worker, grid, if rng.gen_bool(0.5) { 1 } else { -1 }, params);
}

/// One sideways step along the surface row
fn surface_step(worker: &mut Worker, grid: &Grid, dir: i32, params: &SimulationParams) -> bool {
    if dir == 0 {
        return false;
    }
    let next = CellCoord::new(worker.body.cell.col + dir, grid.surface_row as i32);
    if worker.body.move_to(grid, next.col, next.row) {
        charge_step(worker, params);
        true
    } else {
        false
    }
}

/// Step toward a target: true when already adjacent, otherwise one
/// cached-path step with a random-walk fallback.
fn approach<R: Rng>(
    worker: &mut Worker,
    grid: &mut Grid,
    target: CellCoord,
    params: &SimulationParams,
    rng: &mut R,
) -> bool {
    if worker.body.cell.chebyshev(&target) <= 1 {
        return true;
    }
    if !step_via_path(worker, grid, target, params) {
        random_walk(worker, grid, params, rng);
    }
    false
}

/// One cached-path step toward a target
fn step_via_path(
    worker: &mut Worker,
    grid: &mut Grid,
    target: CellCoord,
    params: &SimulationParams,
) -> bool {
    let start = worker.body.cell;
    if let Some(step) = worker.path_cache.next_step(grid, start, target) {
        if worker.body.move_to(grid, step.col, step.row) {
            charge_step(worker, params);
            return true;
        }
    }
    false
}

/// Tunnel toward a target that no walkable path reaches: walk or dig
/// the neighbor closest to it, staying below the surface band.
fn dig_or_step_toward(
    worker: &mut Worker,
    grid: &mut Grid,
    target: CellCoord,
    params: &SimulationParams,
) -> bool {
    let start = worker.body.cell;
    let dc = (target.col - start.col).signum();
    let dr = (target.row - start.row).signum();
    for (c, r) in [(dc, dr), (dc, 0), (0, dr)] {
        if c == 0 && r == 0 {
            continue;
        }
        let next = start.offset(c, r);
        if next.row <= grid.surface_row as i32
            || next.row >= grid.rows as i32 - crate::grid::BEDROCK_ROWS as i32
        {
            continue;
        }
        if worker.body.move_to(grid, next.col, next.row) {
            charge_step(worker, params);
            return true;
        }
    }
    false
}

/// Random step preferring walkable neighbors that also have ground
/// support, falling back to any walkable neighbor.
fn random_walk<R: Rng>(
    worker: &mut Worker,
    grid: &mut Grid,
    params: &SimulationParams,
    rng: &mut R,
) -> bool {
    let start = worker.body.cell;
    let mut walkable = Vec::new();
    let mut supported = Vec::new();
    for dr in -1..=1 {
        for dc in -1..=1i32 {
            if dc == 0 && dr == 0 {
                continue;
            }
            let next = start.offset(dc, dr);
            if grid.is_walkable(next.col, next.row) {
                if grid.has_support(next) {
                    supported.push(next);
                }
                walkable.push(next);
            }
        }
    }
    let pool = if supported.is_empty() { &walkable } else { &supported };
    if pool.is_empty() {
        return false;
    }
    let next = pool[rng.gen_range(0..pool.len())];
    if worker.body.move_to(grid, next.col, next.row) {
        charge_step(worker, params);
        true
    } else {
        false
    }
}

/// Try to dig through an adjacent soil cell to escape a stall
fn escape_dig<R: Rng>(worker: &mut Worker, grid: &mut Grid, rng: &mut R) -> bool {
    let start = worker.body.cell;
    let mut diggable = Vec::new();
    for dr in -1..=1 {
        for dc in -1..=1i32 {
            if dc == 0 && dr == 0 {
                continue;
            }
            let next = start.offset(dc, dr);
            if next.row >= grid.surface_row as i32 + 1
                && next.row < grid.rows as i32 - crate::grid::BEDROCK_ROWS as i32
                && grid.is_diggable(next.col, next.row)
            {
                diggable.push(next);
            }
        }
    }
    if diggable.is_empty() {
        return false;
    }
    let next = diggable[rng.gen_range(0..diggable.len())];
    worker.body.move_to(grid, next.col, next.row)
}

fn charge_step(worker: &mut Worker, params: &SimulationParams) {
    worker.energy = (worker.energy - params.energy_move_cost).max(0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellKind;
    use crate::simulation::types::WorkerId;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn setup() -> (Grid, Colony, SimulationParams, WorkerContext, ChaCha8Rng) {
        let params = SimulationParams::default();
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let mut grid = Grid::generate(40, 60, 31, &mut rng);
        // A dug-out nest area connected to the surface by a shaft
        for row in 11..=25 {
            grid.set(20, row, CellKind::Empty);
        }
        for col in 16..=24 {
            grid.set(col, 25, CellKind::Empty);
            grid.set(col, 24, CellKind::Empty);
        }
        let ctx = WorkerContext {
            entrance: CellCoord::new(20, 10),
            nest: CellCoord::new(20, 25),
            mature: true,
        };
        (grid, Colony::new(), params, ctx, rng)
    }

    fn worker_at(cell: CellCoord, caste: Caste, params: &SimulationParams) -> Worker {
        Worker::new(WorkerId(0), cell, caste, params)
    }

    #[test]
    fn test_tired_idle_routes_to_rest() {
        // Scenario: a forager at energy 15 (below the threshold of 20)
        // takes the rest detour instead of heading for the surface.
        let (mut grid, mut colony, params, ctx, mut rng) = setup();
        let mut worker = worker_at(ctx.nest, Caste::Forager, &params);
        worker.energy = 15.0;
        worker.state_timer = 0.0;

        process_worker(&mut worker, &mut grid, &mut colony, ctx, &params, &mut rng, 0.05);
        assert_eq!(worker.state, WorkerState::GoRest);
    }

    #[test]
    fn test_rested_forager_heads_for_surface() {
        let (mut grid, mut colony, params, ctx, mut rng) = setup();
        let mut worker = worker_at(ctx.nest, Caste::Forager, &params);
        worker.state_timer = 0.0;

        process_worker(&mut worker, &mut grid, &mut colony, ctx, &params, &mut rng, 0.05);
        assert_eq!(worker.state, WorkerState::AscendToSurface);
    }

    #[test]
    fn test_sleep_regenerates_to_full() {
        let (mut grid, mut colony, params, ctx, mut rng) = setup();
        let mut worker = worker_at(ctx.nest, Caste::Forager, &params);
        worker.energy = 5.0;
        worker.state = WorkerState::Sleep;

        for _ in 0..200 {
            process_worker(&mut worker, &mut grid, &mut colony, ctx, &params, &mut rng, 0.1);
            if worker.state != WorkerState::Sleep {
                break;
            }
        }
        assert_eq!(worker.energy, 100.0);
        assert_eq!(worker.state, WorkerState::Idle);
    }

    #[test]
    fn test_ascend_reaches_surface_and_switches() {
        let (mut grid, mut colony, params, ctx, mut rng) = setup();
        let mut worker = worker_at(ctx.nest, Caste::Forager, &params);
        worker.state = WorkerState::AscendToSurface;

        for _ in 0..4000 {
            worker.body.update(&mut grid, 0.05);
            if !worker.body.busy() {
                process_worker(&mut worker, &mut grid, &mut colony, ctx, &params, &mut rng, 0.05);
            }
            if worker.state == WorkerState::SearchFood {
                break;
            }
        }
        assert_eq!(worker.state, WorkerState::SearchFood);
        assert!(worker.body.cell.row <= grid.surface_row as i32);
    }

    #[test]
    fn test_capture_food_at_radius() {
        let (mut grid, mut colony, params, ctx, mut rng) = setup();
        let mut worker = worker_at(CellCoord::new(20, 10), Caste::Forager, &params);
        worker.state = WorkerState::SearchFood;
        let (fx, fy) = CellCoord::new(21, 10).center();
        colony.food_sources.push(crate::simulation::colony::FoodSource {
            x: fx,
            y: fy,
            amount: 1,
        });

        process_worker(&mut worker, &mut grid, &mut colony, ctx, &params, &mut rng, 0.05);
        assert_eq!(worker.carried, Carried::Food(1.0));
        assert_eq!(worker.state, WorkerState::ReturnFood);
        assert!(colony.food_sources.is_empty());
    }

    #[test]
    fn test_delivery_credits_colony() {
        let (mut grid, mut colony, params, ctx, mut rng) = setup();
        let mut worker = worker_at(ctx.nest.offset(1, 0), Caste::Forager, &params);
        worker.state = WorkerState::ReturnFood;
        worker.carried = Carried::Food(1.0);

        process_worker(&mut worker, &mut grid, &mut colony, ctx, &params, &mut rng, 0.05);
        assert_eq!(colony.deliveries, 1);
        assert!((colony.food - params.food_per_delivery).abs() < f32::EPSILON);
        assert!(worker.carried.is_none());
        assert_eq!(worker.state, WorkerState::Idle);
    }

    #[test]
    fn test_digger_priorities() {
        let (mut grid, mut colony, params, ctx, mut rng) = setup();
        let mut worker = worker_at(ctx.nest, Caste::Digger, &params);

        // Mature with no food chamber: build it first
        worker.state_timer = 0.0;
        process_worker(&mut worker, &mut grid, &mut colony, ctx, &params, &mut rng, 0.05);
        assert_eq!(
            worker.state,
            WorkerState::BuildChamber { kind: ChamberKind::FoodStore }
        );

        // Nursery built but no rest chamber: that comes next
        colony.food_chamber = Some(CellCoord::new(13, 28));
        colony.nursery = Some(CellCoord::new(27, 28));
        worker.state = WorkerState::Idle;
        worker.state_timer = 0.0;
        process_worker(&mut worker, &mut grid, &mut colony, ctx, &params, &mut rng, 0.05);
        assert_eq!(worker.state, WorkerState::BuildChamber { kind: ChamberKind::Rest });

        // Everything built: free exploratory digging
        colony.rest_chamber = Some(CellCoord::new(32, 29));
        worker.state = WorkerState::Idle;
        worker.state_timer = 0.0;
        process_worker(&mut worker, &mut grid, &mut colony, ctx, &params, &mut rng, 0.05);
        assert_eq!(worker.state, WorkerState::ExploreDig);
        assert!(worker.dig_quota >= params.dig_quota_min);
    }

    #[test]
    fn test_chamber_carving_commits_once() {
        let (mut grid, mut colony, params, ctx, mut rng) = setup();
        let mut worker = worker_at(ctx.nest, Caste::Digger, &params);
        worker.state = WorkerState::BuildChamber { kind: ChamberKind::FoodStore };

        for _ in 0..20_000 {
            worker.body.update(&mut grid, 0.05);
            if !worker.body.busy() {
                process_worker(&mut worker, &mut grid, &mut colony, ctx, &params, &mut rng, 0.05);
            }
            if colony.food_chamber.is_some() {
                break;
            }
        }
        let committed = colony.food_chamber.expect("chamber committed");
        // The committed footprint has no diggable cell left
        assert!(construction::nearest_diggable(committed, ctx.nest, &grid, &params).is_none());
    }

    #[test]
    fn test_nurse_builds_nursery_after_food_chamber() {
        let (mut grid, mut colony, params, ctx, mut rng) = setup();
        let mut worker = worker_at(ctx.nest, Caste::Nurse, &params);
        worker.state_timer = 0.0;

        // No food chamber yet: the nurse does not build
        process_worker(&mut worker, &mut grid, &mut colony, ctx, &params, &mut rng, 0.05);
        assert_ne!(
            worker.state,
            WorkerState::BuildChamber { kind: ChamberKind::Nursery }
        );

        colony.food_chamber = Some(CellCoord::new(13, 28));
        worker.state = WorkerState::Idle;
        worker.state_timer = 0.0;
        process_worker(&mut worker, &mut grid, &mut colony, ctx, &params, &mut rng, 0.05);
        assert_eq!(
            worker.state,
            WorkerState::BuildChamber { kind: ChamberKind::Nursery }
        );
    }

    #[test]
    fn test_stray_brood_triggers_transport() {
        let (mut grid, mut colony, params, ctx, mut rng) = setup();
        colony.nursery = Some(CellCoord::new(27, 28));
        let (bx, by) = CellCoord::new(17, 25).center();
        let id = colony.lay_brood(bx, by, false, 100.0);

        let mut worker = worker_at(CellCoord::new(18, 25), Caste::Nurse, &params);
        worker.state = WorkerState::TendBrood;
        worker.state_timer = params.tend_duration;

        process_worker(&mut worker, &mut grid, &mut colony, ctx, &params, &mut rng, 0.05);
        assert_eq!(worker.state, WorkerState::TransportBrood { brood: id });

        // Adjacent already: the next think picks it up
        process_worker(&mut worker, &mut grid, &mut colony, ctx, &params, &mut rng, 0.05);
        assert_eq!(worker.carried, Carried::Brood(id));
    }

    #[test]
    fn test_carried_brood_follows_and_is_placed() {
        let (mut grid, mut colony, params, ctx, mut rng) = setup();
        colony.nursery = Some(CellCoord::new(22, 25));
        let (bx, by) = CellCoord::new(16, 24).center();
        let id = colony.lay_brood(bx, by, false, 1000.0);

        let mut worker = worker_at(CellCoord::new(16, 25), Caste::Nurse, &params);
        worker.state = WorkerState::TransportBrood { brood: id };

        for _ in 0..4000 {
            worker.body.update(&mut grid, 0.05);
            sync_carried_brood(&worker, &mut colony);
            if !worker.body.busy() {
                process_worker(&mut worker, &mut grid, &mut colony, ctx, &params, &mut rng, 0.05);
            }
            if worker.carried.is_none() && !matches!(worker.state, WorkerState::TransportBrood { .. }) {
                break;
            }
        }

        let brood = colony.brood_get(id).expect("brood still pending");
        let placed = brood.cell();
        assert!(placed.chebyshev(&CellCoord::new(22, 25)) <= 1);
    }

    #[test]
    fn test_feeding_consumes_food_on_timer() {
        let (mut grid, mut colony, params, ctx, mut rng) = setup();
        colony.food = 1.0;
        let (bx, by) = CellCoord::new(21, 25).center();
        let id = colony.lay_brood(bx, by, false, 100.0);
        // Age into the larva stage
        if let Some(b) = colony.brood_get_mut(id) {
            b.timer = 50.0;
        }

        let mut worker = worker_at(CellCoord::new(20, 25), Caste::Nurse, &params);
        worker.state = WorkerState::TendBrood;
        worker.state_timer = params.tend_duration;

        process_worker(&mut worker, &mut grid, &mut colony, ctx, &params, &mut rng, 0.05);
        assert_eq!(worker.state, WorkerState::FeedLarva);

        let before = colony.food;
        for _ in 0..40 {
            process_worker(&mut worker, &mut grid, &mut colony, ctx, &params, &mut rng, 0.05);
            if worker.state != WorkerState::FeedLarva {
                break;
            }
        }
        assert_eq!(worker.state, WorkerState::TendBrood);
        assert!((before - colony.food - params.larva_feed_cost).abs() < f32::EPSILON);
    }

    #[test]
    fn test_guard_dispatch_and_dwell() {
        let (mut grid, mut colony, params, ctx, mut rng) = setup();
        let mut worker = worker_at(CellCoord::new(20, 12), Caste::Guard, &params);
        worker.state_timer = 0.0;

        // No brood: patrolling is the only option
        process_worker(&mut worker, &mut grid, &mut colony, ctx, &params, &mut rng, 0.05);
        assert_eq!(worker.state, WorkerState::Patrol);

        // With brood, guarding comes up eventually
        let (bx, by) = CellCoord::new(20, 25).center();
        colony.lay_brood(bx, by, false, 1000.0);
        let mut guarded = false;
        for _ in 0..200 {
            worker.state = WorkerState::Idle;
            worker.state_timer = 0.0;
            process_worker(&mut worker, &mut grid, &mut colony, ctx, &params, &mut rng, 0.05);
            if worker.state == WorkerState::GuardBrood {
                guarded = true;
                break;
            }
        }
        assert!(guarded);
    }

    #[test]
    fn test_stuck_travel_state_recovers() {
        let (mut grid, mut colony, params, ctx, mut rng) = setup();
        // Wall the worker into a one-cell pocket so every step fails
        let pocket = CellCoord::new(30, 40);
        grid.set(pocket.col, pocket.row, CellKind::Empty);
        let mut worker = worker_at(pocket, Caste::Forager, &params);
        worker.state = WorkerState::AscendToSurface;

        let mut escaped = false;
        for _ in 0..2000 {
            worker.body.update(&mut grid, 0.05);
            if !worker.body.busy() {
                process_worker(&mut worker, &mut grid, &mut colony, ctx, &params, &mut rng, 0.05);
            }
            if worker.body.cell != pocket {
                escaped = true;
                break;
            }
        }
        assert!(escaped);
    }

    #[test]
    fn test_male_ascends_then_wanders() {
        let (mut grid, mut colony, params, ctx, mut rng) = setup();
        let mut worker = worker_at(ctx.nest, Caste::Male, &params);
        worker.state_timer = 0.0;

        process_worker(&mut worker, &mut grid, &mut colony, ctx, &params, &mut rng, 0.05);
        assert_eq!(worker.state, WorkerState::AscendMale);

        for _ in 0..4000 {
            worker.body.update(&mut grid, 0.05);
            if !worker.body.busy() {
                process_worker(&mut worker, &mut grid, &mut colony, ctx, &params, &mut rng, 0.05);
            }
            if worker.state == WorkerState::SurfaceWander {
                break;
            }
        }
        assert_eq!(worker.state, WorkerState::SurfaceWander);
    }
}
