//! Founding queen life cycle.
//!
//! A seven-state machine that only ever moves forward: the founder lands,
//! sheds her wings, picks a nest site, excavates a shaft and chamber,
//! seals herself in for claustral brood-rearing, and settles into mature
//! egg-laying. There is no death model; running out of wing energy only
//! pauses laying.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::grid::{CellKind, Grid};
use crate::simulation::agent::AgentBody;
use crate::simulation::colony::Colony;
use crate::simulation::params::SimulationParams;
use crate::simulation::types::CellCoord;

/// Rows below the surface scanned for the seal cell
const SEAL_SCAN_DEPTH: i32 = 4;
/// Wander leash around the nest chamber for the mature founder
const NEST_WANDER_RADIUS: i32 = 3;

/// Life-cycle phase; transitions are strictly forward
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FounderState {
    Landing,
    WingShed,
    SearchSite,
    DigShaft,
    DigChamber,
    Claustral,
    Mature,
}

/// The colony's founding queen; exactly one per simulation
#[derive(Clone, Debug)]
pub struct Founder {
    pub body: AgentBody,
    pub state: FounderState,
    pub has_wings: bool,
    /// Internal fat/muscle reserve consumed during claustral founding
    pub wing_energy: f32,
    /// Surface cell recorded at the end of the site search
    pub entrance: Option<CellCoord>,
    /// Bottom of the shaft; center of the nest chamber
    pub nest: Option<CellCoord>,
    /// Marked seal cell while the nest is closed off
    pub seal: Option<CellCoord>,
    pub eggs_laid: u32,
    pub state_timer: f32,
    pub egg_timer: f32,
    pub groom_timer: f32,
    pub target_depth: usize,
    pub target_width: usize,
    pub cells_widened: usize,
    pub walk_dir: i32,
    chamber_stalls: u32,
}

/// Fruitless widening attempts before the founder settles for the
/// chamber she has (a pebble can wall off the rest of the row)
const CHAMBER_STALL_LIMIT: u32 = 24;

impl Founder {
    /// Place a freshly landed queen on the surface
    pub fn new(cell: CellCoord, params: &SimulationParams) -> Self {
        Founder {
            body: AgentBody::at_cell(cell, params.founder_speed, params.dig_duration),
            state: FounderState::Landing,
            has_wings: true,
            wing_energy: params.wing_energy_capacity,
            entrance: None,
            nest: None,
            seal: None,
            eggs_laid: 0,
            state_timer: params.landing_delay,
            egg_timer: 0.0,
            groom_timer: 0.0,
            target_depth: 0,
            target_width: 0,
            cells_widened: 0,
            walk_dir: 1,
            chamber_stalls: 0,
        }
    }

    /// Per-tick bookkeeping that runs even while a move or dig is in
    /// flight: locomotion, phase timers, and the claustral energy drain.
    pub fn update(&mut self, grid: &mut Grid, params: &SimulationParams, dt: f32) {
        self.body.update(grid, dt);
        match self.state {
            FounderState::Landing | FounderState::WingShed | FounderState::SearchSite => {
                self.state_timer -= dt;
            }
            FounderState::Claustral => {
                self.wing_energy = (self.wing_energy - params.wing_energy_drain * dt).max(0.0);
                self.egg_timer -= dt;
                self.groom_timer -= dt;
            }
            FounderState::Mature => {
                self.egg_timer -= dt;
            }
            _ => {}
        }
    }

    /// One thinking step; the tick driver calls this only while no move
    /// or dig is active.
    pub fn think<R: Rng>(
        &mut self,
        grid: &mut Grid,
        colony: &mut Colony,
        population: usize,
        params: &SimulationParams,
        rng: &mut R,
    ) {
        match self.state {
            FounderState::Landing => self.think_landing(params),
            FounderState::WingShed => self.think_wing_shed(params),
            FounderState::SearchSite => self.think_search_site(grid, params, rng),
            FounderState::DigShaft => self.think_dig_shaft(grid, params, rng),
            FounderState::DigChamber => self.think_dig_chamber(grid, params, rng),
            FounderState::Claustral => self.think_claustral(grid, colony, params, rng),
            FounderState::Mature => self.think_mature(grid, colony, population, params, rng),
        }
    }

    fn think_landing(&mut self, params: &SimulationParams) {
        if self.state_timer <= 0.0 {
            self.state = FounderState::WingShed;
            self.state_timer = params.wing_shed_duration;
        }
    }

    fn think_wing_shed(&mut self, params: &SimulationParams) {
        if self.state_timer <= 0.0 {
            self.has_wings = false;
            self.wing_energy = params.wing_energy_capacity;
            self.state = FounderState::SearchSite;
            self.state_timer = params.search_site_duration;
        }
    }

    /// Walk left and right along the surface, reversing when blocked;
    /// wherever the timer runs out becomes the nest entrance.
    fn think_search_site<R: Rng>(&mut self, grid: &Grid, params: &SimulationParams, rng: &mut R) {
        if self.state_timer <= 0.0 {
            self.entrance = Some(self.body.cell);
            self.target_depth = rng.gen_range(params.shaft_depth_min..=params.shaft_depth_max);
            self.state = FounderState::DigShaft;
            return;
        }

        let next = self.body.cell.offset(self.walk_dir, 0);
        if !grid.is_walkable(next.col, next.row) || !self.body.move_to(grid, next.col, next.row) {
            self.walk_dir = -self.walk_dir;
        }
    }

    /// Dig straight down one cell at a time; sidestep around anything
    /// that cannot be dug and retry from the new column.
    fn think_dig_shaft<R: Rng>(&mut self, grid: &mut Grid, params: &SimulationParams, rng: &mut R) {
        let entrance = match self.entrance {
            Some(e) => e,
            None => {
                self.entrance = Some(self.body.cell);
                return;
            }
        };

        let depth = (self.body.cell.row - entrance.row).max(0) as usize;
        let floor_reached =
            self.body.cell.row + 1 >= grid.rows as i32 - crate::grid::BEDROCK_ROWS as i32;
        if depth >= self.target_depth || floor_reached {
            self.nest = Some(self.body.cell);
            self.target_width = rng.gen_range(params.chamber_width_min..=params.chamber_width_max);
            self.cells_widened = 0;
            self.walk_dir = if rng.gen_bool(0.5) { 1 } else { -1 };
            self.state = FounderState::DigChamber;
            return;
        }

        let below = self.body.cell.offset(0, 1);
        if grid.is_walkable(below.col, below.row) || grid.is_diggable(below.col, below.row) {
            self.body.move_to(grid, below.col, below.row);
            return;
        }

        // Blocked by a pebble: dig or step sideways, then retry downward
        for dir in [self.walk_dir, -self.walk_dir] {
            let side = self.body.cell.offset(dir, 0);
            if grid.is_diggable(side.col, side.row) || grid.is_walkable(side.col, side.row) {
                self.body.move_to(grid, side.col, side.row);
                return;
            }
        }
    }

    /// Widen the shaft bottom into a chamber by oscillating sideways,
    /// clearing one cell of ceiling on the way, until the target width
    /// has been dug. Then seal the entrance and begin claustral founding.
    fn think_dig_chamber<R: Rng>(&mut self, grid: &mut Grid, params: &SimulationParams, rng: &mut R) {
        let nest = match self.nest {
            Some(n) => n,
            None => {
                self.nest = Some(self.body.cell);
                return;
            }
        };

        if self.cells_widened >= self.target_width || self.chamber_stalls > CHAMBER_STALL_LIMIT {
            self.seal_entrance(grid);
            self.state = FounderState::Claustral;
            self.egg_timer = params.claustral_egg_interval;
            self.groom_timer = rng.gen_range(params.groom_interval_min..params.groom_interval_max);
            return;
        }

        let above = self.body.cell.offset(0, -1);
        if above.row > grid.surface_row as i32 && grid.is_diggable(above.col, above.row) {
            self.body.move_to(grid, above.col, above.row);
            return;
        }

        let half_width = (self.target_width / 2) as i32 + 1;
        let next = self.body.cell.offset(self.walk_dir, 0);
        let out_of_bounds = (next.col - nest.col).abs() > half_width
            || next.col < params.grid_margin
            || next.col >= grid.cols as i32 - params.grid_margin;
        if out_of_bounds {
            self.walk_dir = -self.walk_dir;
            self.chamber_stalls += 1;
            return;
        }

        if grid.is_diggable(next.col, next.row) {
            if self.body.move_to(grid, next.col, next.row) {
                self.cells_widened += 1;
                self.chamber_stalls = 0;
            }
        } else if !self.body.move_to(grid, next.col, next.row) {
            self.walk_dir = -self.walk_dir;
            self.chamber_stalls += 1;
        }
    }

    /// Mark the first empty cell in a short band below the surface near
    /// the entrance as sealed. The mark is a state/rendering flag; the
    /// cell itself keeps its kind.
    fn seal_entrance(&mut self, grid: &Grid) {
        let entrance = match self.entrance {
            Some(e) => e,
            None => return,
        };
        for depth in 1..=SEAL_SCAN_DEPTH {
            let cell = entrance.offset(0, depth);
            if grid.get(cell.col, cell.row) == CellKind::Empty {
                self.seal = Some(cell);
                return;
            }
        }
    }

    /// Sealed in: drain reserves, groom the brood pile, and lay a
    /// bounded clutch of first-generation eggs while energy lasts.
    fn think_claustral<R: Rng>(
        &mut self,
        grid: &mut Grid,
        colony: &mut Colony,
        params: &SimulationParams,
        rng: &mut R,
    ) {
        if self.groom_timer <= 0.0 {
            self.groom_timer = rng.gen_range(params.groom_interval_min..params.groom_interval_max);
            if let Some(first) = colony.brood.first() {
                let target = first.cell();
                self.step_toward(grid, target);
            }
        }

        if self.egg_timer <= 0.0 {
            self.egg_timer = params.claustral_egg_interval;
            let can_lay = self.eggs_laid < params.max_first_generation_eggs
                && self.wing_energy - params.egg_cost_energy >= params.wing_energy_reserve;
            if can_lay {
                self.wing_energy -= params.egg_cost_energy;
                self.eggs_laid += 1;
                let dx: f32 = rng.gen_range(-2.0..2.0);
                colony.lay_brood(self.body.x + dx, self.body.y, true, params.brood_hatch_time);
            }
        }
    }

    /// Called by the tick driver when a first-generation worker hatches;
    /// unseals the nest and matures the colony the moment the threshold
    /// is met.
    pub fn notify_nanitic_hatched(
        &mut self,
        grid: &mut Grid,
        nanitics_hatched: u32,
        params: &SimulationParams,
    ) {
        if self.state != FounderState::Claustral {
            return;
        }
        if nanitics_hatched >= params.nanitic_threshold {
            if let Some(seal) = self.seal.take() {
                grid.set(seal.col, seal.row, CellKind::Empty);
            }
            self.state = FounderState::Mature;
            self.egg_timer = params.mature_egg_interval;
        }
    }

    /// Terminal state: lay ordinary eggs while food and the population
    /// cap allow, and wander the chamber in between.
    fn think_mature<R: Rng>(
        &mut self,
        grid: &mut Grid,
        colony: &mut Colony,
        population: usize,
        params: &SimulationParams,
        rng: &mut R,
    ) {
        if self.egg_timer <= 0.0 {
            let under_cap = population + colony.brood.len() < params.population_cap;
            if under_cap && colony.try_spend_food(params.egg_cost_food) {
                colony.lay_brood(self.body.x, self.body.y, false, params.brood_hatch_time);
                self.egg_timer = params.mature_egg_interval;
            } else {
                self.egg_timer = params.mature_retry_interval;
            }
            return;
        }

        if rng.gen::<f32>() < params.mature_wander_chance {
            if let Some(nest) = self.nest {
                let dc = rng.gen_range(-1..=1);
                let dr = rng.gen_range(-1..=1);
                let next = self.body.cell.offset(dc, dr);
                if next.chebyshev(&nest) <= NEST_WANDER_RADIUS
                    && grid.is_walkable(next.col, next.row)
                {
                    self.body.move_to(grid, next.col, next.row);
                }
            }
        }
    }

    fn step_toward(&mut self, grid: &Grid, target: CellCoord) {
        let dc = (target.col - self.body.cell.col).signum();
        let dr = (target.row - self.body.cell.row).signum();
        for (c, r) in [(dc, dr), (dc, 0), (0, dr)] {
            if c == 0 && r == 0 {
                continue;
            }
            let next = self.body.cell.offset(c, r);
            if grid.is_walkable(next.col, next.row) && self.body.move_to(grid, next.col, next.row) {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn setup() -> (Grid, Colony, Founder, SimulationParams, ChaCha8Rng) {
        let params = SimulationParams::default();
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let grid = Grid::generate(40, 60, 21, &mut rng);
        let founder = Founder::new(CellCoord::new(20, grid.surface_row as i32), &params);
        (grid, Colony::new(), founder, params, rng)
    }

    fn run(
        grid: &mut Grid,
        colony: &mut Colony,
        founder: &mut Founder,
        params: &SimulationParams,
        rng: &mut ChaCha8Rng,
        seconds: f32,
    ) {
        let dt = 0.05;
        let ticks = (seconds / dt) as usize;
        for _ in 0..ticks {
            founder.update(grid, params, dt);
            if !founder.body.busy() {
                founder.think(grid, colony, 0, params, rng);
            }
        }
    }

    #[test]
    fn test_landing_to_dig_shaft_sheds_wings() {
        // Scenario: 40x60 grid with the surface at row 10, founder at
        // (20, 10); past the first three phase durations she is digging
        // and wingless.
        let (mut grid, mut colony, mut founder, params, mut rng) = setup();
        assert_eq!(grid.surface_row, 10);
        assert!(founder.has_wings);

        let total = params.landing_delay + params.wing_shed_duration + params.search_site_duration;
        run(&mut grid, &mut colony, &mut founder, &params, &mut rng, total + 4.0);

        assert!(founder.state >= FounderState::DigShaft);
        assert!(!founder.has_wings);
        assert!(founder.entrance.is_some());
    }

    #[test]
    fn test_life_cycle_never_regresses() {
        let (mut grid, mut colony, mut founder, params, mut rng) = setup();
        let mut last = founder.state;
        let dt = 0.05;
        for _ in 0..20_000 {
            founder.update(&mut grid, &params, dt);
            if !founder.body.busy() {
                founder.think(&mut grid, &mut colony, 0, &params, &mut rng);
            }
            assert!(founder.state >= last);
            last = founder.state;
        }
    }

    #[test]
    fn test_shaft_and_chamber_are_dug() {
        let (mut grid, mut colony, mut founder, params, mut rng) = setup();
        run(&mut grid, &mut colony, &mut founder, &params, &mut rng, 240.0);

        assert!(founder.state >= FounderState::Claustral);
        let nest = founder.nest.expect("nest recorded");
        let entrance = founder.entrance.expect("entrance recorded");
        let depth = (nest.row - entrance.row) as usize;
        assert!(depth >= params.shaft_depth_min || nest.row as usize >= grid.rows - 3);
        // At least the shaft has been opened up underground
        assert!(grid.count_empty() >= depth);
    }

    #[test]
    fn test_claustral_laying_respects_energy_reserve() {
        let (mut grid, mut colony, mut founder, params, mut rng) = setup();
        founder.state = FounderState::Claustral;
        founder.nest = Some(CellCoord::new(20, 25));
        founder.body.snap_to(CellCoord::new(20, 25));
        founder.wing_energy = params.wing_energy_reserve + params.egg_cost_energy + 1.0;
        founder.egg_timer = 0.0;
        founder.groom_timer = 100.0;

        founder.think(&mut grid, &mut colony, 0, &params, &mut rng);
        assert_eq!(colony.brood.len(), 1);

        // Energy now below reserve + cost: the next interval lays nothing
        founder.egg_timer = 0.0;
        founder.think(&mut grid, &mut colony, 0, &params, &mut rng);
        assert_eq!(colony.brood.len(), 1);
        assert!(founder.wing_energy >= 0.0);
    }

    #[test]
    fn test_nanitic_threshold_unseals_and_matures() {
        // Scenario: hatch events push the nanitic count to the threshold;
        // the seal cell is empty and the state is Mature immediately.
        let (mut grid, _colony, mut founder, params, _rng) = setup();
        founder.state = FounderState::Claustral;
        founder.entrance = Some(CellCoord::new(20, 10));
        let seal = CellCoord::new(20, 11);
        grid.set(seal.col, seal.row, CellKind::Empty);
        founder.seal = Some(seal);

        for hatched in 1..=10u32 {
            founder.notify_nanitic_hatched(&mut grid, hatched, &params);
            if hatched < params.nanitic_threshold {
                assert_eq!(founder.state, FounderState::Claustral);
            } else {
                assert_eq!(founder.state, FounderState::Mature);
                assert_eq!(grid.get(seal.col, seal.row), CellKind::Empty);
                assert!(founder.seal.is_none());
            }
        }
    }

    #[test]
    fn test_mature_laying_gated_on_food_and_cap() {
        let (mut grid, mut colony, mut founder, params, mut rng) = setup();
        founder.state = FounderState::Mature;
        founder.nest = Some(CellCoord::new(20, 25));
        founder.body.snap_to(CellCoord::new(20, 25));

        // No food: nothing is laid, the retry timer shortens
        founder.egg_timer = 0.0;
        founder.think(&mut grid, &mut colony, 0, &params, &mut rng);
        assert!(colony.brood.is_empty());
        assert!((founder.egg_timer - params.mature_retry_interval).abs() < f32::EPSILON);

        // Food available and under the cap: one egg, one food spent
        colony.food = 5.0;
        founder.egg_timer = 0.0;
        founder.think(&mut grid, &mut colony, 0, &params, &mut rng);
        assert_eq!(colony.brood.len(), 1);
        assert!((colony.food - (5.0 - params.egg_cost_food)).abs() < f32::EPSILON);

        // At the cap: deferred even with food on hand
        founder.egg_timer = 0.0;
        founder.think(&mut grid, &mut colony, params.population_cap, &params, &mut rng);
        assert_eq!(colony.brood.len(), 1);
    }
}
