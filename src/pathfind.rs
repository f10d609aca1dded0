//! First-step pathfinding over the terrain grid.
//!
//! A breadth-first expansion that only answers "which neighbor do I step
//! into next". Callers re-query every tick, so the full path is never
//! reconstructed. A small per-agent cache keeps the amortized cost low.

use std::collections::{HashSet, VecDeque};

use crate::grid::Grid;
use crate::simulation::types::CellCoord;

/// Visited-node budget before the search gives up
const NODE_BUDGET: usize = 800;
/// How many queries a cached step survives before a fresh search
const CACHE_MAX_AGE: u32 = 5;

const DIRECTIONS: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// Breadth-first search for the first step from `start` toward the
/// neighborhood of `target`.
///
/// Expands 8-connected walkable cells, remembering for each frontier
/// cell the first step taken out of `start`. Returns that step as soon
/// as a frontier cell is within Chebyshev distance 1 of the target.
/// Returns `None` when start equals the target, when the start is
/// already adjacent, or when the node budget runs out; callers fall
/// back to a heuristic step.
pub fn first_step(grid: &Grid, start: CellCoord, target: CellCoord) -> Option<CellCoord> {
    if start == target {
        return None;
    }

    let mut visited: HashSet<CellCoord> = HashSet::new();
    visited.insert(start);
    let mut queue: VecDeque<(CellCoord, Option<CellCoord>)> = VecDeque::new();
    queue.push_back((start, None));
    let mut budget = NODE_BUDGET;

    while let Some((cell, step)) = queue.pop_front() {
        if budget == 0 {
            return None;
        }
        budget -= 1;

        if cell.chebyshev(&target) <= 1 {
            return step;
        }

        for &(dc, dr) in &DIRECTIONS {
            let next = cell.offset(dc, dr);
            if visited.contains(&next) || !grid.is_walkable(next.col, next.row) {
                continue;
            }
            visited.insert(next);
            queue.push_back((next, step.or(Some(next))));
        }
    }

    None
}

/// Agent-local memo of the last pathfinder result.
///
/// The cached step is reused only while the target is unchanged, the
/// entry is young, the step cell is still walkable, and the agent has
/// not already reached it.
#[derive(Clone, Debug, Default)]
pub struct PathCache {
    cached: Option<CachedStep>,
}

#[derive(Clone, Debug)]
struct CachedStep {
    target: CellCoord,
    step: CellCoord,
    age: u32,
}

impl PathCache {
    pub fn new() -> Self {
        PathCache { cached: None }
    }

    /// Next step toward `target`, served from cache when still valid.
    pub fn next_step(&mut self, grid: &Grid, start: CellCoord, target: CellCoord) -> Option<CellCoord> {
        if let Some(entry) = &mut self.cached {
            if entry.target == target
                && entry.age < CACHE_MAX_AGE
                && entry.step != start
                && grid.is_walkable(entry.step.col, entry.step.row)
            {
                entry.age += 1;
                return Some(entry.step);
            }
        }

        match first_step(grid, start, target) {
            Some(step) => {
                self.cached = Some(CachedStep { target, step, age: 0 });
                Some(step)
            }
            None => {
                self.cached = None;
                None
            }
        }
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}
