//! Shared locomotion for every mobile agent.
//!
//! The founder and all workers embed an [`AgentBody`]: a fractional world
//! position, the occupied cell, and the current move or dig action. An
//! agent is in at most one of {moving, digging} at a time, and its
//! behavioral state machine only advances while neither is active.

use crate::grid::{CellKind, Grid};
use crate::simulation::types::CellCoord;

/// Locomotion state embedded in the founder and every worker
#[derive(Clone, Debug)]
pub struct AgentBody {
    /// Position in world units
    pub x: f32,
    pub y: f32,
    /// Cell currently occupied
    pub cell: CellCoord,
    /// Cell the active move or dig is aimed at
    pub target: CellCoord,
    pub moving: bool,
    pub digging: bool,
    pub facing_left: bool,
    /// Walk speed in world units per second
    pub speed: f32,
    /// Seconds one dig action takes
    pub dig_duration: f32,
    move_from: (f32, f32),
    move_progress: f32,
    move_duration: f32,
    dig_timer: f32,
}

impl AgentBody {
    /// Place a new body at the center of a cell
    pub fn at_cell(cell: CellCoord, speed: f32, dig_duration: f32) -> Self {
        let (x, y) = cell.center();
        AgentBody {
            x,
            y,
            cell,
            target: cell,
            moving: false,
            digging: false,
            facing_left: false,
            speed,
            dig_duration,
            move_from: (x, y),
            move_progress: 0.0,
            move_duration: 0.0,
            dig_timer: 0.0,
        }
    }

    /// Whether a move or dig is in flight
    pub fn busy(&self) -> bool {
        self.moving || self.digging
    }

    /// Begin moving into a walkable cell, or digging a diggable one.
    ///
    /// Rejected (returns false) while an action is already in flight,
    /// for out-of-bounds targets, and for cells that are neither
    /// walkable nor diggable; callers fall back to another action.
    pub fn move_to(&mut self, grid: &Grid, col: i32, row: i32) -> bool {
        if self.busy() || !grid.in_bounds(col, row) {
            return false;
        }
        let target = CellCoord::new(col, row);
        if target != self.cell {
            self.facing_left = col < self.cell.col;
        }

        if grid.is_walkable(col, row) {
            let (tx, ty) = target.center();
            let distance = ((tx - self.x).powi(2) + (ty - self.y).powi(2)).sqrt();
            self.target = target;
            self.move_from = (self.x, self.y);
            self.move_progress = 0.0;
            self.move_duration = (distance / self.speed).max(f32::EPSILON);
            self.moving = true;
            true
        } else if grid.is_diggable(col, row) {
            self.target = target;
            self.dig_timer = self.dig_duration;
            self.digging = true;
            true
        } else {
            false
        }
    }

    /// Advance the active action, or apply gravity when idle.
    ///
    /// A dig flips its cell to empty exactly when the countdown elapses.
    /// An idle unsupported body above a walkable cell drops one row per
    /// tick, instantly, until supported; agents never float.
    pub fn update(&mut self, grid: &mut Grid, dt: f32) {
        if self.moving {
            self.move_progress += dt / self.move_duration;
            if self.move_progress >= 1.0 {
                let (tx, ty) = self.target.center();
                self.x = tx;
                self.y = ty;
                self.cell = self.target;
                self.moving = false;
            } else {
                let (tx, ty) = self.target.center();
                self.x = self.move_from.0 + (tx - self.move_from.0) * self.move_progress;
                self.y = self.move_from.1 + (ty - self.move_from.1) * self.move_progress;
            }
            return;
        }

        if self.digging {
            self.dig_timer -= dt;
            if self.dig_timer <= 0.0 {
                grid.set(self.target.col, self.target.row, CellKind::Empty);
                self.digging = false;
            }
            return;
        }

        if !grid.has_support(self.cell) && grid.is_walkable(self.cell.col, self.cell.row + 1) {
            self.snap_to(self.cell.offset(0, 1));
        }
    }

    /// Teleport to a cell center without an animated move
    pub fn snap_to(&mut self, cell: CellCoord) {
        let (x, y) = cell.center();
        self.x = x;
        self.y = y;
        self.cell = cell;
        self.target = cell;
    }
}
