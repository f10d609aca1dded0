//! Terrain grid owned by the simulation.
//!
//! Cells mutate one way during play (soil is dug out to empty); the only
//! exception is the resize migration, which rebuilds the grid and carries
//! dug tunnels over. Every kind change is queued on a dirty list that the
//! external renderer takes and clears once per frame.

use noise::{NoiseFn, Perlin};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::simulation::types::CellCoord;

/// Fraction of the grid height above the surface row (sky)
const SURFACE_FRACTION: f32 = 0.18;
/// Rows of indestructible bedrock at the bottom of the grid
pub const BEDROCK_ROWS: usize = 2;
/// Chance for a soil cell to be generated as a buried bedrock pebble
const PEBBLE_CHANCE: f64 = 0.012;
/// Sampling frequency for the static per-cell noise field
const NOISE_FREQUENCY: f64 = 0.35;

/// Kind of a single terrain cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Open air or excavated tunnel
    Empty,
    /// Diggable ground
    Soil,
    /// The walkable ground line between sky and soil
    Surface,
    /// Indestructible rock; also what out-of-bounds queries answer
    Bedrock,
}

/// Rectangular terrain grid with a static per-cell noise field
#[derive(Clone, Debug)]
pub struct Grid {
    pub cols: usize,
    pub rows: usize,
    pub surface_row: usize,
    noise_seed: u32,
    cells: Vec<CellKind>,
    noise: Vec<f32>,
    dirty: Vec<CellCoord>,
    dug_total: u64,
}

impl Grid {
    /// Generate a fresh grid: sky above the surface row, two bedrock rows
    /// at the bottom, soil with sparse bedrock pebbles in between.
    pub fn generate<R: Rng>(cols: usize, rows: usize, noise_seed: u32, rng: &mut R) -> Self {
        let surface_row = (rows as f32 * SURFACE_FRACTION) as usize;
        let perlin = Perlin::new(noise_seed);

        let mut cells = Vec::with_capacity(cols * rows);
        let mut noise = Vec::with_capacity(cols * rows);
        for row in 0..rows {
            for col in 0..cols {
                let kind = if row < surface_row {
                    CellKind::Empty
                } else if row == surface_row {
                    CellKind::Surface
                } else if row >= rows - BEDROCK_ROWS {
                    CellKind::Bedrock
                } else if rng.gen_bool(PEBBLE_CHANCE) {
                    CellKind::Bedrock
                } else {
                    CellKind::Soil
                };
                cells.push(kind);

                let sample = perlin.get([
                    col as f64 * NOISE_FREQUENCY,
                    row as f64 * NOISE_FREQUENCY,
                ]);
                noise.push((sample as f32 + 1.0) * 0.5);
            }
        }

        Grid {
            cols,
            rows,
            surface_row,
            noise_seed,
            cells,
            noise,
            dirty: Vec::new(),
            dug_total: 0,
        }
    }

    /// Regenerate at a new size, migrating previously dug tunnels.
    ///
    /// Dug (empty, below-surface) cells are shifted by the surface-row
    /// delta and re-applied where they land inside the new diggable band;
    /// everything else backfills as freshly generated soil. Best-effort:
    /// tunnel connectivity is not guaranteed after extreme resizes.
    pub fn resized<R: Rng>(&self, cols: usize, rows: usize, rng: &mut R) -> Grid {
        let mut next = Grid::generate(cols, rows, self.noise_seed, rng);
        let offset = next.surface_row as i32 - self.surface_row as i32;

        for row in (self.surface_row + 1)..self.rows.saturating_sub(BEDROCK_ROWS) {
            for col in 0..self.cols {
                if self.get(col as i32, row as i32) != CellKind::Empty {
                    continue;
                }
                let new_row = row as i32 + offset;
                if new_row > next.surface_row as i32
                    && (new_row as usize) < rows - BEDROCK_ROWS
                    && col < cols
                {
                    next.set(col as i32, new_row, CellKind::Empty);
                }
            }
        }
        next
    }

    /// Row offset applied to coordinates when migrating onto `next`
    pub fn migration_offset(&self, next: &Grid) -> i32 {
        next.surface_row as i32 - self.surface_row as i32
    }

    pub fn in_bounds(&self, col: i32, row: i32) -> bool {
        col >= 0 && row >= 0 && (col as usize) < self.cols && (row as usize) < self.rows
    }

    fn index(&self, col: i32, row: i32) -> usize {
        row as usize * self.cols + col as usize
    }

    /// Cell kind at a coordinate; out-of-bounds reads answer bedrock so
    /// the grid edge behaves as a solid wall.
    pub fn get(&self, col: i32, row: i32) -> CellKind {
        if self.in_bounds(col, row) {
            self.cells[self.index(col, row)]
        } else {
            CellKind::Bedrock
        }
    }

    /// Set a cell's kind. Out-of-bounds writes are no-ops; a write that
    /// changes the kind queues the coordinate on the dirty list once.
    pub fn set(&mut self, col: i32, row: i32, kind: CellKind) {
        if !self.in_bounds(col, row) {
            return;
        }
        let idx = self.index(col, row);
        if self.cells[idx] == kind {
            return;
        }
        if self.cells[idx] == CellKind::Soil && kind == CellKind::Empty {
            self.dug_total += 1;
        }
        self.cells[idx] = kind;
        self.dirty.push(CellCoord::new(col, row));
    }

    pub fn is_walkable(&self, col: i32, row: i32) -> bool {
        matches!(self.get(col, row), CellKind::Empty | CellKind::Surface)
    }

    pub fn is_diggable(&self, col: i32, row: i32) -> bool {
        self.get(col, row) == CellKind::Soil
    }

    /// Whether an agent at this cell has something to hold on to: the
    /// bottom boundary row always supports, otherwise any of below, left,
    /// right, below-left or below-right being soil or bedrock does
    /// (agents cling to walls and ceilings, not just floors).
    pub fn has_support(&self, cell: CellCoord) -> bool {
        if cell.row >= self.rows as i32 - 1 {
            return true;
        }
        const NEIGHBORS: [(i32, i32); 5] = [(0, 1), (-1, 0), (1, 0), (-1, 1), (1, 1)];
        NEIGHBORS.iter().any(|&(dc, dr)| {
            matches!(
                self.get(cell.col + dc, cell.row + dr),
                CellKind::Soil | CellKind::Bedrock
            )
        })
    }

    /// Count of empty cells in the underground band, excluding the sky
    /// and the bedrock floor. Telemetry for the HUD.
    pub fn count_empty(&self) -> usize {
        let mut count = 0;
        for row in (self.surface_row + 1)..self.rows.saturating_sub(BEDROCK_ROWS) {
            for col in 0..self.cols {
                if self.cells[row * self.cols + col] == CellKind::Empty {
                    count += 1;
                }
            }
        }
        count
    }

    /// Hand the dirty list to its single consumer (the renderer) and
    /// clear it.
    pub fn take_dirty(&mut self) -> Vec<CellCoord> {
        std::mem::take(&mut self.dirty)
    }

    /// Static noise value for a cell (0..1); out-of-bounds reads are 0.
    pub fn noise_at(&self, col: i32, row: i32) -> f32 {
        if self.in_bounds(col, row) {
            self.noise[self.index(col, row)]
        } else {
            0.0
        }
    }

    pub fn cells(&self) -> &[CellKind] {
        &self.cells
    }

    pub fn noise_values(&self) -> &[f32] {
        &self.noise
    }

    /// Total soil cells dug out over the lifetime of the grid
    pub fn dug_total(&self) -> u64 {
        self.dug_total
    }
}
