//! Core types shared across the colony simulation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width and height of one grid cell in world units
pub const CELL_SIZE: f32 = 8.0;

/// A cell address in the terrain grid.
///
/// Signed so that out-of-bounds neighbors are representable; the grid
/// answers queries for them as bedrock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    pub col: i32,
    pub row: i32,
}

impl CellCoord {
    pub fn new(col: i32, row: i32) -> Self {
        CellCoord { col, row }
    }

    pub fn offset(&self, dcol: i32, drow: i32) -> Self {
        CellCoord::new(self.col + dcol, self.row + drow)
    }

    /// Chebyshev (chessboard) distance to another cell
    pub fn chebyshev(&self, other: &CellCoord) -> i32 {
        (self.col - other.col).abs().max((self.row - other.row).abs())
    }

    /// Center of this cell in world units
    pub fn center(&self) -> (f32, f32) {
        (
            (self.col as f32 + 0.5) * CELL_SIZE,
            (self.row as f32 + 0.5) * CELL_SIZE,
        )
    }

    /// The cell containing a world-space point
    pub fn from_world(x: f32, y: f32) -> Self {
        CellCoord::new(
            (x / CELL_SIZE).floor() as i32,
            (y / CELL_SIZE).floor() as i32,
        )
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// Unique identifier for a worker
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerId(pub u32);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Worker#{}", self.0)
    }
}

/// Unique identifier for a brood item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BroodId(pub u32);

impl fmt::Display for BroodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Brood#{}", self.0)
    }
}

/// Payload carried by a worker. At most one item at a time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Carried {
    None,
    Food(f32),
    Brood(BroodId),
}

impl Carried {
    pub fn is_none(&self) -> bool {
        matches!(self, Carried::None)
    }
}

impl Default for Carried {
    fn default() -> Self {
        Carried::None
    }
}

/// Tick-rate multiplier selectable from the outside
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedFactor {
    X1,
    X2,
    X4,
    X8,
}

impl SpeedFactor {
    pub fn multiplier(&self) -> f32 {
        match self {
            SpeedFactor::X1 => 1.0,
            SpeedFactor::X2 => 2.0,
            SpeedFactor::X4 => 4.0,
            SpeedFactor::X8 => 8.0,
        }
    }

    /// Parse one of the supported multipliers; anything else maps to 1x.
    pub fn from_u32(value: u32) -> Self {
        match value {
            2 => SpeedFactor::X2,
            4 => SpeedFactor::X4,
            8 => SpeedFactor::X8,
            _ => SpeedFactor::X1,
        }
    }
}

impl Default for SpeedFactor {
    fn default() -> Self {
        SpeedFactor::X1
    }
}

/// External commands applied at the start of the next tick
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Drop a food source at world coordinates
    PlaceFood { x: f32, y: f32, amount: u32 },
    /// Change the tick-rate multiplier
    SetSpeed(SpeedFactor),
    /// Freeze or resume the simulation
    SetPaused(bool),
    /// Regenerate the grid at a new size, migrating dug tunnels
    Resize { cols: usize, rows: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chebyshev_distance() {
        let a = CellCoord::new(3, 4);
        assert_eq!(a.chebyshev(&CellCoord::new(3, 4)), 0);
        assert_eq!(a.chebyshev(&CellCoord::new(4, 4)), 1);
        assert_eq!(a.chebyshev(&CellCoord::new(6, 2)), 3);
    }

    #[test]
    fn test_world_cell_round_trip() {
        let cell = CellCoord::new(5, 9);
        let (x, y) = cell.center();
        assert_eq!(CellCoord::from_world(x, y), cell);
    }

    #[test]
    fn test_speed_factor_parse() {
        assert_eq!(SpeedFactor::from_u32(4), SpeedFactor::X4);
        assert_eq!(SpeedFactor::from_u32(3), SpeedFactor::X1);
    }
}
