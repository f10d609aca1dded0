//! Chamber construction: fixed footprints carved cell by cell.
//!
//! Each chamber kind has a deterministic footprint derived from the nest
//! (or nursery) position, so several workers can carve the same chamber
//! cooperatively without coordination. The chamber is committed exactly
//! once, when no diggable cell remains in its footprint.

use crate::grid::Grid;
use crate::simulation::colony::Colony;
use crate::simulation::params::SimulationParams;
use crate::simulation::types::CellCoord;
use crate::simulation::workers::types::ChamberKind;

/// Horizontal offset of the food store and nursery from the nest
const CHAMBER_SIDE_OFFSET: i32 = 7;
/// Vertical drop of the food store and nursery below the nest
const CHAMBER_DROP: i32 = 3;
/// Offset of the rest chamber from the nursery it adjoins
const REST_OFFSET: i32 = 5;
/// Footprint size, cells
const FOOTPRINT_COLS: i32 = 5;
const FOOTPRINT_ROWS: i32 = 3;

/// Center cell for a chamber kind, or None while its prerequisite
/// chamber does not exist yet.
pub fn chamber_center(kind: ChamberKind, nest: CellCoord, colony: &Colony) -> Option<CellCoord> {
    match kind {
        ChamberKind::FoodStore => Some(nest.offset(-CHAMBER_SIDE_OFFSET, CHAMBER_DROP)),
        ChamberKind::Nursery => Some(nest.offset(CHAMBER_SIDE_OFFSET, CHAMBER_DROP)),
        ChamberKind::Rest => colony.nursery.map(|n| n.offset(REST_OFFSET, 1)),
    }
}

/// The already-committed location slot for a chamber kind
pub fn committed(kind: ChamberKind, colony: &Colony) -> Option<CellCoord> {
    match kind {
        ChamberKind::FoodStore => colony.food_chamber,
        ChamberKind::Nursery => colony.nursery,
        ChamberKind::Rest => colony.rest_chamber,
    }
}

/// Commit a chamber location; a second commit of the same kind is a
/// no-op, the first location always wins.
pub fn commit(kind: ChamberKind, colony: &mut Colony, center: CellCoord) {
    let slot = match kind {
        ChamberKind::FoodStore => &mut colony.food_chamber,
        ChamberKind::Nursery => &mut colony.nursery,
        ChamberKind::Rest => &mut colony.rest_chamber,
    };
    if slot.is_none() {
        *slot = Some(center);
    }
}

/// All in-band cells of a chamber footprint around its center
pub fn footprint(center: CellCoord, grid: &Grid, params: &SimulationParams) -> Vec<CellCoord> {
    let mut cells = Vec::new();
    for drow in -(FOOTPRINT_ROWS / 2)..=(FOOTPRINT_ROWS / 2) {
        for dcol in -(FOOTPRINT_COLS / 2)..=(FOOTPRINT_COLS / 2) {
            let cell = center.offset(dcol, drow);
            let in_band = cell.row > grid.surface_row as i32
                && cell.row < grid.rows as i32 - crate::grid::BEDROCK_ROWS as i32
                && cell.col >= params.grid_margin
                && cell.col < grid.cols as i32 - params.grid_margin;
            if in_band {
                cells.push(cell);
            }
        }
    }
    cells
}

/// Nearest still-diggable footprint cell to a worker, or None when the
/// footprint is fully carved out.
pub fn nearest_diggable(
    center: CellCoord,
    from: CellCoord,
    grid: &Grid,
    params: &SimulationParams,
) -> Option<CellCoord> {
    footprint(center, grid, params)
        .into_iter()
        .filter(|c| grid.is_diggable(c.col, c.row))
        .min_by_key(|c| c.chebyshev(&from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_rest_chamber_requires_nursery() {
        let nest = CellCoord::new(20, 25);
        let mut colony = Colony::new();
        assert_eq!(chamber_center(ChamberKind::Rest, nest, &colony), None);

        colony.nursery = Some(CellCoord::new(27, 28));
        let rest = chamber_center(ChamberKind::Rest, nest, &colony).unwrap();
        assert_eq!(rest, CellCoord::new(32, 29));
    }

    #[test]
    fn test_commit_is_once_only() {
        let mut colony = Colony::new();
        commit(ChamberKind::FoodStore, &mut colony, CellCoord::new(10, 20));
        commit(ChamberKind::FoodStore, &mut colony, CellCoord::new(99, 99));
        assert_eq!(colony.food_chamber, Some(CellCoord::new(10, 20)));
    }

    #[test]
    fn test_footprint_carving_runs_dry() {
        let params = SimulationParams::default();
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let mut grid = Grid::generate(40, 60, 13, &mut rng);
        let center = CellCoord::new(13, 28);

        let mut guard = 0;
        while let Some(cell) = nearest_diggable(center, center, &grid, &params) {
            grid.set(cell.col, cell.row, CellKind::Empty);
            guard += 1;
            assert!(guard <= (FOOTPRINT_COLS * FOOTPRINT_ROWS) as usize);
        }
        assert!(nearest_diggable(center, center, &grid, &params).is_none());
    }
}
