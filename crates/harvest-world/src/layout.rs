//! Initial field construction and unit placement.
//!
//! The default layout puts the unload point in the top-left corner and the
//! refuel station in the opposite corner. Every other cell starts ready to
//! harvest with probability `initial_ready_fraction`.

use harvest_types::{CellState, GridPos, UnitId};
use rand::Rng;
use tracing::debug;

use crate::chance::roll;
use crate::error::{WorldError, check_probability};
use crate::field_grid::FieldGrid;

/// Parameters for building the starting field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldLayout {
    /// Field width in cells.
    pub width: u32,
    /// Field height in cells.
    pub height: u32,
    /// Probability that a non-fixture cell starts ready to harvest.
    pub initial_ready_fraction: f64,
}

impl FieldLayout {
    /// The unload point of this layout: the top-left corner.
    pub const fn unload_point(&self) -> GridPos {
        GridPos::new(0, 0)
    }

    /// The refuel station of this layout: the bottom-right corner.
    pub const fn refuel_station(&self) -> GridPos {
        GridPos::new(self.width.saturating_sub(1), self.height.saturating_sub(1))
    }

    /// Build the starting field, drawing once per non-fixture cell in
    /// row-major order.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid dimensions (including a 1x1 field where
    /// the fixtures would coincide) or an out-of-range fraction.
    pub fn build(&self, rng: &mut impl Rng) -> Result<FieldGrid, WorldError> {
        let fraction = check_probability("initial_ready_fraction", self.initial_ready_fraction)?;
        let mut grid = FieldGrid::new(
            self.width,
            self.height,
            self.unload_point(),
            self.refuel_station(),
        )?;

        let candidates: Vec<GridPos> = grid
            .cells()
            .filter(|&(_, state)| !state.is_fixture())
            .map(|(pos, _)| pos)
            .collect();
        for pos in candidates {
            if roll(rng, fraction) {
                grid.set_state(pos, CellState::ReadyToHarvest)?;
            }
        }

        debug!(
            width = self.width,
            height = self.height,
            ready = grid.parcels_ready().len(),
            "Field seeded"
        );
        Ok(grid)
    }
}

/// Place each unit on a uniformly random free non-fixture cell, in the
/// order given.
///
/// # Errors
///
/// Returns [`WorldError::NotEnoughFreeCells`] if the field cannot hold every
/// unit, or a placement error if a unit is already on the field.
pub fn place_units(
    grid: &mut FieldGrid,
    units: &[UnitId],
    rng: &mut impl Rng,
) -> Result<(), WorldError> {
    let mut free = grid.free_cells();
    if free.len() < units.len() {
        return Err(WorldError::NotEnoughFreeCells {
            requested: units.len(),
            available: free.len(),
        });
    }
    for &unit in units {
        let pick = rng.random_range(0..free.len());
        let pos = free.swap_remove(pick);
        grid.place_unit(unit, pos)?;
        debug!(unit = %unit, pos = %pos, "Unit placed");
    }
    Ok(())
}
