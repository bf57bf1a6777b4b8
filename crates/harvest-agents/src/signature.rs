//! Building a unit's [`StateSignature`] from the field.

use harvest_types::{
    CellState, CropSignal, Direction, FuelBucket, GridPos, LoadBucket, StateSignature, UnitId,
};
use harvest_world::FieldGrid;

use crate::config::UnitParams;

/// Observe the state signature of a unit standing at `pos`.
///
/// Neighbors follow [`Direction::ALL`] order. An out-of-bounds neighbor reads
/// as [`CropSignal::OutOfBounds`] and unoccupied.
pub fn observe(
    grid: &FieldGrid,
    unit: UnitId,
    pos: GridPos,
    fuel: u32,
    load: u32,
    params: &UnitParams,
) -> StateSignature {
    let mut crops = [CropSignal::OutOfBounds; 4];
    let mut occupied = [false; 4];

    let slots = Direction::ALL
        .iter()
        .zip(crops.iter_mut())
        .zip(occupied.iter_mut());
    for ((direction, crop), busy) in slots {
        let Some(neighbor) = pos.step(*direction, grid.width(), grid.height()) else {
            continue;
        };
        *crop = if grid.state_at(neighbor) == Some(CellState::ReadyToHarvest) {
            CropSignal::Ready
        } else {
            CropSignal::Bare
        };
        *busy = grid.occupant_at(neighbor).is_some_and(|other| other != unit);
    }

    StateSignature {
        fuel: if fuel <= params.fuel_threshold {
            FuelBucket::Low
        } else {
            FuelBucket::High
        },
        load: if load >= params.capacity {
            LoadBucket::Full
        } else {
            LoadBucket::NotFull
        },
        crops,
        occupied,
    }
}
