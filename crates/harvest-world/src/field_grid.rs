//! The shared field: cell states, unit occupancy, and the ready-parcel index.
//!
//! [`FieldGrid`] is the spatial backbone of the simulation. It owns:
//!
//! - a row-major array of [`CellState`] values,
//! - a two-way occupancy index (`cell -> unit` and `unit -> cell`), so a unit
//!   has at most one position and a cell holds at most one unit,
//! - `parcels_ready`, an ordered set that always equals the set of cells in
//!   [`CellState::ReadyToHarvest`].
//!
//! Every mutating method validates its inputs before writing anything, so a
//! failed call leaves the grid exactly as it was.

use std::collections::{BTreeMap, BTreeSet};

use harvest_types::{CellState, Direction, GridPos, UnitId, manhattan_distance};

use crate::error::WorldError;

/// The discrete field shared by all units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldGrid {
    /// Width in cells.
    width: u32,
    /// Height in cells.
    height: u32,
    /// Cell states in row-major order.
    cells: Vec<CellState>,
    /// Cells currently ready to harvest, in row-major order.
    parcels_ready: BTreeSet<GridPos>,
    /// Occupancy: cell -> unit.
    occupants: BTreeMap<GridPos, UnitId>,
    /// Reverse occupancy: unit -> cell.
    positions: BTreeMap<UnitId, GridPos>,
    /// The single unload point.
    unload_point: GridPos,
    /// The single refuel station.
    refuel_station: GridPos,
}

impl FieldGrid {
    /// Create an empty field with its two fixtures in place.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDimensions`] for a zero width or height,
    /// or [`WorldError::InvalidFixtures`] if either fixture is out of bounds
    /// or both share a cell.
    pub fn new(
        width: u32,
        height: u32,
        unload_point: GridPos,
        refuel_station: GridPos,
    ) -> Result<Self, WorldError> {
        if width == 0 || height == 0 {
            return Err(WorldError::InvalidDimensions { width, height });
        }
        let in_bounds = |p: GridPos| p.x < width && p.y < height;
        if !in_bounds(unload_point) || !in_bounds(refuel_station) || unload_point == refuel_station
        {
            return Err(WorldError::InvalidFixtures {
                unload_point,
                refuel_station,
            });
        }

        let cell_count = usize::try_from(u64::from(width).saturating_mul(u64::from(height)))
            .map_err(|_err| WorldError::InvalidDimensions { width, height })?;

        let mut grid = Self {
            width,
            height,
            cells: vec![CellState::Empty; cell_count],
            parcels_ready: BTreeSet::new(),
            occupants: BTreeMap::new(),
            positions: BTreeMap::new(),
            unload_point,
            refuel_station,
        };
        grid.write_cell(unload_point, CellState::UnloadPoint)?;
        grid.write_cell(refuel_station, CellState::RefuelStation)?;
        Ok(grid)
    }

    // -------------------------------------------------------------------
    // Geometry
    // -------------------------------------------------------------------

    /// Field width in cells.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Field height in cells.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Whether `pos` lies inside the field.
    pub const fn contains(&self, pos: GridPos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// The unload point.
    pub const fn unload_point(&self) -> GridPos {
        self.unload_point
    }

    /// The refuel station.
    pub const fn refuel_station(&self) -> GridPos {
        self.refuel_station
    }

    /// The in-bounds orthogonal neighbors of `pos`, in up/down/left/right
    /// order.
    pub fn neighbors4(&self, pos: GridPos) -> Vec<GridPos> {
        Direction::ALL
            .iter()
            .filter_map(|&dir| pos.step(dir, self.width, self.height))
            .collect()
    }

    /// Manhattan distance between two cells.
    pub const fn manhattan_distance(a: GridPos, b: GridPos) -> u32 {
        manhattan_distance(a, b)
    }

    fn index(&self, pos: GridPos) -> Option<usize> {
        if !self.contains(pos) {
            return None;
        }
        let row = usize::try_from(pos.y).ok()?;
        let width = usize::try_from(self.width).ok()?;
        let col = usize::try_from(pos.x).ok()?;
        row.checked_mul(width)?.checked_add(col)
    }

    const fn out_of_bounds(&self, pos: GridPos) -> WorldError {
        WorldError::OutOfBounds {
            pos,
            width: self.width,
            height: self.height,
        }
    }

    // -------------------------------------------------------------------
    // Cell states
    // -------------------------------------------------------------------

    /// The state of a cell, or `None` outside the field.
    pub fn state_at(&self, pos: GridPos) -> Option<CellState> {
        self.index(pos).and_then(|i| self.cells.get(i)).copied()
    }

    /// Write a cell state, keeping `parcels_ready` in sync.
    ///
    /// Fixture cells cannot be overwritten and no other cell can become a
    /// fixture; writing a fixture cell's own state back is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] or [`WorldError::FixtureImmutable`].
    pub fn set_state(&mut self, pos: GridPos, state: CellState) -> Result<(), WorldError> {
        let current = self.state_at(pos).ok_or_else(|| self.out_of_bounds(pos))?;
        if current.is_fixture() || state.is_fixture() {
            if current == state {
                return Ok(());
            }
            return Err(WorldError::FixtureImmutable { pos });
        }
        self.write_cell(pos, state)
    }

    /// Unchecked-for-fixtures write used by the constructor and `set_state`.
    fn write_cell(&mut self, pos: GridPos, state: CellState) -> Result<(), WorldError> {
        let index = self.index(pos).ok_or_else(|| self.out_of_bounds(pos))?;
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(WorldError::OutOfBounds {
                pos,
                width: self.width,
                height: self.height,
            })?;
        *cell = state;
        if state == CellState::ReadyToHarvest {
            self.parcels_ready.insert(pos);
        } else {
            self.parcels_ready.remove(&pos);
        }
        Ok(())
    }

    /// Cells currently ready to harvest, in row-major order.
    pub const fn parcels_ready(&self) -> &BTreeSet<GridPos> {
        &self.parcels_ready
    }

    /// Number of cells in the given state.
    pub fn count_in_state(&self, state: CellState) -> usize {
        self.cells.iter().filter(|&&s| s == state).count()
    }

    /// Iterate over `(position, state)` pairs in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (GridPos, CellState)> + '_ {
        let width = self.width;
        (0..self.height)
            .flat_map(move |y| (0..width).map(move |x| GridPos::new(x, y)))
            .zip(self.cells.iter().copied())
    }

    /// Cell states as a row-major slice, for snapshots.
    pub fn cell_states(&self) -> &[CellState] {
        &self.cells
    }

    // -------------------------------------------------------------------
    // Occupancy
    // -------------------------------------------------------------------

    /// The unit standing on `pos`, if any.
    pub fn occupant_at(&self, pos: GridPos) -> Option<UnitId> {
        self.occupants.get(&pos).copied()
    }

    /// The cell a unit stands on, if it is placed.
    pub fn position_of(&self, unit: UnitId) -> Option<GridPos> {
        self.positions.get(&unit).copied()
    }

    /// Iterate over `(unit, position)` pairs in unit id order.
    pub fn unit_positions(&self) -> impl Iterator<Item = (UnitId, GridPos)> + '_ {
        self.positions.iter().map(|(&id, &pos)| (id, pos))
    }

    /// Non-fixture cells without a unit, in row-major order.
    pub fn free_cells(&self) -> Vec<GridPos> {
        self.cells()
            .filter(|&(pos, state)| !state.is_fixture() && !self.occupants.contains_key(&pos))
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Put a unit on the field for the first time.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`], [`WorldError::UnitAlreadyPlaced`],
    /// or [`WorldError::Occupied`].
    pub fn place_unit(&mut self, unit: UnitId, pos: GridPos) -> Result<(), WorldError> {
        if !self.contains(pos) {
            return Err(self.out_of_bounds(pos));
        }
        if let Some(existing) = self.position_of(unit) {
            return Err(WorldError::UnitAlreadyPlaced {
                unit,
                pos: existing,
            });
        }
        if let Some(occupant) = self.occupant_at(pos) {
            return Err(WorldError::Occupied { pos, occupant });
        }
        self.occupants.insert(pos, unit);
        self.positions.insert(unit, pos);
        Ok(())
    }

    /// Move a unit to `to`, returning the cell it left.
    ///
    /// Both occupancy indexes are updated together after all checks pass.
    /// Moving onto the unit's own cell succeeds without change.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnitNotPlaced`], [`WorldError::OutOfBounds`], or
    /// [`WorldError::Occupied`] when another unit holds `to`.
    pub fn move_unit(&mut self, unit: UnitId, to: GridPos) -> Result<GridPos, WorldError> {
        let from = self
            .position_of(unit)
            .ok_or(WorldError::UnitNotPlaced(unit))?;
        if !self.contains(to) {
            return Err(self.out_of_bounds(to));
        }
        if from == to {
            return Ok(from);
        }
        if let Some(occupant) = self.occupant_at(to) {
            return Err(WorldError::Occupied { pos: to, occupant });
        }
        self.occupants.remove(&from);
        self.occupants.insert(to, unit);
        self.positions.insert(unit, to);
        Ok(from)
    }

    // -------------------------------------------------------------------
    // Invariants
    // -------------------------------------------------------------------

    /// Check the structural invariants: `parcels_ready` mirrors the cell
    /// array, both occupancy indexes agree, and exactly one of each fixture
    /// exists.
    pub fn is_consistent(&self) -> bool {
        let ready: BTreeSet<GridPos> = self
            .cells()
            .filter(|&(_, s)| s == CellState::ReadyToHarvest)
            .map(|(p, _)| p)
            .collect();
        let occupancy_agrees = self.occupants.len() == self.positions.len()
            && self
                .positions
                .iter()
                .all(|(unit, pos)| self.occupants.get(pos) == Some(unit));
        ready == self.parcels_ready
            && occupancy_agrees
            && self.count_in_state(CellState::UnloadPoint) == 1
            && self.count_in_state(CellState::RefuelStation) == 1
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn field_5x5() -> FieldGrid {
        FieldGrid::new(5, 5, GridPos::new(0, 0), GridPos::new(4, 4)).unwrap()
    }

    #[test]
    fn new_places_fixtures() {
        let grid = field_5x5();
        assert_eq!(grid.state_at(GridPos::new(0, 0)), Some(CellState::UnloadPoint));
        assert_eq!(grid.state_at(GridPos::new(4, 4)), Some(CellState::RefuelStation));
        assert_eq!(grid.count_in_state(CellState::Empty), 23);
        assert!(grid.is_consistent());
    }

    #[test]
    fn new_rejects_bad_dimensions_and_fixtures() {
        assert!(matches!(
            FieldGrid::new(0, 3, GridPos::new(0, 0), GridPos::new(0, 1)),
            Err(WorldError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            FieldGrid::new(1, 1, GridPos::new(0, 0), GridPos::new(0, 0)),
            Err(WorldError::InvalidFixtures { .. })
        ));
        assert!(matches!(
            FieldGrid::new(3, 3, GridPos::new(0, 0), GridPos::new(3, 3)),
            Err(WorldError::InvalidFixtures { .. })
        ));
    }

    #[test]
    fn set_state_tracks_ready_parcels() {
        let mut grid = field_5x5();
        let p = GridPos::new(2, 2);
        grid.set_state(p, CellState::ReadyToHarvest).unwrap();
        assert!(grid.parcels_ready().contains(&p));
        grid.set_state(p, CellState::Harvested).unwrap();
        assert!(grid.parcels_ready().is_empty());
        assert!(grid.is_consistent());
    }

    #[test]
    fn fixtures_cannot_change() {
        let mut grid = field_5x5();
        let unload = grid.unload_point();
        assert_eq!(
            grid.set_state(unload, CellState::ReadyToHarvest),
            Err(WorldError::FixtureImmutable { pos: unload })
        );
        assert!(grid.set_state(GridPos::new(1, 1), CellState::RefuelStation).is_err());
        // Writing a fixture's own state back is tolerated.
        assert!(grid.set_state(unload, CellState::UnloadPoint).is_ok());
        assert!(grid.is_consistent());
    }

    #[test]
    fn set_state_out_of_bounds() {
        let mut grid = field_5x5();
        assert!(matches!(
            grid.set_state(GridPos::new(5, 0), CellState::Empty),
            Err(WorldError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn neighbors_on_corner_and_center() {
        let grid = field_5x5();
        assert_eq!(grid.neighbors4(GridPos::new(0, 0)).len(), 2);
        assert_eq!(grid.neighbors4(GridPos::new(4, 0)).len(), 2);
        assert_eq!(grid.neighbors4(GridPos::new(2, 0)).len(), 3);
        assert_eq!(
            grid.neighbors4(GridPos::new(2, 2)),
            vec![
                GridPos::new(2, 1),
                GridPos::new(2, 3),
                GridPos::new(1, 2),
                GridPos::new(3, 2),
            ]
        );
    }

    #[test]
    fn move_unit_updates_both_indexes() {
        let mut grid = field_5x5();
        let unit = UnitId::new(0);
        grid.place_unit(unit, GridPos::new(1, 1)).unwrap();
        let from = grid.move_unit(unit, GridPos::new(1, 2)).unwrap();
        assert_eq!(from, GridPos::new(1, 1));
        assert_eq!(grid.occupant_at(GridPos::new(1, 1)), None);
        assert_eq!(grid.occupant_at(GridPos::new(1, 2)), Some(unit));
        assert_eq!(grid.position_of(unit), Some(GridPos::new(1, 2)));
        assert!(grid.is_consistent());
    }

    #[test]
    fn move_into_occupied_cell_fails_without_change() {
        let mut grid = field_5x5();
        let a = UnitId::new(0);
        let b = UnitId::new(1);
        grid.place_unit(a, GridPos::new(1, 1)).unwrap();
        grid.place_unit(b, GridPos::new(1, 2)).unwrap();
        let before = grid.clone();
        assert_eq!(
            grid.move_unit(a, GridPos::new(1, 2)),
            Err(WorldError::Occupied {
                pos: GridPos::new(1, 2),
                occupant: b
            })
        );
        assert_eq!(grid, before);
    }

    #[test]
    fn move_unplaced_unit_fails() {
        let mut grid = field_5x5();
        assert_eq!(
            grid.move_unit(UnitId::new(9), GridPos::new(1, 1)),
            Err(WorldError::UnitNotPlaced(UnitId::new(9)))
        );
    }

    #[test]
    fn place_unit_twice_fails() {
        let mut grid = field_5x5();
        let unit = UnitId::new(0);
        grid.place_unit(unit, GridPos::new(1, 1)).unwrap();
        assert!(matches!(
            grid.place_unit(unit, GridPos::new(2, 2)),
            Err(WorldError::UnitAlreadyPlaced { .. })
        ));
    }

    #[test]
    fn free_cells_exclude_fixtures_and_units() {
        let mut grid = field_5x5();
        grid.place_unit(UnitId::new(0), GridPos::new(1, 0)).unwrap();
        let free = grid.free_cells();
        assert_eq!(free.len(), 22);
        assert!(!free.contains(&GridPos::new(0, 0)));
        assert!(!free.contains(&GridPos::new(1, 0)));
        assert_eq!(free.first().copied(), Some(GridPos::new(2, 0)));
    }

    #[test]
    fn manhattan_helper() {
        assert_eq!(
            FieldGrid::manhattan_distance(GridPos::new(0, 0), GridPos::new(3, 4)),
            7
        );
    }
}
