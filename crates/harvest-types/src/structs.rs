//! Boundary structs: rendering snapshots and value-table persistence rows.

use serde::{Deserialize, Serialize};

use crate::enums::{Action, CellState, OperationalState};
use crate::grid::GridPos;
use crate::ids::UnitId;
use crate::signature::StateSignature;

/// Read-only view of one unit for an external renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// Unit identifier.
    pub id: UnitId,
    /// Current cell, if placed.
    pub position: Option<GridPos>,
    /// Current fuel level.
    pub fuel: u32,
    /// Current cargo load.
    pub load: u32,
    /// Operational state.
    pub state: OperationalState,
}

/// Read-only view of the whole field after a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    /// The step this snapshot was taken after (0 = initial state).
    pub step: u64,
    /// Field width in cells.
    pub width: u32,
    /// Field height in cells.
    pub height: u32,
    /// Cell states in row-major order (`y * width + x`).
    pub cells: Vec<CellState>,
    /// All units in id order.
    pub units: Vec<UnitSnapshot>,
}

impl FieldSnapshot {
    /// Look up the state of a cell in the snapshot.
    pub fn cell(&self, pos: GridPos) -> Option<CellState> {
        if pos.x >= self.width || pos.y >= self.height {
            return None;
        }
        let index = usize::try_from(pos.y)
            .ok()?
            .checked_mul(usize::try_from(self.width).ok()?)?
            .checked_add(usize::try_from(pos.x).ok()?)?;
        self.cells.get(index).copied()
    }
}

/// One persisted value-table estimate: `(signature, action) -> value`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueTableEntry {
    /// Observed state.
    pub signature: StateSignature,
    /// Action taken in that state.
    pub action: Action,
    /// Estimated discounted return.
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_cell_lookup_is_row_major() {
        let snapshot = FieldSnapshot {
            step: 0,
            width: 2,
            height: 2,
            cells: vec![
                CellState::UnloadPoint,
                CellState::Empty,
                CellState::ReadyToHarvest,
                CellState::RefuelStation,
            ],
            units: Vec::new(),
        };
        assert_eq!(snapshot.cell(GridPos::new(0, 1)), Some(CellState::ReadyToHarvest));
        assert_eq!(snapshot.cell(GridPos::new(1, 1)), Some(CellState::RefuelStation));
        assert_eq!(snapshot.cell(GridPos::new(2, 0)), None);
    }
}
