//! Enumeration types for the harvest fleet simulation.

use serde::{Deserialize, Serialize};

use crate::grid::Direction;

// ---------------------------------------------------------------------------
// Cell state
// ---------------------------------------------------------------------------

/// State of a single field cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    /// Bare soil. May grow a crop through the crop lifecycle.
    #[default]
    Empty,
    /// A mature crop that a unit can harvest.
    ReadyToHarvest,
    /// A parcel that has already been harvested.
    Harvested,
    /// The single refuel station.
    RefuelStation,
    /// The single unload point.
    UnloadPoint,
}

impl CellState {
    /// Whether the state marks one of the two permanent fixtures.
    pub const fn is_fixture(self) -> bool {
        matches!(self, Self::RefuelStation | Self::UnloadPoint)
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// A primitive action in the learned policy's action space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Move one cell up.
    MoveUp,
    /// Move one cell down.
    MoveDown,
    /// Move one cell left.
    MoveLeft,
    /// Move one cell right.
    MoveRight,
    /// Harvest the crop under the unit.
    Harvest,
    /// Unload cargo at the unload point.
    Unload,
    /// Refuel at the refuel station.
    Refuel,
}

impl Action {
    /// Number of actions in the action space.
    pub const COUNT: usize = 7;

    /// All actions, in value-table column order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::MoveUp,
        Self::MoveDown,
        Self::MoveLeft,
        Self::MoveRight,
        Self::Harvest,
        Self::Unload,
        Self::Refuel,
    ];

    /// Column index of this action in a value-table row.
    pub const fn index(self) -> usize {
        match self {
            Self::MoveUp => 0,
            Self::MoveDown => 1,
            Self::MoveLeft => 2,
            Self::MoveRight => 3,
            Self::Harvest => 4,
            Self::Unload => 5,
            Self::Refuel => 6,
        }
    }

    /// The movement direction for move actions, `None` otherwise.
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::MoveUp => Some(Direction::Up),
            Self::MoveDown => Some(Direction::Down),
            Self::MoveLeft => Some(Direction::Left),
            Self::MoveRight => Some(Direction::Right),
            Self::Harvest | Self::Unload | Self::Refuel => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Policy selection
// ---------------------------------------------------------------------------

/// Which decision strategy drives the fleet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Fixed precedence: unload when full, refuel when low, else nearest parcel.
    #[default]
    Priority,
    /// Epsilon-greedy Q-learning over primitive actions.
    Learned,
}

/// What a priority-policy unit is heading for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// The unload point (cargo full, or returning when idle).
    UnloadPoint,
    /// The refuel station (fuel at or below threshold).
    RefuelStation,
    /// The nearest ready parcel.
    Parcel,
}

// ---------------------------------------------------------------------------
// Operational state
// ---------------------------------------------------------------------------

/// Operational state of a unit.
///
/// A broken-down unit always has at least one repair step left; it turns
/// back to [`OperationalState::Active`] on the step its counter reaches zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationalState {
    /// The unit can act.
    #[default]
    Active,
    /// The unit is being repaired and cannot act.
    BrokenDown {
        /// Steps left before the unit is operational again.
        remaining: u32,
    },
}

impl OperationalState {
    /// Whether the unit can act this step.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_indices_match_order() {
        for (i, action) in Action::ALL.iter().enumerate() {
            assert_eq!(action.index(), i);
        }
    }

    #[test]
    fn only_moves_have_directions() {
        let moves = Action::ALL.iter().filter(|a| a.direction().is_some()).count();
        assert_eq!(moves, 4);
        assert_eq!(Action::Harvest.direction(), None);
    }

    #[test]
    fn fixtures_are_detected() {
        assert!(CellState::RefuelStation.is_fixture());
        assert!(CellState::UnloadPoint.is_fixture());
        assert!(!CellState::ReadyToHarvest.is_fixture());
    }

    #[test]
    fn cell_state_serializes_snake_case() {
        let json = serde_json::to_string(&CellState::ReadyToHarvest).unwrap_or_default();
        assert_eq!(json, "\"ready_to_harvest\"");
    }
}
