//! Per-step activity records.
//!
//! Every unit produces exactly one [`ActivityRecord`] per step. The ordered
//! list of records is the observable action sequence of a run: two runs with
//! the same seed, configuration, and initial value tables must produce equal
//! sequences.

use serde::{Deserialize, Serialize};

use crate::enums::{Action, TargetKind};
use crate::grid::GridPos;
use crate::ids::UnitId;

/// Why a unit did (or did not) act this step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    /// Under repair. `remaining` is the count left after this step; zero
    /// means the unit is active again from the next step.
    Repairing {
        /// Repair steps left.
        remaining: u32,
    },
    /// Out of fuel.
    Stalled,
    /// The unit has no position on the field.
    Unplaced,
    /// The policy had nothing to do.
    Idle,
    /// The unit took an action.
    Acted,
}

/// Outcome of a movement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    /// The unit moved one cell.
    Moved {
        /// Cell left behind.
        from: GridPos,
        /// Cell entered.
        to: GridPos,
    },
    /// The destination cell was held by another unit.
    Blocked {
        /// The cell the unit tried to enter.
        toward: GridPos,
    },
    /// The move would have left the field.
    OutOfBounds,
    /// No path to the target exists; the unit stays put.
    NoRoute,
    /// The unit was already on its target.
    Arrived,
}

/// Effect applied at the unit's cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// A ready parcel was harvested.
    Harvested {
        /// The harvested cell.
        at: GridPos,
        /// Cargo added.
        amount: u32,
    },
    /// Cargo was unloaded.
    Unloaded {
        /// Cargo removed.
        amount: u32,
    },
    /// The tank was refilled.
    Refueled {
        /// Fuel added.
        amount: u32,
    },
    /// The action was not valid where the unit stood.
    Rejected {
        /// The rejected action.
        action: Action,
    },
}

/// Everything a single unit did during one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// The acting unit.
    pub unit_id: UnitId,
    /// Why the unit did or did not act.
    pub status: ActivityStatus,
    /// The primitive action chosen by a learned policy.
    pub action: Option<Action>,
    /// The target chosen by a priority policy.
    pub target: Option<TargetKind>,
    /// Movement outcome, if the unit tried to move.
    pub movement: Option<Movement>,
    /// Effect applied, if any.
    pub effect: Option<Effect>,
    /// Whether the unit broke down after moving.
    pub broke_down: bool,
    /// Reward observed by a learned policy.
    pub reward: Option<f64>,
}

impl ActivityRecord {
    /// A record for a unit that did not act.
    pub const fn passive(unit_id: UnitId, status: ActivityStatus) -> Self {
        Self {
            unit_id,
            status,
            action: None,
            target: None,
            movement: None,
            effect: None,
            broke_down: false,
            reward: None,
        }
    }

    /// A record for a unit that acted; fields are filled in by the caller.
    pub const fn acted(unit_id: UnitId) -> Self {
        Self::passive(unit_id, ActivityStatus::Acted)
    }

    /// Whether the unit changed cell this step.
    pub const fn moved(&self) -> bool {
        matches!(self.movement, Some(Movement::Moved { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passive_record_has_no_action() {
        let record = ActivityRecord::passive(UnitId::new(0), ActivityStatus::Stalled);
        assert!(!record.moved());
        assert!(record.action.is_none());
        assert!(!record.broke_down);
    }

    #[test]
    fn moved_detects_movement() {
        let mut record = ActivityRecord::acted(UnitId::new(1));
        record.movement = Some(Movement::Moved {
            from: GridPos::new(0, 0),
            to: GridPos::new(1, 0),
        });
        assert!(record.moved());
    }
}
