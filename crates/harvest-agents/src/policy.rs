//! Decision policies.
//!
//! A unit carries exactly one [`AgentPolicy`]:
//!
//! - [`AgentPolicy::Priority`] picks a target cell by fixed rules and
//!   follows the A* path toward it.
//! - [`AgentPolicy::Learned`] picks one primitive [`Action`] per step with
//!   epsilon-greedy Q-learning and never uses pathfinding.

use harvest_types::{Action, GridPos, StateSignature, TargetKind};
use harvest_world::{FieldGrid, roll};
use rand::Rng;

use crate::config::{LearningParams, UnitParams};
use crate::value_table::ValueTable;

/// The decision strategy of one unit.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentPolicy {
    /// Deterministic target selection plus A* movement.
    Priority,
    /// Epsilon-greedy Q-learning over primitive actions.
    Learned(QLearner),
}

impl AgentPolicy {
    /// The unit's value table, if the policy learns.
    pub const fn value_table(&self) -> Option<&ValueTable> {
        match self {
            Self::Priority => None,
            Self::Learned(learner) => Some(learner.table()),
        }
    }
}

// ---------------------------------------------------------------------------
// Priority rules
// ---------------------------------------------------------------------------

/// Choose the priority target for a unit at `pos`.
///
/// In order: a full unit heads to the unload point; a unit at or below the
/// fuel threshold heads to the refuel station; otherwise the nearest ready
/// parcel by Manhattan distance, first in row-major order on ties. With no
/// parcels left a loaded unit heads home to deliver its cargo, unless
/// `return_to_unload_when_idle` is switched off; an empty unit idles.
pub fn priority_target(
    grid: &FieldGrid,
    pos: GridPos,
    fuel: u32,
    load: u32,
    params: &UnitParams,
) -> Option<(TargetKind, GridPos)> {
    if load >= params.capacity {
        return Some((TargetKind::UnloadPoint, grid.unload_point()));
    }
    if fuel <= params.fuel_threshold {
        return Some((TargetKind::RefuelStation, grid.refuel_station()));
    }
    let nearest = grid
        .parcels_ready()
        .iter()
        .copied()
        .min_by_key(|&parcel| FieldGrid::manhattan_distance(pos, parcel));
    match nearest {
        Some(parcel) => Some((TargetKind::Parcel, parcel)),
        None if params.return_to_unload_when_idle && load > 0 => {
            Some((TargetKind::UnloadPoint, grid.unload_point()))
        }
        None => None,
    }
}

// ---------------------------------------------------------------------------
// Q-learning
// ---------------------------------------------------------------------------

/// The last `(state, action, reward)` awaiting its successor state.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingTransition {
    signature: StateSignature,
    action: Action,
    reward: f64,
}

/// Epsilon-greedy Q-learner with a one-step delayed update.
///
/// The reward for an action is only known after it is applied, and the
/// successor state only when the unit next observes the field. The learner
/// therefore keeps the last transition pending and settles it against the
/// next observed signature.
#[derive(Debug, Clone, PartialEq)]
pub struct QLearner {
    table: ValueTable,
    params: LearningParams,
    pending: Option<PendingTransition>,
}

impl QLearner {
    /// A learner starting from `table`.
    pub const fn new(table: ValueTable, params: LearningParams) -> Self {
        Self {
            table,
            params,
            pending: None,
        }
    }

    /// The current estimates.
    pub const fn table(&self) -> &ValueTable {
        &self.table
    }

    /// Whether a transition is waiting for its successor state.
    pub const fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Choose an action for `signature`.
    ///
    /// One draw decides exploration. Exploring draws a uniform action;
    /// exploiting draws among the maximizers only when there is a tie.
    pub fn choose(&self, signature: &StateSignature, rng: &mut impl Rng) -> Action {
        if roll(rng, self.params.epsilon) {
            return Action::ALL
                .get(rng.random_range(0..Action::COUNT))
                .copied()
                .unwrap_or(Action::Harvest);
        }
        let best = self.table.best_actions(signature);
        if best.len() > 1 {
            best.get(rng.random_range(0..best.len()))
                .copied()
                .unwrap_or(Action::Harvest)
        } else {
            best.first().copied().unwrap_or(Action::Harvest)
        }
    }

    /// Remember the transition just taken.
    pub const fn record(&mut self, signature: StateSignature, action: Action, reward: f64) {
        self.pending = Some(PendingTransition {
            signature,
            action,
            reward,
        });
    }

    /// Apply the pending update against the successor `next`. Returns the
    /// updated estimate, or `None` if nothing was pending.
    pub fn settle(&mut self, next: &StateSignature) -> Option<f64> {
        let pending = self.pending.take()?;
        Some(self.table.update(
            pending.signature,
            pending.action,
            pending.reward,
            next,
            self.params.alpha,
            self.params.gamma,
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use harvest_types::{CellState, CropSignal, FuelBucket, LoadBucket};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn grid() -> FieldGrid {
        FieldGrid::new(6, 6, GridPos::new(0, 0), GridPos::new(5, 5)).unwrap()
    }

    #[test]
    fn full_unit_heads_to_unload() {
        let mut g = grid();
        g.set_state(GridPos::new(2, 2), CellState::ReadyToHarvest).unwrap();
        let params = UnitParams::default();
        let target = priority_target(&g, GridPos::new(2, 3), 5, params.capacity, &params);
        assert_eq!(target, Some((TargetKind::UnloadPoint, GridPos::new(0, 0))));
    }

    #[test]
    fn low_fuel_beats_a_closer_parcel() {
        let mut g = grid();
        g.set_state(GridPos::new(2, 2), CellState::ReadyToHarvest).unwrap();
        let params = UnitParams::default();
        let target = priority_target(&g, GridPos::new(2, 3), params.fuel_threshold, 0, &params);
        assert_eq!(target, Some((TargetKind::RefuelStation, GridPos::new(5, 5))));
    }

    #[test]
    fn nearest_parcel_with_row_major_ties() {
        let mut g = grid();
        g.set_state(GridPos::new(3, 1), CellState::ReadyToHarvest).unwrap();
        g.set_state(GridPos::new(1, 3), CellState::ReadyToHarvest).unwrap();
        g.set_state(GridPos::new(5, 0), CellState::ReadyToHarvest).unwrap();
        let params = UnitParams::default();
        let target = priority_target(&g, GridPos::new(2, 2), 50, 0, &params);
        assert_eq!(target, Some((TargetKind::Parcel, GridPos::new(3, 1))));
    }

    #[test]
    fn loaded_unit_goes_home_when_parcels_run_out() {
        let g = grid();
        let mut params = UnitParams::default();
        assert_eq!(
            priority_target(&g, GridPos::new(2, 2), 50, 3, &params),
            Some((TargetKind::UnloadPoint, GridPos::new(0, 0)))
        );
        assert_eq!(priority_target(&g, GridPos::new(2, 2), 50, 0, &params), None);
        params.return_to_unload_when_idle = false;
        assert_eq!(priority_target(&g, GridPos::new(2, 2), 50, 3, &params), None);
    }

    fn sig() -> StateSignature {
        StateSignature {
            fuel: FuelBucket::High,
            load: LoadBucket::NotFull,
            crops: [CropSignal::Bare; 4],
            occupied: [false; 4],
        }
    }

    #[test]
    fn greedy_learner_picks_the_unique_best() {
        let mut table = ValueTable::new();
        table.update(sig(), Action::MoveLeft, 3.0, &sig(), 1.0, 0.0);
        let learner = QLearner::new(
            table,
            LearningParams {
                epsilon: 0.0,
                ..LearningParams::default()
            },
        );
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..20 {
            assert_eq!(learner.choose(&sig(), &mut rng), Action::MoveLeft);
        }
    }

    #[test]
    fn full_exploration_ignores_the_table() {
        let mut table = ValueTable::new();
        table.update(sig(), Action::Harvest, 50.0, &sig(), 1.0, 0.0);
        let learner = QLearner::new(
            table,
            LearningParams {
                epsilon: 1.0,
                ..LearningParams::default()
            },
        );
        let mut rng = SmallRng::seed_from_u64(11);
        let seen: BTreeSet<Action> = (0..500).map(|_| learner.choose(&sig(), &mut rng)).collect();
        assert_eq!(seen.len(), Action::COUNT);
    }

    #[test]
    fn ties_break_only_among_the_best_actions() {
        let mut table = ValueTable::new();
        table.update(sig(), Action::MoveLeft, 3.0, &sig(), 1.0, 0.0);
        table.update(sig(), Action::Harvest, 3.0, &sig(), 1.0, 0.0);
        table.update(sig(), Action::Refuel, 1.0, &sig(), 1.0, 0.0);
        let learner = QLearner::new(
            table,
            LearningParams {
                epsilon: 0.0,
                ..LearningParams::default()
            },
        );
        let mut rng = SmallRng::seed_from_u64(2);
        let seen: BTreeSet<Action> = (0..200).map(|_| learner.choose(&sig(), &mut rng)).collect();
        assert_eq!(
            seen,
            BTreeSet::from([Action::MoveLeft, Action::Harvest])
        );
    }

    #[test]
    fn settle_consumes_the_pending_transition() {
        let mut learner = QLearner::new(ValueTable::new(), LearningParams::default());
        assert_eq!(learner.settle(&sig()), None);
        learner.record(sig(), Action::Harvest, 9.0);
        assert!(learner.has_pending());
        let v = learner.settle(&sig()).unwrap();
        assert!((v - 0.9).abs() < 1e-12);
        assert!(!learner.has_pending());
    }
}
