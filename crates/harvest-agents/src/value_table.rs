//! Per-unit action-value table for the learned policy.
//!
//! Rows are keyed by [`StateSignature`] and hold one estimate per
//! [`Action`]. Rows are created lazily with every estimate at `0.0`, and a
//! missing row reads as all zeros.

use std::collections::BTreeMap;

use harvest_types::{Action, StateSignature, ValueTableEntry};

use crate::error::AgentError;

/// One row of estimates, indexed by [`Action::index`].
type Row = [f64; Action::COUNT];

/// Q-value estimates for a single unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueTable {
    rows: BTreeMap<StateSignature, Row>,
}

impl ValueTable {
    /// An empty table.
    pub const fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }

    /// Number of states with a stored row.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no state has been visited yet.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The estimate for `(signature, action)`, `0.0` if never written.
    pub fn value(&self, signature: &StateSignature, action: Action) -> f64 {
        self.rows
            .get(signature)
            .and_then(|row| row.get(action.index()))
            .copied()
            .unwrap_or(0.0)
    }

    /// The largest estimate over all actions in `signature`.
    pub fn max_value(&self, signature: &StateSignature) -> f64 {
        self.rows.get(signature).map_or(0.0, |row| {
            row.iter().copied().fold(f64::NEG_INFINITY, f64::max)
        })
    }

    /// Every action whose estimate equals the maximum, in [`Action::ALL`]
    /// order. Never empty.
    pub fn best_actions(&self, signature: &StateSignature) -> Vec<Action> {
        let best = self.max_value(signature);
        Action::ALL
            .iter()
            .copied()
            .filter(|&action| self.value(signature, action).total_cmp(&best).is_eq())
            .collect()
    }

    /// Apply one Q-learning update:
    /// `Q(s,a) += alpha * (reward + gamma * max Q(s',.) - Q(s,a))`.
    ///
    /// Returns the new estimate.
    pub fn update(
        &mut self,
        signature: StateSignature,
        action: Action,
        reward: f64,
        next: &StateSignature,
        alpha: f64,
        gamma: f64,
    ) -> f64 {
        let next_max = self.max_value(next);
        let row = self.rows.entry(signature).or_insert([0.0; Action::COUNT]);
        let Some(current) = row.get_mut(action.index()) else {
            return 0.0;
        };
        let td_error = gamma.mul_add(next_max, reward) - *current;
        *current = alpha.mul_add(td_error, *current);
        *current
    }

    /// Flatten into persistence rows in signature then action order.
    pub fn to_entries(&self) -> Vec<ValueTableEntry> {
        self.rows
            .iter()
            .flat_map(|(&signature, row)| {
                Action::ALL
                    .iter()
                    .zip(row.iter())
                    .map(move |(&action, &value)| ValueTableEntry {
                        signature,
                        action,
                        value,
                    })
            })
            .collect()
    }

    /// Rebuild a table from persistence rows. Later rows for the same key
    /// overwrite earlier ones.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::NonFiniteValue`] if any value is NaN or
    /// infinite; a table with such a value is unusable as a whole.
    pub fn from_entries(entries: &[ValueTableEntry]) -> Result<Self, AgentError> {
        let mut table = Self::new();
        for entry in entries {
            if !entry.value.is_finite() {
                return Err(AgentError::NonFiniteValue {
                    signature: entry.signature,
                    action: entry.action,
                    value: entry.value,
                });
            }
            let row = table
                .rows
                .entry(entry.signature)
                .or_insert([0.0; Action::COUNT]);
            if let Some(slot) = row.get_mut(entry.action.index()) {
                *slot = entry.value;
            }
        }
        Ok(table)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use harvest_types::{CropSignal, FuelBucket, LoadBucket};

    use super::*;

    fn sig(fuel: FuelBucket) -> StateSignature {
        StateSignature {
            fuel,
            load: LoadBucket::NotFull,
            crops: [CropSignal::Bare; 4],
            occupied: [false; 4],
        }
    }

    #[test]
    fn unseen_state_reads_zero_and_ties_everything() {
        let table = ValueTable::new();
        let s = sig(FuelBucket::High);
        assert_eq!(table.value(&s, Action::Harvest), 0.0);
        assert_eq!(table.max_value(&s), 0.0);
        assert_eq!(table.best_actions(&s), Action::ALL.to_vec());
    }

    #[test]
    fn update_follows_q_learning_rule() {
        let mut table = ValueTable::new();
        let s = sig(FuelBucket::High);
        let next = sig(FuelBucket::Low);
        // Next state's best value is 2.0.
        table.update(next, Action::Refuel, 20.0, &next, 0.1, 0.0);
        assert!((table.max_value(&next) - 2.0).abs() < 1e-12);

        let v = table.update(s, Action::MoveUp, -1.0, &next, 0.5, 0.9);
        // 0 + 0.5 * (-1 + 0.9 * 2 - 0) = 0.4
        assert!((v - 0.4).abs() < 1e-12);
        assert_eq!(table.best_actions(&s), vec![Action::MoveUp]);
    }

    #[test]
    fn negative_row_still_has_a_best_action() {
        let mut table = ValueTable::new();
        let s = sig(FuelBucket::High);
        for action in Action::ALL {
            table.update(s, action, -5.0, &s, 1.0, 0.0);
        }
        table.update(s, Action::Unload, -1.0, &s, 1.0, 0.0);
        assert_eq!(table.best_actions(&s), vec![Action::Unload]);
    }

    #[test]
    fn entries_rebuild_the_same_table() {
        let mut table = ValueTable::new();
        table.update(sig(FuelBucket::High), Action::Harvest, 9.0, &sig(FuelBucket::High), 0.1, 0.9);
        table.update(sig(FuelBucket::Low), Action::Refuel, 4.0, &sig(FuelBucket::High), 0.1, 0.9);
        let entries = table.to_entries();
        assert_eq!(entries.len(), 2 * Action::COUNT);
        assert_eq!(ValueTable::from_entries(&entries).unwrap(), table);
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let entries = [ValueTableEntry {
            signature: sig(FuelBucket::High),
            action: Action::Harvest,
            value: f64::NAN,
        }];
        assert!(matches!(
            ValueTable::from_entries(&entries),
            Err(AgentError::NonFiniteValue { .. })
        ));
    }
}
