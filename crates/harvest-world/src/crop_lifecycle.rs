//! Stochastic crop growth and withering.
//!
//! Once per step, before any unit acts, every `Empty` cell may sprout into
//! `ReadyToHarvest` and every `ReadyToHarvest` cell may wither back to
//! `Empty`. Harvested cells and fixtures never change here. Cells are
//! visited in row-major order with exactly one draw per eligible cell.

use harvest_types::CellState;
use rand::Rng;
use tracing::debug;

use crate::chance::roll;
use crate::error::{WorldError, check_probability};
use crate::field_grid::FieldGrid;

/// Counts of crop transitions applied during one advance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CropTransitions {
    /// Cells that became ready to harvest.
    pub grown: u32,
    /// Ready cells that withered back to empty.
    pub withered: u32,
}

/// Per-step crop growth rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropLifecycle {
    growth_chance: f64,
    wither_chance: f64,
    enabled: bool,
}

impl CropLifecycle {
    /// Create an enabled lifecycle.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidProbability`] if either chance lies
    /// outside `[0, 1]`.
    pub fn new(growth_chance: f64, wither_chance: f64) -> Result<Self, WorldError> {
        Ok(Self {
            growth_chance: check_probability("growth_chance", growth_chance)?,
            wither_chance: check_probability("wither_chance", wither_chance)?,
            enabled: true,
        })
    }

    /// A lifecycle that never changes the field and consumes no draws.
    pub const fn disabled() -> Self {
        Self {
            growth_chance: 0.0,
            wither_chance: 0.0,
            enabled: false,
        }
    }

    /// Whether the lifecycle runs at all.
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Apply one step of growth and withering to `grid`.
    pub fn advance(
        &self,
        grid: &mut FieldGrid,
        rng: &mut impl Rng,
    ) -> Result<CropTransitions, WorldError> {
        let mut transitions = CropTransitions::default();
        if !self.enabled {
            return Ok(transitions);
        }

        let eligible: Vec<_> = grid
            .cells()
            .filter(|&(_, state)| {
                matches!(state, CellState::Empty | CellState::ReadyToHarvest)
            })
            .collect();

        for (pos, state) in eligible {
            match state {
                CellState::Empty => {
                    if roll(rng, self.growth_chance) {
                        grid.set_state(pos, CellState::ReadyToHarvest)?;
                        transitions.grown = transitions.grown.saturating_add(1);
                    }
                }
                CellState::ReadyToHarvest => {
                    if roll(rng, self.wither_chance) {
                        grid.set_state(pos, CellState::Empty)?;
                        transitions.withered = transitions.withered.saturating_add(1);
                    }
                }
                CellState::Harvested | CellState::RefuelStation | CellState::UnloadPoint => {}
            }
        }

        debug!(
            grown = transitions.grown,
            withered = transitions.withered,
            ready = grid.parcels_ready().len(),
            "Crop lifecycle advanced"
        );
        Ok(transitions)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use harvest_types::GridPos;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn field() -> FieldGrid {
        FieldGrid::new(4, 4, GridPos::new(0, 0), GridPos::new(3, 3)).unwrap()
    }

    #[test]
    fn rejects_bad_probabilities() {
        assert!(CropLifecycle::new(1.5, 0.0).is_err());
        assert!(CropLifecycle::new(0.0, -0.1).is_err());
        assert!(CropLifecycle::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn certain_growth_fills_empty_cells() {
        let mut grid = field();
        grid.set_state(GridPos::new(1, 1), CellState::Harvested).unwrap();
        let lifecycle = CropLifecycle::new(1.0, 0.0).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        let t = lifecycle.advance(&mut grid, &mut rng).unwrap();
        assert_eq!(t.grown, 13);
        assert_eq!(t.withered, 0);
        // Harvested and fixture cells are untouched.
        assert_eq!(grid.state_at(GridPos::new(1, 1)), Some(CellState::Harvested));
        assert_eq!(grid.state_at(GridPos::new(0, 0)), Some(CellState::UnloadPoint));
        assert!(grid.is_consistent());
    }

    #[test]
    fn certain_withering_clears_ready_cells() {
        let mut grid = field();
        grid.set_state(GridPos::new(2, 1), CellState::ReadyToHarvest).unwrap();
        let lifecycle = CropLifecycle::new(0.0, 1.0).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        let t = lifecycle.advance(&mut grid, &mut rng).unwrap();
        assert_eq!(t, CropTransitions { grown: 0, withered: 1 });
        assert!(grid.parcels_ready().is_empty());
    }

    #[test]
    fn disabled_consumes_no_draws() {
        let mut grid = field();
        let mut a = SmallRng::seed_from_u64(3);
        let mut b = SmallRng::seed_from_u64(3);
        let t = CropLifecycle::disabled().advance(&mut grid, &mut a).unwrap();
        assert_eq!(t, CropTransitions::default());
        assert_eq!(a.random::<u64>(), b.random::<u64>());
    }

    #[test]
    fn same_seed_same_field() {
        let lifecycle = CropLifecycle::new(0.3, 0.2).unwrap();
        let mut g1 = field();
        let mut g2 = field();
        let mut r1 = SmallRng::seed_from_u64(99);
        let mut r2 = SmallRng::seed_from_u64(99);
        for _ in 0..10 {
            lifecycle.advance(&mut g1, &mut r1).unwrap();
            lifecycle.advance(&mut g2, &mut r2).unwrap();
        }
        assert_eq!(g1, g2);
        assert!(g1.is_consistent());
    }
}
