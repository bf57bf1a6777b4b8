//! The step scheduler: one [`Simulation`] value owns the whole run.
//!
//! Each call to [`Simulation::step`] runs, in order:
//!
//! 1. **Clock** -- advance the step counter.
//! 2. **Crops** -- advance the crop lifecycle (row-major draws).
//! 3. **Units** -- step every unit once, in id order.
//! 4. **Metrics** -- summarize the step.
//!
//! All randomness flows through one `StdRng` seeded from the configuration,
//! so a run is fully determined by its seed, configuration, and initial
//! value tables.

use harvest_agents::{
    AgentError, AgentPolicy, QLearner, Unit, UnitParams, settle_pending, step_unit,
};
use harvest_types::{
    ActivityRecord, CellState, FieldSnapshot, PolicyKind, UnitId, UnitSnapshot,
};
use harvest_world::{
    CropLifecycle, CropTransitions, FieldGrid, Heuristic, Manhattan, PathFinder, WorldError,
    place_units,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::clock::{ClockError, StepClock};
use crate::config::{ConfigError, SimulationConfig};
use crate::persistence::PersistedTables;

/// Errors that can occur while building a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// The configuration was rejected.
    #[error("configuration error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// The field could not be built or populated.
    #[error("field setup error: {source}")]
    World {
        /// The underlying field error.
        #[from]
        source: WorldError,
    },

    /// Unit parameters were rejected.
    #[error("unit setup error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },
}

/// Errors that can occur during step execution.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// A field operation failed.
    #[error("field error: {source}")]
    World {
        /// The underlying field error.
        #[from]
        source: WorldError,
    },

    /// A unit step failed.
    #[error("unit error for {unit_id}: {source}")]
    Agent {
        /// The unit that caused the error.
        unit_id: UnitId,
        /// The underlying agent error.
        source: AgentError,
    },
}

/// Summary of a single step's execution.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSummary {
    /// The step number that was executed.
    pub step: u64,
    /// Cells ready to harvest at the end of the step.
    pub parcels_ready: usize,
    /// Crop transitions applied at the start of the step.
    pub transitions: CropTransitions,
    /// One record per unit, in id order.
    pub activities: Vec<ActivityRecord>,
}

/// A complete, self-contained simulation run.
#[derive(Debug)]
pub struct Simulation {
    grid: FieldGrid,
    units: Vec<Unit>,
    params: UnitParams,
    lifecycle: CropLifecycle,
    pathfinder: PathFinder<Box<dyn Heuristic>>,
    rng: StdRng,
    clock: StepClock,
    stop_when_cleared: bool,
}

impl Simulation {
    /// Build a run from a configuration and optional initial value tables.
    ///
    /// The field is seeded first, then units are placed, both from the
    /// run's generator. Learned units take their table from `tables` when
    /// present and start empty otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] if the configuration is invalid or the field
    /// cannot hold the fleet.
    pub fn new(config: &SimulationConfig, tables: PersistedTables) -> Result<Self, SetupError> {
        Self::with_heuristic(config, tables, Manhattan)
    }

    /// Build a run whose priority units search paths with `heuristic`.
    ///
    /// # Errors
    ///
    /// Same as [`Simulation::new`].
    pub fn with_heuristic(
        config: &SimulationConfig,
        mut tables: PersistedTables,
        heuristic: impl Heuristic + 'static,
    ) -> Result<Self, SetupError> {
        config.validate()?;
        let params = config.unit_params();
        params.validate()?;
        let learning = config.learning_params();
        learning.validate()?;
        let lifecycle = config.crop_lifecycle()?;

        let mut rng = StdRng::seed_from_u64(config.simulation.seed);
        let mut grid = config.field_layout().build(&mut rng)?;

        let ids: Vec<UnitId> = (0..config.fleet.units).map(UnitId::new).collect();
        let units: Vec<Unit> = ids
            .iter()
            .map(|&id| {
                let policy = match config.policy.kind {
                    PolicyKind::Priority => AgentPolicy::Priority,
                    PolicyKind::Learned => {
                        let table = tables.remove(&id).unwrap_or_default();
                        AgentPolicy::Learned(QLearner::new(table, learning))
                    }
                };
                Unit::new(id, &params, policy)
            })
            .collect();
        if !tables.is_empty() {
            debug!(unused = tables.len(), "Ignoring value tables with no matching learned unit");
        }

        place_units(&mut grid, &ids, &mut rng)?;
        let heuristic: Box<dyn Heuristic> = Box::new(heuristic);

        info!(
            width = grid.width(),
            height = grid.height(),
            units = units.len(),
            policy = ?config.policy.kind,
            ready = grid.parcels_ready().len(),
            seed = config.simulation.seed,
            "Simulation initialized"
        );

        Ok(Self {
            grid,
            units,
            params,
            lifecycle,
            pathfinder: PathFinder::with_heuristic(heuristic),
            rng,
            clock: StepClock::new(config.simulation.steps),
            stop_when_cleared: config.simulation.stop_when_cleared,
        })
    }

    /// Execute one step.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Clock`] once the step budget is used up, or a
    /// field or unit error if the grid is found inconsistent.
    pub fn step(&mut self) -> Result<StepSummary, StepError> {
        let step = self.clock.advance()?;

        let transitions = self.lifecycle.advance(&mut self.grid, &mut self.rng)?;

        let mut activities = Vec::with_capacity(self.units.len());
        for unit in &mut self.units {
            let record = step_unit(
                unit,
                &mut self.grid,
                &self.params,
                &self.pathfinder,
                &mut self.rng,
            )
            .map_err(|source| StepError::Agent {
                unit_id: unit.id(),
                source,
            })?;
            activities.push(record);
        }

        let summary = StepSummary {
            step,
            parcels_ready: self.grid.parcels_ready().len(),
            transitions,
            activities,
        };

        info!(
            step,
            ready = summary.parcels_ready,
            grown = transitions.grown,
            withered = transitions.withered,
            moved = summary.activities.iter().filter(|a| a.moved()).count(),
            broke_down = summary.activities.iter().filter(|a| a.broke_down).count(),
            "Step completed"
        );
        Ok(summary)
    }

    /// Whether the field is cleared: no ready parcels and no unit holding
    /// cargo.
    pub fn is_field_cleared(&self) -> bool {
        self.grid.parcels_ready().is_empty() && self.units.iter().all(|u| u.load() == 0)
    }

    /// Whether the run should end early once the field is cleared.
    pub const fn stop_when_cleared(&self) -> bool {
        self.stop_when_cleared
    }

    /// Settle every learned unit's last transition. Returns the number of
    /// harvested cells on the field.
    pub fn finish(&mut self) -> usize {
        let mut settled: u32 = 0;
        for unit in &mut self.units {
            if settle_pending(unit, &self.grid, &self.params).is_some() {
                settled = settled.saturating_add(1);
            }
        }
        let total = self.total_harvested();
        info!(
            step = self.clock.step(),
            settled,
            total_harvested = total,
            "Simulation finished"
        );
        total
    }

    /// Number of cells currently in the harvested state.
    pub fn total_harvested(&self) -> usize {
        self.grid.count_in_state(CellState::Harvested)
    }

    /// Copy out every learned unit's value table.
    pub fn export_tables(&self) -> PersistedTables {
        self.units
            .iter()
            .filter_map(|unit| unit.value_table().map(|table| (unit.id(), table.clone())))
            .collect()
    }

    /// Read-only view of the field and units for renderers.
    pub fn snapshot(&self) -> FieldSnapshot {
        FieldSnapshot {
            step: self.clock.step(),
            width: self.grid.width(),
            height: self.grid.height(),
            cells: self.grid.cell_states().to_vec(),
            units: self.unit_snapshots(),
        }
    }

    /// Snapshots of every unit in id order.
    pub fn unit_snapshots(&self) -> Vec<UnitSnapshot> {
        self.units
            .iter()
            .map(|unit| unit.snapshot(self.grid.position_of(unit.id())))
            .collect()
    }

    /// The field.
    pub const fn grid(&self) -> &FieldGrid {
        &self.grid
    }

    /// All units in id order.
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Look up a unit by id.
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id() == id)
    }

    /// Mutable access to the field, for arranging scenarios.
    pub const fn grid_mut(&mut self) -> &mut FieldGrid {
        &mut self.grid
    }

    /// Mutable access to a unit, for arranging scenarios.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|unit| unit.id() == id)
    }

    /// Shared unit parameters.
    pub const fn unit_params(&self) -> &UnitParams {
        &self.params
    }

    /// The run's clock.
    pub const fn clock(&self) -> &StepClock {
        &self.clock
    }
}
