//! Step clock, scheduler, and run loop for the harvest fleet simulation.
//!
//! This crate ties the field and the units together into a run: it loads
//! configuration, owns the single seeded generator, drives the fixed
//! per-step order, and exposes the metric, rendering, and value-table
//! boundaries.
//!
//! # Modules
//!
//! - [`clock`] -- Step counter with a fixed budget.
//! - [`config`] -- YAML configuration loading and validation.
//! - [`persistence`] -- JSON codec for per-unit value tables.
//! - [`runner`] -- Run loop, end reasons, and the [`StepObserver`] hook.
//! - [`scheduler`] -- [`Simulation`]: one step of crops then units.
//! - [`snapshot`] -- Metrics log and telemetry recorder observers.

pub mod clock;
pub mod config;
pub mod persistence;
pub mod runner;
pub mod scheduler;
pub mod snapshot;

// Re-export primary types at crate root.
pub use clock::{ClockError, StepClock};
pub use config::{ConfigError, MAX_FIELD_CELLS, SimulationConfig};
pub use persistence::{PersistedTables, decode_tables, encode_tables};
pub use runner::{NoOpObserver, ObserverSet, RunEndReason, RunReport, StepObserver, run};
pub use scheduler::{SetupError, Simulation, StepError, StepSummary};
pub use snapshot::{MetricPoint, MetricsLog, TelemetryExport, TelemetryRecorder};
