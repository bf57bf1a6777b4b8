//! Harvest units and how they decide what to do.
//!
//! This crate holds the per-unit logic layer: resources, the operational
//! state machine, and the two decision policies. It sits between
//! `harvest-world` (the field) and `harvest-core` (the step scheduler) and
//! performs no I/O.
//!
//! # Modules
//!
//! - [`actor`] -- The per-step state machine ([`step_unit`]).
//! - [`config`] -- Unit and learning parameters ([`UnitParams`],
//!   [`LearningParams`]).
//! - [`error`] -- Error types ([`AgentError`]).
//! - [`policy`] -- Priority target selection and the Q-learner.
//! - [`reward`] -- The learned policy's reward schedule.
//! - [`signature`] -- Observing a [`StateSignature`](harvest_types::StateSignature).
//! - [`unit`] -- Unit state ([`Unit`]).
//! - [`value_table`] -- Per-unit action-value estimates ([`ValueTable`]).

pub mod actor;
pub mod config;
pub mod error;
pub mod policy;
pub mod reward;
pub mod signature;
pub mod unit;
pub mod value_table;

// Re-export primary types at crate root.
pub use actor::{settle_pending, step_unit};
pub use config::{LearningParams, UnitParams};
pub use error::AgentError;
pub use policy::{AgentPolicy, QLearner, priority_target};
pub use signature::observe;
pub use unit::Unit;
pub use value_table::ValueTable;
