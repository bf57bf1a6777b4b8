//! Shared type definitions for the harvest fleet simulation.
//!
//! This crate is the single source of truth for the vocabulary used across
//! the workspace: coordinates, identifiers, cell and action enumerations,
//! value-table keys, per-step activity records, and rendering snapshots.
//! Everything that crosses a crate or process boundary derives `serde`.
//!
//! # Modules
//!
//! - [`ids`] -- Stable numeric identifiers for units
//! - [`grid`] -- Grid coordinates, directions, and distance helpers
//! - [`enums`] -- Cell states, actions, policy kinds, operational state
//! - [`signature`] -- The structured state key of the learned value table
//! - [`activity`] -- What each unit did during a step
//! - [`structs`] -- Snapshots and persistence records exposed at the boundary

pub mod activity;
pub mod enums;
pub mod grid;
pub mod ids;
pub mod signature;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use activity::{ActivityRecord, ActivityStatus, Effect, Movement};
pub use enums::{Action, CellState, OperationalState, PolicyKind, TargetKind};
pub use grid::{Direction, GridPos, manhattan_distance};
pub use ids::UnitId;
pub use signature::{CropSignal, FuelBucket, LoadBucket, StateSignature};
pub use structs::{FieldSnapshot, UnitSnapshot, ValueTableEntry};
