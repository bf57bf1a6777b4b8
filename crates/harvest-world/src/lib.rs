//! The field a harvest fleet works on.
//!
//! This crate owns everything spatial: the cell grid with its occupancy
//! indexes, shortest-path search, and the stochastic crop lifecycle.
//!
//! # Modules
//!
//! - [`chance`] -- Bernoulli trials with a fixed draw count.
//! - [`crop_lifecycle`] -- Per-step growth and withering of crops.
//! - [`error`] -- Error types for field operations.
//! - [`field_grid`] -- [`FieldGrid`]: cell states, occupancy, and the
//!   ready-parcel index.
//! - [`layout`] -- Building the starting field and placing units.
//! - [`pathfinding`] -- A* search with a pluggable heuristic.

pub mod chance;
pub mod crop_lifecycle;
pub mod error;
pub mod field_grid;
pub mod layout;
pub mod pathfinding;

// Re-export primary types at crate root.
pub use chance::roll;
pub use crop_lifecycle::{CropLifecycle, CropTransitions};
pub use error::{WorldError, check_probability};
pub use field_grid::FieldGrid;
pub use layout::{FieldLayout, place_units};
pub use pathfinding::{Heuristic, Manhattan, PathFinder};
