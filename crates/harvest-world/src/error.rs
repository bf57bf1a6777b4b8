//! Error types for the `harvest-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type.

use harvest_types::{GridPos, UnitId};

/// Errors that can occur during field operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    /// A coordinate lies outside the field.
    #[error("position {pos} is outside the {width}x{height} field")]
    OutOfBounds {
        /// The offending position.
        pos: GridPos,
        /// Field width.
        width: u32,
        /// Field height.
        height: u32,
    },

    /// The destination cell already holds a unit.
    #[error("cell {pos} is occupied by {occupant}")]
    Occupied {
        /// The contested cell.
        pos: GridPos,
        /// The unit currently standing there.
        occupant: UnitId,
    },

    /// The unit has no position on the field.
    #[error("{0} is not placed on the field")]
    UnitNotPlaced(UnitId),

    /// The unit already has a position.
    #[error("{unit} is already placed at {pos}")]
    UnitAlreadyPlaced {
        /// The unit.
        unit: UnitId,
        /// Its existing position.
        pos: GridPos,
    },

    /// A write would move, remove, or duplicate the refuel station or the
    /// unload point.
    #[error("cell {pos} is a fixture or would become one")]
    FixtureImmutable {
        /// The cell whose state was being written.
        pos: GridPos,
    },

    /// The field has a zero dimension.
    #[error("invalid field dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// The refuel station and unload point are out of bounds or coincide.
    #[error("invalid fixtures: unload point {unload_point}, refuel station {refuel_station}")]
    InvalidFixtures {
        /// Requested unload point.
        unload_point: GridPos,
        /// Requested refuel station.
        refuel_station: GridPos,
    },

    /// A probability parameter is outside `[0, 1]`.
    #[error("{name} must be within [0, 1], got {value}")]
    InvalidProbability {
        /// Parameter name.
        name: &'static str,
        /// Supplied value.
        value: f64,
    },

    /// There are fewer free cells than units to place.
    #[error("cannot place {requested} units on {available} free cells")]
    NotEnoughFreeCells {
        /// Units requested.
        requested: usize,
        /// Free cells available.
        available: usize,
    },
}

/// Check that `value` is a valid probability.
///
/// # Errors
///
/// Returns [`WorldError::InvalidProbability`] if `value` is not finite or
/// lies outside `[0, 1]`.
pub fn check_probability(name: &'static str, value: f64) -> Result<f64, WorldError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(WorldError::InvalidProbability { name, value })
    }
}
