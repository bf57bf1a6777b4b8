//! Error types for the harvest-agents crate.
//!
//! Invalid actions are not errors: they are penalized and recorded in the
//! activity stream. [`AgentError`] covers broken preconditions only.

use harvest_types::{Action, StateSignature};
use harvest_world::WorldError;

/// Errors that can occur while stepping units or loading value tables.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AgentError {
    /// A field operation failed.
    #[error("field error: {source}")]
    World {
        /// The underlying field error.
        #[from]
        source: WorldError,
    },

    /// A persisted value is NaN or infinite.
    #[error("non-finite value {value} for {action:?} in {signature:?}")]
    NonFiniteValue {
        /// The state the value belongs to.
        signature: StateSignature,
        /// The action the value belongs to.
        action: Action,
        /// The offending value.
        value: f64,
    },

    /// A unit or learning parameter is out of range.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}
