//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode between startup and the final
//! export so `main` can propagate with `?`.

use std::path::PathBuf;

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: harvest_core::ConfigError,
    },

    /// The field or fleet could not be set up.
    #[error("setup error: {source}")]
    Setup {
        /// The underlying setup error.
        #[from]
        source: harvest_core::SetupError,
    },

    /// A step failed during the run.
    #[error("step error: {source}")]
    Step {
        /// The underlying step error.
        #[from]
        source: harvest_core::StepError,
    },

    /// An export document could not be serialized.
    #[error("export encoding error: {source}")]
    Encode {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// An export file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Destination path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
