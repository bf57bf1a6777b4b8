//! Engine binary for the harvest fleet simulation.
//!
//! Loads configuration, optionally warm-starts learned units from a saved
//! value-table file, runs the simulation to completion, and writes the
//! requested exports.
//!
//! # Environment
//!
//! - `HARVEST_CONFIG` -- configuration file (default `harvest-config.yaml`).
//! - `HARVEST_TABLES_IN` -- value tables to start learned units from.
//! - `HARVEST_TABLES_OUT` -- where to write value tables after the run.
//! - `HARVEST_TELEMETRY_OUT` -- where to write the telemetry document.
//! - `HARVEST_METRICS_OUT` -- where to write the per-step metrics log.
//! - `RUST_LOG` -- log filter; falls back to `logging.level`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration
//! 2. Initialize structured logging (tracing)
//! 3. Load saved value tables, if any
//! 4. Build the simulation
//! 5. Run with the metrics and telemetry observers
//! 6. Write exports and log the result

mod error;

use std::path::{Path, PathBuf};

use harvest_core::{
    MetricsLog, ObserverSet, PersistedTables, Simulation, SimulationConfig, TelemetryRecorder,
    decode_tables, encode_tables, run,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "harvest-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if the configuration is rejected, the run fails, or an
/// export cannot be written.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so the outcome is
    //    reported right after the subscriber starts.
    let config_path = env_path("HARVEST_CONFIG")
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let (config, from_file) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("harvest-engine starting");
    if from_file {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        width = config.field.width,
        height = config.field.height,
        units = config.fleet.units,
        policy = ?config.policy.kind,
        steps = config.simulation.steps,
        seed = config.simulation.seed,
        "Run configuration"
    );

    // 3. Load saved value tables.
    let tables = load_tables();

    // 4. Build the simulation.
    let mut sim = Simulation::new(&config, tables).map_err(EngineError::from)?;

    // 5. Run.
    let mut metrics = MetricsLog::new();
    let mut telemetry = TelemetryRecorder::new();
    let report = {
        let mut observers = ObserverSet::new().with(&mut metrics).with(&mut telemetry);
        run(&mut sim, &mut observers).map_err(EngineError::from)?
    };
    metrics.record_total(report.total_harvested);

    // 6. Write exports.
    if let Some(path) = env_path("HARVEST_TABLES_OUT") {
        let json = encode_tables(&sim.export_tables()).map_err(EngineError::from)?;
        write_file(&path, &json)?;
        info!(path = %path.display(), "Value tables written");
    }
    if let Some(path) = env_path("HARVEST_TELEMETRY_OUT") {
        let json = telemetry.to_json().map_err(EngineError::from)?;
        write_file(&path, &json)?;
        info!(path = %path.display(), "Telemetry written");
    }

    if let Some(path) = env_path("HARVEST_METRICS_OUT") {
        let json = metrics.to_json().map_err(EngineError::from)?;
        write_file(&path, &json)?;
        info!(path = %path.display(), "Metrics written");
    }

    info!(
        samples = metrics.points.len(),
        initial_ready = metrics.points.first().map(|p| p.parcels_ready),
        peak_ready = metrics.peak_ready(),
        final_ready = metrics.latest().map(|p| p.parcels_ready),
        total_harvested = metrics.total_harvested,
        "Metrics summary"
    );

    info!(
        end_reason = ?report.end_reason,
        steps = report.steps,
        total_harvested = report.total_harvested,
        "harvest-engine shutdown complete"
    );

    Ok(())
}

/// A non-empty path from the environment.
fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Load and validate the configuration. A missing file means defaults.
///
/// Returns the configuration and whether it came from the file.
fn load_config(path: &Path) -> Result<(SimulationConfig, bool), EngineError> {
    let (config, from_file) = if path.exists() {
        (SimulationConfig::from_file(path)?, true)
    } else {
        (SimulationConfig::default(), false)
    };
    config.validate()?;
    Ok((config, from_file))
}

/// Read saved value tables, if configured. Any failure starts learned units
/// empty.
fn load_tables() -> PersistedTables {
    let Some(path) = env_path("HARVEST_TABLES_IN") else {
        return PersistedTables::new();
    };
    match std::fs::read_to_string(&path) {
        Ok(json) => {
            let tables = decode_tables(&json);
            info!(path = %path.display(), units = tables.len(), "Value tables loaded");
            tables
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "Value-table file unreadable; starting with empty tables"
            );
            PersistedTables::new()
        }
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), EngineError> {
    std::fs::write(path, contents).map_err(|source| EngineError::Write {
        path: path.to_path_buf(),
        source,
    })
}
