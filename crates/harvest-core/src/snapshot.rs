//! Metric and rendering observers.
//!
//! - [`MetricsLog`] records the ready-parcel count once per step and the
//!   harvested total at teardown.
//! - [`TelemetryRecorder`] records a per-unit time series (position, speed,
//!   fuel level, cargo load, cumulative fuel) and exports it as the telemetry JSON document
//!   consumed by the ingestion service.

use std::collections::BTreeMap;

use harvest_types::{GridPos, UnitId};
use serde::{Deserialize, Serialize};

use crate::runner::StepObserver;
use crate::scheduler::{Simulation, StepSummary};

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// One per-step metric sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricPoint {
    /// Step number (0 = initial state).
    pub step: u64,
    /// Cells ready to harvest at the end of the step.
    pub parcels_ready: usize,
}

/// Per-step parcel counts plus the final harvested total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsLog {
    /// Samples in step order.
    pub points: Vec<MetricPoint>,
    /// Harvested cells at teardown, once recorded.
    pub total_harvested: Option<usize>,
}

impl MetricsLog {
    /// An empty log.
    pub const fn new() -> Self {
        Self {
            points: Vec::new(),
            total_harvested: None,
        }
    }

    /// Record the teardown total.
    pub const fn record_total(&mut self, total_harvested: usize) {
        self.total_harvested = Some(total_harvested);
    }

    /// The most recent ready-parcel count.
    pub fn latest(&self) -> Option<MetricPoint> {
        self.points.last().copied()
    }

    /// Highest ready-parcel count seen so far.
    pub fn peak_ready(&self) -> Option<usize> {
        self.points.iter().map(|point| point.parcels_ready).max()
    }

    /// Serialize the log to JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl StepObserver for MetricsLog {
    fn on_start(&mut self, sim: &Simulation) {
        self.points.push(MetricPoint {
            step: 0,
            parcels_ready: sim.grid().parcels_ready().len(),
        });
    }

    fn on_step(&mut self, summary: &StepSummary, _sim: &Simulation) {
        self.points.push(MetricPoint {
            step: summary.step,
            parcels_ready: summary.parcels_ready,
        });
    }
}

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

/// Planar position in the telemetry document. The field's `y` axis maps to
/// `z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryPosition {
    /// Column.
    pub x: u32,
    /// Row.
    pub z: u32,
}

impl From<GridPos> for TelemetryPosition {
    fn from(pos: GridPos) -> Self {
        Self { x: pos.x, z: pos.y }
    }
}

/// One telemetry sample for one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryPoint {
    /// Step number.
    pub timestamp: u64,
    /// Position at the end of the step.
    pub position: TelemetryPosition,
    /// Cells moved during the step (0 or 1).
    pub speed: u32,
    /// Fuel in the tank at the end of the step.
    pub fuel: u32,
    /// Cargo aboard at the end of the step.
    pub load: u32,
    /// Fuel consumed since the run started.
    pub fuel_used: u64,
}

/// Time series for one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TractorTelemetry {
    /// Display name of the unit.
    pub tractor_name: String,
    /// Samples in step order.
    pub points: Vec<TelemetryPoint>,
}

/// The telemetry export document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryExport {
    /// One series per unit, in id order.
    pub tractors: Vec<TractorTelemetry>,
}

/// Records a telemetry sample for every placed unit at every step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetryRecorder {
    series: BTreeMap<UnitId, Vec<TelemetryPoint>>,
}

impl TelemetryRecorder {
    /// An empty recorder.
    pub const fn new() -> Self {
        Self {
            series: BTreeMap::new(),
        }
    }

    /// The samples recorded for one unit.
    pub fn points(&self, unit: UnitId) -> &[TelemetryPoint] {
        self.series.get(&unit).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Build the export document.
    pub fn export(&self) -> TelemetryExport {
        TelemetryExport {
            tractors: self
                .series
                .iter()
                .map(|(id, points)| TractorTelemetry {
                    tractor_name: id.to_string(),
                    points: points.clone(),
                })
                .collect(),
        }
    }

    /// Serialize the export document to JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.export())
    }

    fn sample(&mut self, timestamp: u64, sim: &Simulation, moved: impl Fn(UnitId) -> bool) {
        for unit in sim.units() {
            let snapshot = unit.snapshot(sim.grid().position_of(unit.id()));
            let Some(pos) = snapshot.position else {
                continue;
            };
            self.series.entry(snapshot.id).or_default().push(TelemetryPoint {
                timestamp,
                position: pos.into(),
                speed: u32::from(moved(snapshot.id)),
                fuel: snapshot.fuel,
                load: snapshot.load,
                fuel_used: unit.fuel_used(),
            });
        }
    }
}

impl StepObserver for TelemetryRecorder {
    fn on_start(&mut self, sim: &Simulation) {
        self.sample(0, sim, |_| false);
    }

    fn on_step(&mut self, summary: &StepSummary, sim: &Simulation) {
        self.sample(summary.step, sim, |id| {
            summary
                .activities
                .iter()
                .any(|record| record.unit_id == id && record.moved())
        });
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::persistence::PersistedTables;
    use crate::runner::{ObserverSet, run};

    fn config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.field.width = 10;
        config.field.height = 10;
        config.fleet.units = 2;
        config.fleet.breakdown_chance = 0.0;
        config.simulation.steps = 5;
        config.simulation.stop_when_cleared = false;
        config
    }

    #[test]
    fn metrics_log_every_step_and_total() {
        let mut sim = Simulation::new(&config(), PersistedTables::new()).unwrap();
        let mut metrics = MetricsLog::new();
        let report = run(&mut sim, &mut metrics).unwrap();
        metrics.record_total(report.total_harvested);
        assert_eq!(metrics.points.len(), 6);
        assert_eq!(metrics.points[0].step, 0);
        assert_eq!(metrics.latest().unwrap().step, 5);
        assert_eq!(metrics.total_harvested, Some(report.total_harvested));
        assert!(metrics.peak_ready().unwrap() >= metrics.points[0].parcels_ready);

        let json: serde_json::Value = serde_json::from_str(&metrics.to_json().unwrap()).unwrap();
        assert_eq!(json["points"].as_array().unwrap().len(), 6);
        assert_eq!(json["points"][5]["step"], 5);
        assert_eq!(json["total_harvested"], report.total_harvested);
    }

    #[test]
    fn telemetry_tracks_speed_and_cumulative_fuel() {
        let mut sim = Simulation::new(&config(), PersistedTables::new()).unwrap();
        let mut telemetry = TelemetryRecorder::new();
        let mut metrics = MetricsLog::new();
        let mut observers = ObserverSet::new().with(&mut telemetry).with(&mut metrics);
        run(&mut sim, &mut observers).unwrap();
        drop(observers);

        let points = telemetry.points(UnitId::new(0));
        assert_eq!(points.len(), 6);
        assert_eq!(points[0].fuel_used, 0);
        assert_eq!(points[0].speed, 0);
        let moves: u64 = points.iter().map(|p| u64::from(p.speed)).sum();
        assert_eq!(points[5].fuel_used, moves);
        for pair in points.windows(2) {
            assert!(pair[1].fuel_used >= pair[0].fuel_used);
        }
    }

    #[test]
    fn telemetry_follows_fuel_level_and_cargo() {
        let mut cfg = config();
        cfg.field.width = 5;
        cfg.field.height = 5;
        cfg.field.initial_ready_fraction = 0.0;
        cfg.fleet.units = 1;
        cfg.crops.lifecycle_enabled = false;
        cfg.simulation.steps = 2;
        let unit = UnitId::new(0);
        let mut sim = Simulation::new(&cfg, PersistedTables::new()).unwrap();
        sim.grid_mut().move_unit(unit, GridPos::new(2, 2)).unwrap();
        sim.grid_mut()
            .set_state(GridPos::new(2, 3), harvest_types::CellState::ReadyToHarvest)
            .unwrap();

        let mut telemetry = TelemetryRecorder::new();
        run(&mut sim, &mut telemetry).unwrap();

        let points = telemetry.points(unit);
        assert_eq!(points.len(), 3);
        assert_eq!((points[0].fuel, points[0].load), (100, 0));
        // Harvested on arrival in step 1, then heads home in step 2.
        assert_eq!((points[1].fuel, points[1].load), (99, 1));
        assert_eq!((points[2].fuel, points[2].load), (98, 1));
        let snapshot = &sim.unit_snapshots()[0];
        assert_eq!(points[2].fuel, snapshot.fuel);
        assert_eq!(points[2].load, snapshot.load);
        assert_eq!(
            points[2].position,
            TelemetryPosition::from(snapshot.position.unwrap())
        );
        for point in points {
            assert_eq!(u64::from(100 - point.fuel), point.fuel_used);
        }
    }

    #[test]
    fn export_uses_ingestion_field_names() {
        let mut sim = Simulation::new(&config(), PersistedTables::new()).unwrap();
        let mut telemetry = TelemetryRecorder::new();
        run(&mut sim, &mut telemetry).unwrap();
        let json: serde_json::Value = serde_json::from_str(&telemetry.to_json().unwrap()).unwrap();
        let tractor = &json["tractors"][0];
        assert_eq!(tractor["tractorName"], "unit-0");
        let point = &tractor["points"][1];
        assert_eq!(point["timestamp"], 1);
        assert!(point["position"]["x"].is_u64());
        assert!(point["position"]["z"].is_u64());
        assert!(point["fuelUsed"].is_u64());
        assert!(point["speed"].is_u64());
        assert!(point["fuel"].is_u64());
        assert!(point["load"].is_u64());
    }
}
