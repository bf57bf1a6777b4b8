//! Run loop.
//!
//! [`run`] drives [`Simulation::step`] until the step budget is spent or,
//! when enabled, the field is cleared. Observers see the initial state once
//! and every completed step after that.

use tracing::{info, warn};

use crate::scheduler::{Simulation, StepError, StepSummary};

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEndReason {
    /// The configured number of steps ran.
    MaxSteps,
    /// No parcels were left and all cargo was delivered.
    FieldCleared,
}

/// Result of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Why the run ended.
    pub end_reason: RunEndReason,
    /// Number of steps executed.
    pub steps: u64,
    /// Cells in the harvested state at teardown.
    pub total_harvested: usize,
    /// The last step summary, if any step ran.
    pub final_summary: Option<StepSummary>,
}

/// Callback invoked around each step.
///
/// This is the metric and rendering hook: implementations read the summary
/// and the simulation but cannot change either.
pub trait StepObserver {
    /// Called once before the first step with the initial state.
    fn on_start(&mut self, _sim: &Simulation) {}

    /// Called after a step completes successfully.
    fn on_step(&mut self, summary: &StepSummary, sim: &Simulation);
}

/// An observer that ignores everything.
pub struct NoOpObserver;

impl StepObserver for NoOpObserver {
    fn on_step(&mut self, _summary: &StepSummary, _sim: &Simulation) {}
}

/// Fan one run out to several observers, in order.
pub struct ObserverSet<'a> {
    observers: Vec<&'a mut dyn StepObserver>,
}

impl<'a> ObserverSet<'a> {
    /// An empty set.
    pub const fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Add an observer.
    #[must_use]
    pub fn with(mut self, observer: &'a mut dyn StepObserver) -> Self {
        self.observers.push(observer);
        self
    }
}

impl Default for ObserverSet<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl StepObserver for ObserverSet<'_> {
    fn on_start(&mut self, sim: &Simulation) {
        for observer in &mut self.observers {
            observer.on_start(sim);
        }
    }

    fn on_step(&mut self, summary: &StepSummary, sim: &Simulation) {
        for observer in &mut self.observers {
            observer.on_step(summary, sim);
        }
    }
}

/// Run the simulation to completion.
///
/// Pending learned transitions are settled before returning, so the
/// simulation's value tables are final afterwards.
///
/// # Errors
///
/// Returns [`StepError`] if a step fails unrecoverably.
pub fn run(sim: &mut Simulation, observer: &mut dyn StepObserver) -> Result<RunReport, StepError> {
    info!(
        max_steps = sim.clock().max_steps(),
        stop_when_cleared = sim.stop_when_cleared(),
        "Run starting"
    );
    observer.on_start(sim);

    let mut final_summary: Option<StepSummary> = None;
    let mut steps: u64 = 0;
    let mut end_reason = RunEndReason::MaxSteps;

    while !sim.clock().is_exhausted() {
        let summary = sim.step()?;
        steps = steps.saturating_add(1);
        observer.on_step(&summary, sim);
        final_summary = Some(summary);

        if sim.stop_when_cleared() && sim.is_field_cleared() {
            info!(step = sim.clock().step(), "Field cleared");
            end_reason = RunEndReason::FieldCleared;
            break;
        }
    }

    let total_harvested = sim.finish();
    let report = RunReport {
        end_reason,
        steps,
        total_harvested,
        final_summary,
    };
    log_run_end(&report);
    Ok(report)
}

/// Log the end-of-run summary.
pub fn log_run_end(report: &RunReport) {
    info!(
        reason = ?report.end_reason,
        steps = report.steps,
        total_harvested = report.total_harvested,
        final_ready = report.final_summary.as_ref().map(|s| s.parcels_ready),
        "Run ended"
    );
    if report.final_summary.is_none() {
        warn!("Run ended with no steps executed");
    }
}
