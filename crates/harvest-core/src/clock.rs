//! The single logical clock of a run.
//!
//! Step 0 is the initial state; the first call to [`StepClock::advance`]
//! starts step 1. The clock also holds the run's step budget.

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// Step counter would overflow.
    #[error("step counter overflow: cannot advance beyond u64::MAX")]
    StepOverflow,

    /// The step budget is used up.
    #[error("step budget of {max_steps} exhausted")]
    Exhausted {
        /// The configured budget.
        max_steps: u64,
    },
}

/// Discrete step counter with a fixed budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepClock {
    /// Number of completed or in-progress steps.
    step: u64,
    /// Maximum number of steps in the run.
    max_steps: u64,
}

impl StepClock {
    /// A clock at step 0 with the given budget.
    pub const fn new(max_steps: u64) -> Self {
        Self { step: 0, max_steps }
    }

    /// Start the next step. Returns the new step number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Exhausted`] once the budget is used up, or
    /// [`ClockError::StepOverflow`] on counter overflow.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        if self.is_exhausted() {
            return Err(ClockError::Exhausted {
                max_steps: self.max_steps,
            });
        }
        self.step = self.step.checked_add(1).ok_or(ClockError::StepOverflow)?;
        Ok(self.step)
    }

    /// The current step number.
    pub const fn step(&self) -> u64 {
        self.step
    }

    /// The step budget.
    pub const fn max_steps(&self) -> u64 {
        self.max_steps
    }

    /// Steps left in the budget.
    pub const fn remaining(&self) -> u64 {
        self.max_steps.saturating_sub(self.step)
    }

    /// Whether no steps are left.
    pub const fn is_exhausted(&self) -> bool {
        self.step >= self.max_steps
    }
}
