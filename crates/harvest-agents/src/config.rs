//! Tunable parameters for units and the learned policy.
//!
//! The engine builds these from `harvest-config.yaml` at simulation start.
//! The defaults match that file's defaults so tests can construct units
//! without a configuration document.

use harvest_world::check_probability;

use crate::error::AgentError;

/// Physical and behavioral parameters shared by every unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitParams {
    /// Maximum cargo load (default: 10).
    pub capacity: u32,
    /// Tank size; units start full (default: 100).
    pub max_fuel: u32,
    /// Fuel spent per cell moved (default: 1).
    pub fuel_consumption_rate: u32,
    /// At or below this level a priority unit heads for the refuel station
    /// (default: 10).
    pub fuel_threshold: u32,
    /// Cargo gained per harvested parcel (default: 1).
    pub harvest_amount: u32,
    /// Probability of breaking down after each successful move
    /// (default: 0.01).
    pub breakdown_chance: f64,
    /// Steps spent under repair after a breakdown (default: 3).
    pub repair_steps: u32,
    /// When no parcels remain, a loaded priority unit returns to the unload
    /// point instead of idling (default: true).
    pub return_to_unload_when_idle: bool,
}

impl Default for UnitParams {
    fn default() -> Self {
        Self {
            capacity: 10,
            max_fuel: 100,
            fuel_consumption_rate: 1,
            fuel_threshold: 10,
            harvest_amount: 1,
            breakdown_chance: 0.01,
            repair_steps: 3,
            return_to_unload_when_idle: true,
        }
    }
}

impl UnitParams {
    /// Check that the parameters describe a unit that can work.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidParameter`] for a zero capacity, a zero
    /// tank, a zero harvest amount, or a breakdown chance outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.capacity == 0 {
            return Err(invalid("capacity", "must be at least 1"));
        }
        if self.max_fuel == 0 {
            return Err(invalid("max_fuel", "must be at least 1"));
        }
        if self.harvest_amount == 0 {
            return Err(invalid("harvest_amount", "must be at least 1"));
        }
        probability("breakdown_chance", self.breakdown_chance)
    }
}

/// Hyperparameters of the epsilon-greedy Q-learning policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearningParams {
    /// Learning rate alpha (default: 0.1).
    pub alpha: f64,
    /// Discount factor gamma (default: 0.9).
    pub gamma: f64,
    /// Exploration rate epsilon (default: 0.1).
    pub epsilon: f64,
}

impl Default for LearningParams {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.9,
            epsilon: 0.1,
        }
    }
}

impl LearningParams {
    /// Check that every hyperparameter lies in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidParameter`] naming the first
    /// out-of-range hyperparameter.
    pub fn validate(&self) -> Result<(), AgentError> {
        probability("alpha", self.alpha)?;
        probability("gamma", self.gamma)?;
        probability("epsilon", self.epsilon)
    }
}

fn probability(name: &'static str, value: f64) -> Result<(), AgentError> {
    check_probability(name, value)
        .map(|_| ())
        .map_err(|err| invalid(name, &err.to_string()))
}

fn invalid(name: &'static str, reason: &str) -> AgentError {
    AgentError::InvalidParameter {
        name,
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(UnitParams::default().validate().is_ok());
        assert!(LearningParams::default().validate().is_ok());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let params = UnitParams {
            capacity: 0,
            ..UnitParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(AgentError::InvalidParameter { name: "capacity", .. })
        ));
    }

    #[test]
    fn out_of_range_learning_rate_is_rejected() {
        let params = LearningParams {
            alpha: 1.5,
            ..LearningParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(AgentError::InvalidParameter { name: "alpha", .. })
        ));
    }

    #[test]
    fn out_of_range_breakdown_chance_is_a_parameter_error() {
        let params = UnitParams {
            breakdown_chance: f64::NAN,
            ..UnitParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(AgentError::InvalidParameter { name: "breakdown_chance", .. })
        ));
        let params = LearningParams {
            epsilon: -0.1,
            ..LearningParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(AgentError::InvalidParameter { name: "epsilon", .. })
        ));
    }
}
