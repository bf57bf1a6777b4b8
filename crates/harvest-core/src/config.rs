//! Configuration loading and typed config structures for the harvest fleet
//! simulation.
//!
//! The canonical configuration lives in `harvest-config.yaml` at the project
//! root. Every field has a default, so an empty document is a complete
//! configuration. [`SimulationConfig::validate`] is the only place a run can
//! be refused: out-of-range values are rejected before anything is built.

use std::path::Path;

use harvest_agents::{LearningParams, UnitParams};
use harvest_types::PolicyKind;
use harvest_world::{CropLifecycle, FieldLayout, WorldError, check_probability};
use serde::Deserialize;

/// Largest field accepted, in cells.
pub const MAX_FIELD_CELLS: u64 = 1_000_000;

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is outside its valid range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `harvest-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Field dimensions and initial crop density.
    #[serde(default)]
    pub field: FieldConfig,

    /// Unit count and unit parameters.
    #[serde(default)]
    pub fleet: FleetConfig,

    /// Crop growth and withering.
    #[serde(default)]
    pub crops: CropConfig,

    /// Which decision policy the units use.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Q-learning hyperparameters.
    #[serde(default)]
    pub learning: LearningConfig,

    /// Run length and seed.
    #[serde(default)]
    pub simulation: RunConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Check every value against its valid range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let field = &self.field;
        if field.width == 0 || field.height == 0 {
            return Err(invalid("field.width", "field dimensions must be at least 1x1"));
        }
        let cells = u64::from(field.width).saturating_mul(u64::from(field.height));
        if cells < 2 {
            return Err(invalid(
                "field.width",
                "field needs two cells for the unload point and refuel station",
            ));
        }
        if cells > MAX_FIELD_CELLS {
            return Err(ConfigError::Invalid {
                field: "field.width",
                reason: format!(
                    "{}x{} field exceeds the {MAX_FIELD_CELLS}-cell limit",
                    field.width, field.height
                ),
            });
        }
        probability("field.initial_ready_fraction", field.initial_ready_fraction)?;

        let fleet = &self.fleet;
        if fleet.units == 0 {
            return Err(invalid("fleet.units", "at least one unit is required"));
        }
        let free_cells = cells.saturating_sub(2);
        if u64::from(fleet.units) > free_cells {
            return Err(ConfigError::Invalid {
                field: "fleet.units",
                reason: format!("{} units do not fit on {free_cells} free cells", fleet.units),
            });
        }
        if fleet.capacity == 0 {
            return Err(invalid("fleet.capacity", "must be at least 1"));
        }
        if fleet.max_fuel == 0 {
            return Err(invalid("fleet.max_fuel", "must be at least 1"));
        }
        if fleet.speed != 1 {
            return Err(invalid("fleet.speed", "only one cell per step is supported"));
        }
        if fleet.harvest_amount == 0 {
            return Err(invalid("fleet.harvest_amount", "must be at least 1"));
        }
        probability("fleet.breakdown_chance", fleet.breakdown_chance)?;

        probability("crops.growth_chance", self.crops.growth_chance)?;
        probability("crops.wither_chance", self.crops.wither_chance)?;

        probability("learning.alpha", self.learning.alpha)?;
        probability("learning.gamma", self.learning.gamma)?;
        probability("learning.epsilon", self.learning.epsilon)?;
        Ok(())
    }

    /// Unit parameters derived from the fleet and policy sections.
    pub const fn unit_params(&self) -> UnitParams {
        UnitParams {
            capacity: self.fleet.capacity,
            max_fuel: self.fleet.max_fuel,
            fuel_consumption_rate: self.fleet.fuel_consumption_rate,
            fuel_threshold: self.fleet.fuel_threshold,
            harvest_amount: self.fleet.harvest_amount,
            breakdown_chance: self.fleet.breakdown_chance,
            repair_steps: self.fleet.repair_steps,
            return_to_unload_when_idle: self.policy.return_to_unload_when_idle,
        }
    }

    /// Q-learning hyperparameters.
    pub const fn learning_params(&self) -> LearningParams {
        LearningParams {
            alpha: self.learning.alpha,
            gamma: self.learning.gamma,
            epsilon: self.learning.epsilon,
        }
    }

    /// The starting field layout.
    pub const fn field_layout(&self) -> FieldLayout {
        FieldLayout {
            width: self.field.width,
            height: self.field.height,
            initial_ready_fraction: self.field.initial_ready_fraction,
        }
    }

    /// The crop lifecycle, or a disabled one when switched off.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidProbability`] for an out-of-range chance.
    pub fn crop_lifecycle(&self) -> Result<CropLifecycle, WorldError> {
        if self.crops.lifecycle_enabled {
            CropLifecycle::new(self.crops.growth_chance, self.crops.wither_chance)
        } else {
            Ok(CropLifecycle::disabled())
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_owned(),
    }
}

fn probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    check_probability(field, value)
        .map(|_| ())
        .map_err(|err| ConfigError::Invalid {
            field,
            reason: err.to_string(),
        })
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Field configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldConfig {
    /// Width in cells.
    #[serde(default = "default_field_size")]
    pub width: u32,

    /// Height in cells.
    #[serde(default = "default_field_size")]
    pub height: u32,

    /// Probability that a plain cell starts ready to harvest.
    #[serde(default = "default_initial_ready_fraction")]
    pub initial_ready_fraction: f64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            width: default_field_size(),
            height: default_field_size(),
            initial_ready_fraction: default_initial_ready_fraction(),
        }
    }
}

/// Fleet configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FleetConfig {
    /// Number of units.
    #[serde(default = "default_units")]
    pub units: u32,

    /// Maximum cargo per unit.
    #[serde(default = "default_capacity")]
    pub capacity: u32,

    /// Tank size.
    #[serde(default = "default_max_fuel")]
    pub max_fuel: u32,

    /// Fuel spent per cell moved.
    #[serde(default = "default_one")]
    pub fuel_consumption_rate: u32,

    /// Refuel threshold for the priority policy.
    #[serde(default = "default_fuel_threshold")]
    pub fuel_threshold: u32,

    /// Cells moved per step. Reserved; must be 1.
    #[serde(default = "default_one")]
    pub speed: u32,

    /// Cargo gained per harvested parcel.
    #[serde(default = "default_one")]
    pub harvest_amount: u32,

    /// Breakdown probability per successful move.
    #[serde(default = "default_breakdown_chance")]
    pub breakdown_chance: f64,

    /// Repair duration in steps.
    #[serde(default = "default_repair_steps")]
    pub repair_steps: u32,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            units: default_units(),
            capacity: default_capacity(),
            max_fuel: default_max_fuel(),
            fuel_consumption_rate: default_one(),
            fuel_threshold: default_fuel_threshold(),
            speed: default_one(),
            harvest_amount: default_one(),
            breakdown_chance: default_breakdown_chance(),
            repair_steps: default_repair_steps(),
        }
    }
}

/// Crop lifecycle configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CropConfig {
    /// Whether crops grow and wither during the run.
    #[serde(default = "default_true")]
    pub lifecycle_enabled: bool,

    /// Per-step probability that an empty cell becomes ready.
    #[serde(default = "default_growth_chance")]
    pub growth_chance: f64,

    /// Per-step probability that a ready cell withers.
    #[serde(default = "default_wither_chance")]
    pub wither_chance: f64,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            lifecycle_enabled: true,
            growth_chance: default_growth_chance(),
            wither_chance: default_wither_chance(),
        }
    }
}

/// Policy selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PolicyConfig {
    /// `priority` or `learned`.
    #[serde(default)]
    pub kind: PolicyKind,

    /// Send loaded priority units home when no parcels remain. Switching
    /// this off leaves cargo undelivered, so a run can only end on its
    /// step budget.
    #[serde(default = "default_true")]
    pub return_to_unload_when_idle: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            kind: PolicyKind::default(),
            return_to_unload_when_idle: true,
        }
    }
}

/// Q-learning hyperparameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LearningConfig {
    /// Learning rate.
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Discount factor.
    #[serde(default = "default_gamma")]
    pub gamma: f64,

    /// Exploration rate.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            gamma: default_gamma(),
            epsilon: default_epsilon(),
        }
    }
}

/// Run boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Maximum number of steps.
    #[serde(default = "default_steps")]
    pub steps: u64,

    /// Seed for the run's single random generator.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// End the run early once the field is cleared and all cargo delivered.
    #[serde(default = "default_true")]
    pub stop_when_cleared: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            seed: default_seed(),
            stop_when_cleared: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_true() -> bool {
    true
}

const fn default_one() -> u32 {
    1
}

const fn default_field_size() -> u32 {
    20
}

const fn default_initial_ready_fraction() -> f64 {
    0.2
}

const fn default_units() -> u32 {
    3
}

const fn default_capacity() -> u32 {
    10
}

const fn default_max_fuel() -> u32 {
    100
}

const fn default_fuel_threshold() -> u32 {
    10
}

const fn default_breakdown_chance() -> f64 {
    0.01
}

const fn default_repair_steps() -> u32 {
    3
}

const fn default_growth_chance() -> f64 {
    0.01
}

const fn default_wither_chance() -> f64 {
    0.005
}

const fn default_alpha() -> f64 {
    0.1
}

const fn default_gamma() -> f64 {
    0.9
}

const fn default_epsilon() -> f64 {
    0.1
}

const fn default_steps() -> u64 {
    100
}

const fn default_seed() -> u64 {
    42
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.field.width, 20);
        assert_eq!(config.fleet.units, 3);
        assert_eq!(config.simulation.seed, 42);
        assert_eq!(config.simulation.steps, 100);
        assert_eq!(config.policy.kind, PolicyKind::Priority);
        assert!(config.crops.lifecycle_enabled);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
field:
  width: 8
  height: 6
  initial_ready_fraction: 0.5
fleet:
  units: 2
  capacity: 4
  max_fuel: 30
  fuel_consumption_rate: 2
  fuel_threshold: 6
  speed: 1
  harvest_amount: 2
  breakdown_chance: 0.0
  repair_steps: 5
crops:
  lifecycle_enabled: false
  growth_chance: 0.2
  wither_chance: 0.1
policy:
  kind: learned
  return_to_unload_when_idle: false
learning:
  alpha: 0.5
  gamma: 0.8
  epsilon: 0.05
simulation:
  steps: 250
  seed: 7
  stop_when_cleared: false
logging:
  level: debug
";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.field.width, 8);
        assert_eq!(config.fleet.harvest_amount, 2);
        assert_eq!(config.policy.kind, PolicyKind::Learned);
        assert!(!config.crops.lifecycle_enabled);
        assert!(!config.crop_lifecycle().unwrap().is_enabled());
        assert_eq!(config.simulation.steps, 250);
        assert_eq!(config.logging.level, "debug");

        let params = config.unit_params();
        assert_eq!(params.fuel_consumption_rate, 2);
        assert!(!params.return_to_unload_when_idle);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = SimulationConfig::parse("simulation:\n  seed: 9\n").unwrap();
        assert_eq!(config.simulation.seed, 9);
        assert_eq!(config.fleet.capacity, 10);
        assert_eq!(config.field.height, 20);
        assert!(config.policy.return_to_unload_when_idle);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(SimulationConfig::parse("").is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut config = SimulationConfig::default();
        config.fleet.speed = 2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "fleet.speed", .. })
        ));

        let mut config = SimulationConfig::default();
        config.crops.growth_chance = 1.2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "crops.growth_chance", .. })
        ));

        let mut config = SimulationConfig::default();
        config.field.width = 2;
        config.field.height = 2;
        config.fleet.units = 3;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "fleet.units", .. })
        ));

        let mut config = SimulationConfig::default();
        config.field.width = 1;
        config.field.height = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_oversized_field_before_allocating() {
        let config = SimulationConfig::parse("field:\n  width: 4000000\n  height: 4000000\n")
            .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "field.width", .. })
        ));

        let mut config = SimulationConfig::default();
        config.field.width = 1000;
        config.field.height = 1000;
        assert!(config.validate().is_ok());
        config.field.height = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn probability_errors_name_the_config_field() {
        let mut config = SimulationConfig::default();
        config.learning.gamma = f64::INFINITY;
        match config.validate() {
            Err(ConfigError::Invalid { field, reason }) => {
                assert_eq!(field, "learning.gamma");
                assert!(reason.contains("learning.gamma"));
            }
            other => panic!("expected an invalid gamma, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_policy_kind() {
        assert!(matches!(
            SimulationConfig::parse("policy:\n  kind: random\n"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("harvest-config.yaml");
        let config = SimulationConfig::from_file(&path).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config, SimulationConfig::default());
    }
}
