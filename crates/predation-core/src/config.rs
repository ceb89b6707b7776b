//! Configuration loading and typed config structures for the Predation simulation.
//!
//! The canonical configuration lives in `predation-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure and a loader that reads and validates the file. Every
//! section and field is optional; missing values take the defaults below.

use std::path::Path;

use predation_agents::{FoodConfig, PredatorConfig, PreyConfig, SpeciesConfig};
use serde::{Deserialize, Serialize};

/// Errors that can occur when loading configuration.
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

    /// A value parsed but is out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
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
/// Mirrors the structure of `predation-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Domain size and random seed.
    #[serde(default)]
    pub world: WorldConfig,

    /// Initial population sizes.
    #[serde(default)]
    pub population: PopulationConfig,

    /// The single-run scenario.
    #[serde(default)]
    pub scenario: ScenarioConfig,

    /// Prey parameters.
    #[serde(default)]
    pub prey: PreyConfig,

    /// Predator parameters.
    #[serde(default)]
    pub predator: PredatorConfig,

    /// Food parameters.
    #[serde(default)]
    pub food: FoodConfig,

    /// Parameter sweep settings.
    #[serde(default)]
    pub batch: BatchConfig,

    /// Where and how often results are written.
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] or [`ConfigError::Invalid`].
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Species parameters with the scenario's attack distance applied.
    pub fn species(&self) -> SpeciesConfig {
        let mut predator = self.predator.clone();
        if let Some(distance) = self.scenario.attack_distance {
            predator.attack_distance = distance;
        }
        SpeciesConfig {
            prey: self.prey.clone(),
            predator,
            food: self.food.clone(),
        }
    }

    /// Check value ranges that would otherwise produce a meaningless run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("world.width", self.world.width),
            ("world.height", self.world.height),
            ("prey.max_energy", self.prey.max_energy),
            ("predator.max_energy", self.predator.max_energy),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(format!("{name} must be finite and positive, got {value}")));
            }
        }

        let non_negative = [
            ("population.food_density", self.population.food_density),
            ("prey.metabolism", self.prey.metabolism),
            ("prey.reach", self.prey.reach),
            ("prey.max_neighbour_awareness", self.prey.max_neighbour_awareness),
            ("predator.energy_cost", self.predator.energy_cost),
            ("predator.attack_distance", self.predator.attack_distance),
            ("predator.attack_speed", self.predator.attack_speed),
            ("predator.max_speed", self.predator.max_speed),
            ("predator.prey_detection_range", self.predator.prey_detection_range),
            ("food.energy_value", self.food.energy_value),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(format!("{name} must be finite and non-negative, got {value}")));
            }
        }

        for (name, rate) in [
            ("prey.mutation_rate", self.prey.mutation_rate),
            ("predator.mutation_rate", self.predator.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(invalid(format!("{name} must be within [0, 1], got {rate}")));
            }
        }

        if self
            .scenario
            .attack_distance
            .is_some_and(|d| !(d.is_finite() && d >= 0.0))
        {
            return Err(invalid("scenario.attack_distance must be non-negative".to_owned()));
        }
        if self.batch.runs_per_setup == 0 {
            return Err(invalid("batch.runs_per_setup must be at least 1".to_owned()));
        }
        if self.batch.attack_distances.iter().any(|d| !(d.is_finite() && *d >= 0.0)) {
            return Err(invalid("batch.attack_distances must be non-negative".to_owned()));
        }
        if self.output.snapshot_interval == 0 {
            return Err(invalid("output.snapshot_interval must be at least 1".to_owned()));
        }
        Ok(())
    }
}

const fn invalid(reason: String) -> ConfigError {
    ConfigError::Invalid { reason }
}

/// Domain size and seeding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Extent along x.
    #[serde(default = "default_extent")]
    pub width: f64,

    /// Extent along y.
    #[serde(default = "default_extent")]
    pub height: f64,

    /// Seed for the model's random stream.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: default_extent(),
            height: default_extent(),
            seed: default_seed(),
        }
    }
}

/// Initial population sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Prey seeded at random positions.
    #[serde(default = "default_initial_prey")]
    pub initial_prey: u32,

    /// Predators seeded at random positions.
    #[serde(default = "default_initial_predators")]
    pub initial_predators: u32,

    /// Food items per unit area (`width * height * density` items).
    #[serde(default = "default_food_density")]
    pub food_density: f64,

    /// Prey population below which forced births occur.
    #[serde(default = "default_reproduction_floor")]
    pub reproduction_floor: u32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            initial_prey: default_initial_prey(),
            initial_predators: default_initial_predators(),
            food_density: default_food_density(),
            reproduction_floor: default_reproduction_floor(),
        }
    }
}

/// The scenario of a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Overrides `predator.attack_distance` when set.
    #[serde(default)]
    pub attack_distance: Option<f64>,

    /// Enable mutation on reproduction and stochastic deaths.
    #[serde(default)]
    pub evolve: bool,

    /// Ticks to run.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            attack_distance: None,
            evolve: false,
            max_ticks: default_max_ticks(),
        }
    }
}

/// Parameter sweep settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Run the sweep instead of the single scenario.
    #[serde(default)]
    pub enabled: bool,

    /// Attack distances to sweep.
    #[serde(default = "default_attack_distances")]
    pub attack_distances: Vec<f64>,

    /// Evolution settings to sweep.
    #[serde(default = "default_evolve_options")]
    pub evolve: Vec<bool>,

    /// Independent runs per setup, averaged together.
    #[serde(default = "default_runs_per_setup")]
    pub runs_per_setup: u32,

    /// Ticks per run.
    #[serde(default = "default_batch_ticks")]
    pub max_ticks: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            attack_distances: default_attack_distances(),
            evolve: default_evolve_options(),
            runs_per_setup: default_runs_per_setup(),
            max_ticks: default_batch_ticks(),
        }
    }
}

/// Result file settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory CSV files are written into.
    #[serde(default = "default_output_dir")]
    pub directory: String,

    /// Rows are flushed to disk every N ticks.
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            snapshot_interval: default_snapshot_interval(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_extent() -> f64 {
    100.0
}

const fn default_seed() -> u64 {
    42
}

const fn default_initial_prey() -> u32 {
    50
}

const fn default_initial_predators() -> u32 {
    5
}

const fn default_food_density() -> f64 {
    0.535
}

const fn default_reproduction_floor() -> u32 {
    10
}

const fn default_max_ticks() -> u64 {
    1_000
}

fn default_attack_distances() -> Vec<f64> {
    vec![5.0, 7.0, 9.0]
}

fn default_evolve_options() -> Vec<bool> {
    vec![false, true]
}

const fn default_runs_per_setup() -> u32 {
    3
}

const fn default_batch_ticks() -> u64 {
    20_000
}

fn default_output_dir() -> String {
    "results".to_owned()
}

const fn default_snapshot_interval() -> u64 {
    100
}

fn default_log_level() -> String {
    "info".to_owned()
}
