//! Command-line runner for the Predation simulation.
//!
//! Loads configuration, sets up logging, and then either runs a single
//! simulation with periodic CSV snapshots or, when `batch.enabled` is set,
//! the full sweep over attack distance and evolution.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `$PREDATION_CONFIG` or `predation-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Run the batch sweep, or a single simulation
//! 4. Write results into `output.directory` and log the outcome

mod error;
mod snapshot;

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use predation_core::config::{LogFormat, LoggingConfig};
use predation_core::experiment;
use predation_core::runner;
use predation_core::{Model, SimulationConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::snapshot::CsvSnapshot;

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "PREDATION_CONFIG";

/// Configuration file used when [`CONFIG_ENV`] is unset.
const DEFAULT_CONFIG: &str = "predation-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, logging setup, or the run fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;
    info!("predation-engine starting");
    match &source {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }
    info!(
        width = config.world.width,
        height = config.world.height,
        seed = config.world.seed,
        initial_prey = config.population.initial_prey,
        initial_predators = config.population.initial_predators,
        batch = config.batch.enabled,
        "Configuration resolved"
    );

    // 3. Run.
    if config.batch.enabled {
        run_batch(&config)?;
    } else {
        run_single(&config)?;
    }

    info!("predation-engine shutdown complete");
    Ok(())
}

/// Load the configuration named by `$PREDATION_CONFIG`, falling back to
/// `predation-config.yaml` in the working directory, then to defaults.
///
/// Returns the file the configuration came from, if any.
fn load_config() -> Result<(SimulationConfig, Option<PathBuf>), EngineError> {
    let path = std::env::var_os(CONFIG_ENV)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);
    if path.exists() {
        let config = SimulationConfig::from_file(&path)?;
        Ok((config, Some(path)))
    } else {
        Ok((SimulationConfig::default(), None))
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
fn init_logging(logging: &LoggingConfig) -> Result<(), EngineError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| EngineError::LogFilter {
            filter: logging.level.clone(),
            message: e.to_string(),
        })?;
    match logging.format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
    Ok(())
}

/// Run one simulation, streaming collector rows to `run_seed{seed}.csv`
/// and writing the kill log next to it.
fn run_single(config: &SimulationConfig) -> Result<(), EngineError> {
    let dir = Path::new(&config.output.directory);
    let csv_path = dir.join(format!("run_seed{}.csv", config.world.seed));

    let mut model = Model::new(config)?;
    let mut snapshot = CsvSnapshot::create(&csv_path, config.output.snapshot_interval)?;
    info!(
        max_ticks = config.scenario.max_ticks,
        attack_distance = model.species().predator.attack_distance,
        evolve = model.evolves(),
        path = %snapshot.path().display(),
        "Single run starting"
    );

    let result = runner::run_simulation(&mut model, config.scenario.max_ticks, &mut snapshot)?;
    let rows = snapshot.flush(&model)?;
    runner::log_simulation_end(&result);

    let events_path = dir.join(format!("predation_seed{}.jsonl", config.world.seed));
    write_events(&events_path, &model)?;
    info!(
        csv = %snapshot.path().display(),
        events = %events_path.display(),
        final_rows = rows,
        snapshot_failures = snapshot.write_failures(),
        kills = model.predation_events().len(),
        predation_risk = model.predation_risk(),
        "Results written"
    );
    Ok(())
}

/// Write every predation event as one JSON object per line.
fn write_events(path: &Path, model: &Model) -> Result<(), EngineError> {
    let mut out = String::new();
    for event in model.predation_events() {
        let line = serde_json::to_string(event).map_err(|e| EngineError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::other(e),
        })?;
        let _ = writeln!(out, "{line}");
    }
    std::fs::write(path, out).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Run every setup of the sweep, writing `batch{index}.csv` files.
fn run_batch(config: &SimulationConfig) -> Result<(), EngineError> {
    let dir = Path::new(&config.output.directory);
    let results = experiment::run_batch(config, Some(dir))?;
    for result in &results {
        let last = result.rows.last();
        info!(
            setup = result.setup.index,
            attack_distance = result.setup.attack_distance,
            evolve = result.setup.evolve,
            runs = result.runs,
            ticks = result.rows.len(),
            predation_risk = last.map(|r| r.predation_risk),
            vigilance_avg = last.map(|r| r.vigilance_avg),
            group_size_prey = last.map(|r| r.group_size_prey),
            "Setup summary"
        );
    }
    info!(setups = results.len(), directory = %dir.display(), "Batch complete");
    Ok(())
}
