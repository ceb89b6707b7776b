//! Batch experiments over attack distance and evolution.
//!
//! A batch is the cross product of the configured attack distances and
//! evolution settings. Each setup is run `runs_per_setup` times with
//! distinct seeds; the runs' overview series are averaged tick by tick
//! and written to `batch{index}.csv`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::collector::OverviewRow;
use crate::config::SimulationConfig;
use crate::model::{Model, ModelError};
use crate::runner::{self, NoOpCallback, RunnerError};

/// Error type for experiment operations.
#[derive(Debug, thiserror::Error)]
pub enum ExperimentError {
    /// A model could not be built.
    #[error("model error: {source}")]
    Model {
        /// The underlying model error.
        #[from]
        source: ModelError,
    },

    /// A run failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: RunnerError,
    },

    /// Writing results failed.
    #[error("failed to write {path}: {source}")]
    Io {
        /// The file or directory being written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// One point of the parameter sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Setup {
    /// Position in the sweep, used in the output file name.
    pub index: usize,
    /// Predator attack distance.
    pub attack_distance: f64,
    /// Whether evolution is enabled.
    pub evolve: bool,
}

/// The averaged series of one setup.
#[derive(Debug, Clone, PartialEq)]
pub struct SetupResult {
    /// The setup that ran.
    pub setup: Setup,
    /// Runs that were averaged.
    pub runs: u32,
    /// Per-tick averages.
    pub rows: Vec<OverviewRow>,
}

/// The sweep in run order: every attack distance without evolution, then
/// every attack distance with it.
pub fn setups(config: &SimulationConfig) -> Vec<Setup> {
    config
        .batch
        .evolve
        .iter()
        .flat_map(|&evolve| {
            config
                .batch
                .attack_distances
                .iter()
                .map(move |&attack_distance| (attack_distance, evolve))
        })
        .enumerate()
        .map(|(index, (attack_distance, evolve))| Setup {
            index,
            attack_distance,
            evolve,
        })
        .collect()
}

/// The configuration of one run of `setup`.
pub fn run_config(base: &SimulationConfig, setup: &Setup, run: u32) -> SimulationConfig {
    let mut config = base.clone();
    config.scenario.attack_distance = Some(setup.attack_distance);
    config.scenario.evolve = setup.evolve;
    config.scenario.max_ticks = base.batch.max_ticks;

    let index = u64::try_from(setup.index).unwrap_or(u64::MAX);
    let runs = u64::from(base.batch.runs_per_setup);
    let offset = index.wrapping_mul(runs).wrapping_add(u64::from(run));
    config.world.seed = base.world.seed.wrapping_add(offset);
    config
}

/// Run every repetition of `setup` and average them.
///
/// # Errors
///
/// Returns an [`ExperimentError`] if a model cannot be built or a run fails.
pub fn run_setup(base: &SimulationConfig, setup: &Setup) -> Result<SetupResult, ExperimentError> {
    let mut series = Vec::new();
    for run in 0..base.batch.runs_per_setup {
        let config = run_config(base, setup, run);
        let mut model = Model::new(&config)?;
        let result = runner::run_simulation(&mut model, config.scenario.max_ticks, &mut NoOpCallback)?;
        info!(
            setup = setup.index,
            run,
            seed = config.world.seed,
            ticks = result.total_ticks,
            reason = ?result.end_reason,
            predation_risk = model.predation_risk(),
            "Batch run finished"
        );
        series.push(model.global_overview());
    }
    Ok(SetupResult {
        setup: *setup,
        runs: base.batch.runs_per_setup,
        rows: average_overviews(&series),
    })
}

/// Average several overview series tick by tick.
///
/// Runs that ended early contribute only to the ticks they reached.
pub fn average_overviews(series: &[Vec<OverviewRow>]) -> Vec<OverviewRow> {
    let longest = series.iter().map(Vec::len).max().unwrap_or(0);
    (0..longest)
        .map(|i| {
            let rows: Vec<&OverviewRow> = series.iter().filter_map(|s| s.get(i)).collect();
            let n = rows.len() as f64;
            let mut sum = OverviewRow::default();
            for r in &rows {
                sum.time += r.time;
                sum.predation_risk += r.predation_risk;
                sum.vigilance_total += r.vigilance_total;
                sum.vigilance_avg += r.vigilance_avg;
                sum.group_size_prey += r.group_size_prey;
            }
            OverviewRow {
                time: sum.time / n,
                predation_risk: sum.predation_risk / n,
                vigilance_total: sum.vigilance_total / n,
                vigilance_avg: sum.vigilance_avg / n,
                group_size_prey: sum.group_size_prey / n,
            }
        })
        .collect()
}

/// Render an averaged series as CSV.
pub fn overview_csv(rows: &[OverviewRow]) -> String {
    let mut csv = String::from("time,predation_risk,vigilance_total,vigilance_avg,group_size_prey\n");
    for r in rows {
        let _ = writeln!(
            csv,
            "{},{},{},{},{}",
            r.time, r.predation_risk, r.vigilance_total, r.vigilance_avg, r.group_size_prey
        );
    }
    csv
}

/// Write `result` to `dir/batch{index}.csv`, creating `dir` if needed.
///
/// # Errors
///
/// Returns [`ExperimentError::Io`] if the directory or file cannot be written.
pub fn write_setup_csv(dir: &Path, result: &SetupResult) -> Result<PathBuf, ExperimentError> {
    std::fs::create_dir_all(dir).map_err(|source| ExperimentError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(format!("batch{}.csv", result.setup.index));
    std::fs::write(&path, overview_csv(&result.rows)).map_err(|source| ExperimentError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Run the whole sweep, writing each setup's CSV into `out_dir` if given.
///
/// # Errors
///
/// Returns the first [`ExperimentError`] encountered.
pub fn run_batch(config: &SimulationConfig, out_dir: Option<&Path>) -> Result<Vec<SetupResult>, ExperimentError> {
    let plan = setups(config);
    info!(
        setups = plan.len(),
        runs_per_setup = config.batch.runs_per_setup,
        max_ticks = config.batch.max_ticks,
        "Batch starting"
    );
    let mut results = Vec::with_capacity(plan.len());
    for setup in &plan {
        info!(
            setup = setup.index,
            attack_distance = setup.attack_distance,
            evolve = setup.evolve,
            "Setup starting"
        );
        let result = run_setup(config, setup)?;
        if let Some(dir) = out_dir {
            let path = write_setup_csv(dir, &result)?;
            info!(setup = setup.index, path = %path.display(), "Setup written");
        }
        results.push(result);
    }
    Ok(results)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn small_batch() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.population.initial_prey = 6;
        config.population.initial_predators = 1;
        config.population.food_density = 0.01;
        config.batch.attack_distances = vec![5.0, 9.0];
        config.batch.runs_per_setup = 2;
        config.batch.max_ticks = 4;
        config
    }

    fn row(time: f64, risk: f64) -> OverviewRow {
        OverviewRow {
            time,
            predation_risk: risk,
            ..OverviewRow::default()
        }
    }

    #[test]
    fn setups_cover_the_cross_product_in_order() {
        let plan = setups(&small_batch());
        let pairs: Vec<(f64, bool)> = plan.iter().map(|s| (s.attack_distance, s.evolve)).collect();
        assert_eq!(pairs, vec![(5.0, false), (9.0, false), (5.0, true), (9.0, true)]);
        assert_eq!(plan.last().unwrap().index, 3);
    }

    #[test]
    fn runs_get_distinct_seeds() {
        let base = small_batch();
        let plan = setups(&base);
        let mut seeds: Vec<u64> = plan
            .iter()
            .flat_map(|s| (0..2).map(|r| run_config(&base, s, r).world.seed))
            .collect();
        seeds.sort_unstable();
        seeds.dedup();
        assert_eq!(seeds.len(), 8);
    }

    #[test]
    fn run_config_applies_scenario() {
        let base = small_batch();
        let setup = Setup {
            index: 1,
            attack_distance: 7.0,
            evolve: true,
        };
        let config = run_config(&base, &setup, 0);
        assert_eq!(config.species().predator.attack_distance, 7.0);
        assert!(config.scenario.evolve);
        assert_eq!(config.scenario.max_ticks, 4);
    }

    #[test]
    fn averaging_handles_uneven_runs() {
        let series = vec![vec![row(0.0, 2.0), row(1.0, 4.0)], vec![row(0.0, 4.0)]];
        let avg = average_overviews(&series);
        assert_eq!(avg.len(), 2);
        assert_eq!(avg.first().unwrap().predation_risk, 3.0);
        assert_eq!(avg.get(1).unwrap().predation_risk, 4.0);
        assert!(average_overviews(&[]).is_empty());
    }

    #[test]
    fn setup_averages_each_tick() {
        let base = small_batch();
        let setup = setups(&base).into_iter().next().unwrap();
        let result = run_setup(&base, &setup).unwrap();
        assert_eq!(result.runs, 2);
        assert_eq!(result.rows.len(), 4);
        assert_eq!(result.rows.first().unwrap().time, 0.0);
    }

    #[test]
    fn csv_has_one_line_per_row() {
        let csv = overview_csv(&[row(0.0, 1.0), row(1.0, 2.0)]);
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.starts_with("time,predation_risk"));
    }
}
