//! Per-tick data collection.
//!
//! The scheduler samples the model once per tick, before any agent acts.
//! Each sample is a [`TickRecord`] of population counts, prey vigilance,
//! grouping, and the running event totals. The collected series can be
//! written out as CSV and reduced to the [`OverviewRow`] series the batch
//! runner averages across runs.

use std::fmt::Write as _;

use predation_types::{AgentKind, DeathCause};
use serde::{Deserialize, Serialize};

use crate::model::Model;

/// Running totals of population events since the model was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTally {
    /// Prey born through reproduction.
    pub prey_births: u64,
    /// Prey born through the population floor.
    pub forced_births: u64,
    /// Predators born.
    pub predator_births: u64,
    /// Deaths from starvation.
    pub starvation: u64,
    /// Deaths from old age.
    pub old_age: u64,
    /// Deaths from the stochastic draw.
    pub random_deaths: u64,
    /// Prey eaten by predators.
    pub kills: u64,
    /// Food items eaten by prey.
    pub food_eaten: u64,
}

impl EventTally {
    /// Count one death.
    pub const fn record_death(&mut self, cause: DeathCause) {
        let slot = match cause {
            DeathCause::Starvation => &mut self.starvation,
            DeathCause::OldAge => &mut self.old_age,
            DeathCause::Random => &mut self.random_deaths,
            DeathCause::Predation => &mut self.kills,
        };
        *slot = slot.saturating_add(1);
    }

    /// Deaths of every cause.
    pub const fn deaths(&self) -> u64 {
        self.starvation
            .saturating_add(self.old_age)
            .saturating_add(self.random_deaths)
            .saturating_add(self.kills)
    }

    /// Births of every kind.
    pub const fn births(&self) -> u64 {
        self.prey_births
            .saturating_add(self.forced_births)
            .saturating_add(self.predator_births)
    }

    /// Events counted since `earlier`.
    pub const fn since(&self, earlier: &Self) -> Self {
        Self {
            prey_births: self.prey_births.saturating_sub(earlier.prey_births),
            forced_births: self.forced_births.saturating_sub(earlier.forced_births),
            predator_births: self.predator_births.saturating_sub(earlier.predator_births),
            starvation: self.starvation.saturating_sub(earlier.starvation),
            old_age: self.old_age.saturating_sub(earlier.old_age),
            random_deaths: self.random_deaths.saturating_sub(earlier.random_deaths),
            kills: self.kills.saturating_sub(earlier.kills),
            food_eaten: self.food_eaten.saturating_sub(earlier.food_eaten),
        }
    }
}

/// One sample of the model, taken at the start of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    /// Ticks completed when the sample was taken.
    pub tick: u64,
    /// Live agents of every kind.
    pub n_agents: usize,
    /// Live prey.
    pub n_prey: usize,
    /// Live predators.
    pub n_predators: usize,
    /// Uneaten food items.
    pub n_food: usize,
    /// Accumulated predation risk.
    pub predation_risk: f64,
    /// Prey currently scanning for predators.
    pub vigilance_total: usize,
    /// Share of live prey currently scanning.
    pub vigilance_avg: f64,
    /// Mean prey group size: each prey plus the neighbours it last counted.
    pub group_size_prey: f64,
    /// Event totals so far.
    pub events: EventTally,
}

impl TickRecord {
    /// Sample the model.
    pub fn sample(model: &Model) -> Self {
        let population = model.population();
        let n_prey = population.count(AgentKind::Prey);

        let mut vigilance_total = 0_usize;
        let mut group_sum = 0.0;
        let mut counted = 0_usize;
        for prey in model.live_prey() {
            if prey.is_scanning() {
                vigilance_total = vigilance_total.saturating_add(1);
            }
            group_sum += prey.neighbours_in_zone as f64 + 1.0;
            counted = counted.saturating_add(1);
        }

        Self {
            tick: model.tick(),
            n_agents: population.total(),
            n_prey,
            n_predators: population.count(AgentKind::Predator),
            n_food: population.count(AgentKind::Food),
            predation_risk: model.predation_risk(),
            vigilance_total,
            vigilance_avg: ratio(vigilance_total as f64, counted),
            group_size_prey: ratio(group_sum, counted),
            events: model.tally(),
        }
    }
}

fn ratio(sum: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// The reduced series the batch runner averages across runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OverviewRow {
    /// Tick of the sample.
    pub time: f64,
    /// Accumulated predation risk.
    pub predation_risk: f64,
    /// Prey scanning.
    pub vigilance_total: f64,
    /// Share of prey scanning.
    pub vigilance_avg: f64,
    /// Mean prey group size.
    pub group_size_prey: f64,
}

impl From<&TickRecord> for OverviewRow {
    fn from(record: &TickRecord) -> Self {
        Self {
            time: record.tick as f64,
            predation_risk: record.predation_risk,
            vigilance_total: record.vigilance_total as f64,
            vigilance_avg: record.vigilance_avg,
            group_size_prey: record.group_size_prey,
        }
    }
}

/// CSV header matching [`DataCollector::to_csv`].
pub const CSV_HEADER: &str = "tick,n_agents,n_prey,n_predators,n_food,predation_risk,\
vigilance_total,vigilance_avg,group_size_prey,prey_births,forced_births,predator_births,\
deaths_starvation,deaths_old_age,deaths_random,kills,food_eaten";

/// Accumulates one [`TickRecord`] per tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataCollector {
    records: Vec<TickRecord>,
}

impl DataCollector {
    /// An empty collector.
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Append a sample.
    pub fn push(&mut self, record: TickRecord) {
        self.records.push(record);
    }

    /// Every sample so far, oldest first.
    pub fn records(&self) -> &[TickRecord] {
        &self.records
    }

    /// The most recent sample.
    pub fn latest(&self) -> Option<&TickRecord> {
        self.records.last()
    }

    /// The reduced overview series.
    pub fn overview(&self) -> Vec<OverviewRow> {
        self.records.iter().map(OverviewRow::from).collect()
    }

    /// Render every sample as CSV, header included.
    pub fn to_csv(&self) -> String {
        let mut csv = String::with_capacity(self.records.len().saturating_add(1).saturating_mul(96));
        csv.push_str(CSV_HEADER);
        csv.push('\n');
        for record in &self.records {
            push_csv_row(&mut csv, record);
        }
        csv
    }

    /// Render the samples taken after tick `after` as CSV rows, no header.
    pub fn csv_rows_after(&self, after: Option<u64>) -> String {
        let mut csv = String::new();
        for record in self
            .records
            .iter()
            .filter(|r| after.is_none_or(|t| r.tick > t))
        {
            push_csv_row(&mut csv, record);
        }
        csv
    }
}

fn push_csv_row(csv: &mut String, r: &TickRecord) {
    let e = &r.events;
    let _ = writeln!(
        csv,
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        r.tick,
        r.n_agents,
        r.n_prey,
        r.n_predators,
        r.n_food,
        r.predation_risk,
        r.vigilance_total,
        r.vigilance_avg,
        r.group_size_prey,
        e.prey_births,
        e.forced_births,
        e.predator_births,
        e.starvation,
        e.old_age,
        e.random_deaths,
        e.kills,
        e.food_eaten,
    );
}
