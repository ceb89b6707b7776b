//! Tick callback that writes collector rows to disk as the run goes.
//!
//! The file gets its header on creation. Every `interval` ticks the rows
//! sampled since the last write are appended, so a long run can be
//! inspected while it is still going. A failed write is logged and
//! retried at the next interval; it never stops the simulation.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use predation_core::collector::CSV_HEADER;
use predation_core::{Model, TickCallback, TickSummary};
use tracing::{debug, warn};

use crate::error::EngineError;

/// Appends new collector rows to a CSV file every few ticks.
#[derive(Debug)]
pub struct CsvSnapshot {
    path: PathBuf,
    interval: u64,
    written_through: Option<u64>,
    write_failures: u32,
}

impl CsvSnapshot {
    /// Create (or truncate) the file at `path` and write the header.
    ///
    /// An `interval` of zero is treated as one.
    pub fn create(path: &Path, interval: u64) -> Result<Self, EngineError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| EngineError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, format!("{CSV_HEADER}\n")).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            interval: interval.max(1),
            written_through: None,
            write_failures: 0,
        })
    }

    /// Where rows are written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes that failed so far.
    pub const fn write_failures(&self) -> u32 {
        self.write_failures
    }

    /// Append every row sampled since the last write. Returns the number
    /// of rows written.
    pub fn flush(&mut self, model: &Model) -> Result<usize, EngineError> {
        let rows = model.collector().csv_rows_after(self.written_through);
        if rows.is_empty() {
            return Ok(0);
        }
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|source| EngineError::Io {
                path: self.path.clone(),
                source,
            })?;
        file.write_all(rows.as_bytes())
            .map_err(|source| EngineError::Io {
                path: self.path.clone(),
                source,
            })?;
        self.written_through = model.collector().latest().map(|r| r.tick);
        Ok(rows.lines().count())
    }
}

impl TickCallback for CsvSnapshot {
    fn on_tick(&mut self, summary: &TickSummary, model: &Model) {
        if summary.tick.checked_rem(self.interval) != Some(0) {
            return;
        }
        match self.flush(model) {
            Ok(rows) => debug!(tick = summary.tick, rows, "Snapshot written"),
            Err(error) => {
                self.write_failures = self.write_failures.saturating_add(1);
                warn!(
                    tick = summary.tick,
                    path = %self.path.display(),
                    error = %error,
                    "Snapshot write failed, will retry"
                );
            }
        }
    }
}
