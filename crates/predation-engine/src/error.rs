//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps every failure
//! mode of startup, single runs, and batch sweeps.

use std::path::PathBuf;

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: predation_core::ConfigError,
    },

    /// The initial model could not be built.
    #[error("model error: {source}")]
    Model {
        /// The underlying model error.
        #[from]
        source: predation_core::ModelError,
    },

    /// The simulation loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: predation_core::RunnerError,
    },

    /// A batch sweep failed.
    #[error("batch error: {source}")]
    Batch {
        /// The underlying experiment error.
        #[from]
        source: predation_core::experiment::ExperimentError,
    },

    /// A results file could not be written.
    #[error("failed to write {path}: {source}")]
    Io {
        /// The file or directory being written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The logging filter could not be built.
    #[error("invalid log filter '{filter}': {message}")]
    LogFilter {
        /// The filter string that was rejected.
        filter: String,
        /// Parser message.
        message: String,
    },
}
