//! Benchmark configuration, resolved once and threaded through every call.

use std::path::PathBuf;

/// Environment variable that overrides the default results directory.
pub const RESULTS_DIR_ENV: &str = "DAGBENCH_RESULTS_DIR";

/// Default results directory, relative to the working directory.
pub const DEFAULT_RESULTS_DIR: &str = "benchmark/results";

/// Tuning knobs for the benchmark engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    /// Where summaries are written when a call does not name a directory.
    pub results_dir: PathBuf,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self { results_dir: PathBuf::from(DEFAULT_RESULTS_DIR) }
    }
}

impl BenchConfig {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self { results_dir: results_dir.into() }
    }

    /// Default config with [`RESULTS_DIR_ENV`] applied when set and non-empty.
    pub fn from_env() -> Self {
        match std::env::var(RESULTS_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => Self::new(dir),
            _ => Self::default(),
        }
    }
}
