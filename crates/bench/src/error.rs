//! Typed error type for the bench crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    /// A caller-supplied argument is out of range or missing.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation under measurement failed; remaining trials were skipped.
    #[error("operation '{name}' failed on iteration {iteration}: {source}")]
    Operation {
        name: String,
        iteration: usize,
        #[source]
        source: anyhow::Error,
    },

    /// A warmup task panicked or was cancelled.
    #[error("warmup task did not complete: {0}")]
    Warmup(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
