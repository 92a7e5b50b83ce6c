//! `bench` crate: latency and success-rate measurement, A/B comparison of
//! two implementations, and persistence of JSON/Markdown summaries.

pub mod config;
pub mod error;
pub mod models;
pub mod stats;
pub mod sink;
pub mod runner;
pub mod ab;
pub mod fixtures;

pub use ab::{warmup, AbHarness, AbSummary};
pub use config::BenchConfig;
pub use error::BenchError;
pub use fixtures::{fixed_text_inputs, qa_pairs, QaPair};
pub use models::{MeasurementResult, SuccessSummaryResult, SummaryResult, TheoryResult};
pub use runner::Benchmark;
pub use stats::{mean, percentile, LatencyStats};
