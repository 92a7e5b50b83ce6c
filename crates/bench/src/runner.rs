//! The benchmark engine.
//!
//! `Benchmark` times caller operations and turns the samples into summaries:
//! 1. Trials run strictly one after another, so each sample is the latency
//!    of a single call and never includes queueing behind another trial.
//! 2. Samples are whole milliseconds from a monotonic clock.
//! 3. Each summary is logged and persisted through the results sink.
//! 4. An operation error aborts the remaining trials and is returned as
//!    [`BenchError::Operation`]; no partial summary is produced.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;

use chrono::Utc;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{info, instrument};

use crate::config::BenchConfig;
use crate::models::{MeasurementResult, SuccessSummaryResult, SummaryResult, TheoryResult};
use crate::sink::write_report;
use crate::stats::LatencyStats;
use crate::BenchError;

#[derive(Debug, Clone, Default)]
pub struct Benchmark {
    config: BenchConfig,
}

impl Benchmark {
    pub fn new(config: BenchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Time a single call.  Nothing is persisted.
    pub async fn measure_once<F, Fut>(&self, name: &str, op: F) -> Result<MeasurementResult, BenchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<String>>,
    {
        let started = Instant::now();
        let outcome = op().await.map_err(|source| BenchError::Operation {
            name: name.to_owned(),
            iteration: 0,
            source,
        })?;
        let result = MeasurementResult {
            name: name.to_owned(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
            outcome,
        };
        info!(name, elapsed_ms = result.elapsed_ms, outcome = %result.outcome, "measurement");
        Ok(result)
    }

    /// Run `op` `iterations` times sequentially and summarise the latencies.
    ///
    /// `results_dir = None` writes to the configured default directory.
    ///
    /// # Errors
    /// - [`BenchError::InvalidArgument`] if `iterations == 0`.
    /// - [`BenchError::Operation`] if any trial fails.
    #[instrument(skip(self, op, results_dir))]
    pub async fn measure_many<F, Fut>(
        &self,
        name: &str,
        iterations: usize,
        mut op: F,
        results_dir: Option<&Path>,
    ) -> Result<SummaryResult, BenchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        if iterations == 0 {
            return Err(BenchError::InvalidArgument("iterations must be positive".into()));
        }

        let mut samples = Vec::with_capacity(iterations);
        for iteration in 0..iterations {
            let started = Instant::now();
            op().await.map_err(|source| BenchError::Operation {
                name: name.to_owned(),
                iteration,
                source,
            })?;
            samples.push(started.elapsed().as_millis() as u64);
        }

        let stats = LatencyStats::from_samples(&mut samples);
        let summary = SummaryResult {
            name: name.to_owned(),
            iterations,
            mean_ms: stats.mean,
            p95_ms: stats.p95,
            p99_ms: stats.p99,
            timestamp: Utc::now(),
        };
        info!(
            name,
            iterations,
            mean_ms = summary.mean_ms,
            p95_ms = summary.p95_ms,
            p99_ms = summary.p99_ms,
            "latency summary"
        );

        write_report(self.dir(results_dir), name, &summary).await?;
        Ok(summary)
    }

    /// Run a boolean `op` `iterations` times sequentially and report the
    /// success rate.
    ///
    /// # Errors
    /// Same as [`Benchmark::measure_many`].
    #[instrument(skip(self, op, results_dir))]
    pub async fn measure_success<F, Fut>(
        &self,
        name: &str,
        iterations: usize,
        mut op: F,
        results_dir: Option<&Path>,
    ) -> Result<SuccessSummaryResult, BenchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<bool>>,
    {
        if iterations == 0 {
            return Err(BenchError::InvalidArgument("iterations must be positive".into()));
        }

        let mut success_count = 0usize;
        for iteration in 0..iterations {
            let ok = op().await.map_err(|source| BenchError::Operation {
                name: name.to_owned(),
                iteration,
                source,
            })?;
            if ok {
                success_count += 1;
            }
        }

        let summary = SuccessSummaryResult {
            name: name.to_owned(),
            iterations,
            success_count,
            success_rate: success_count as f64 / iterations as f64,
            timestamp: Utc::now(),
        };
        info!(name, iterations, success_count, success_rate = summary.success_rate, "success summary");

        write_report(self.dir(results_dir), name, &summary).await?;
        Ok(summary)
    }

    /// Persist theoretical figures (critical path, centrality, bounds) next
    /// to the measured summaries.
    pub async fn write_theory(
        &self,
        name: &str,
        data: BTreeMap<String, Value>,
        results_dir: Option<&Path>,
    ) -> Result<TheoryResult, BenchError> {
        let theory = TheoryResult { name: name.to_owned(), timestamp: Utc::now(), data };
        write_report(self.dir(results_dir), name, &theory).await?;
        info!(name, entries = theory.data.len(), "theory written");
        Ok(theory)
    }

    fn dir<'a>(&'a self, results_dir: Option<&'a Path>) -> &'a Path {
        results_dir.unwrap_or(self.config.results_dir.as_path())
    }
}
