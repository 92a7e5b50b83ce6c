//! A/B latency harness: two implementations, one deterministic input list.
//!
//! The baseline runs over every input, then the candidate runs over the same
//! inputs in the same order.  The two runs never interleave, so warm caches
//! from one cannot leak into the other's samples.  Use [`warmup`] beforehand
//! to prime lazy state outside the measured window.

use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::models::SummaryResult;
use crate::runner::Benchmark;
use crate::BenchError;

/// Paired summaries of one A/B run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbSummary {
    pub baseline: SummaryResult,
    pub candidate: SummaryResult,
}

impl AbSummary {
    /// `baseline.mean / candidate.mean`, or `None` when the candidate mean is 0.
    pub fn mean_speedup(&self) -> Option<f64> {
        (self.candidate.mean_ms > 0)
            .then(|| self.baseline.mean_ms as f64 / self.candidate.mean_ms as f64)
    }
}

pub struct AbHarness<'a> {
    bench: &'a Benchmark,
    baseline_label: String,
    candidate_label: String,
}

impl<'a> AbHarness<'a> {
    /// Harness comparing a `chain` baseline with a `graph` candidate.
    pub fn new(bench: &'a Benchmark) -> Self {
        Self::with_labels(bench, "chain", "graph")
    }

    pub fn with_labels(
        bench: &'a Benchmark,
        baseline: impl Into<String>,
        candidate: impl Into<String>,
    ) -> Self {
        Self { bench, baseline_label: baseline.into(), candidate_label: candidate.into() }
    }

    /// Summary name for one side of the comparison.
    pub fn run_name(name: &str, label: &str) -> String {
        format!("{name}_{label}_latency")
    }

    /// Measure `op_a` then `op_b`, one trial per input.
    ///
    /// Summaries are written as `<name>_<label>_latency`.
    ///
    /// # Errors
    /// - [`BenchError::InvalidArgument`] for a blank name or empty inputs.
    /// - [`BenchError::Operation`] from the first failing trial; the other
    ///   side is not run if the baseline fails.
    pub async fn run_latency_ab<I, FA, FutA, FB, FutB>(
        &self,
        name: &str,
        inputs: &[I],
        op_a: FA,
        op_b: FB,
        results_dir: Option<&Path>,
    ) -> Result<AbSummary, BenchError>
    where
        I: Clone,
        FA: Fn(I) -> FutA,
        FutA: Future<Output = anyhow::Result<()>>,
        FB: Fn(I) -> FutB,
        FutB: Future<Output = anyhow::Result<()>>,
    {
        if name.trim().is_empty() {
            return Err(BenchError::InvalidArgument("run name must not be blank".into()));
        }
        if inputs.is_empty() {
            return Err(BenchError::InvalidArgument("inputs must not be empty".into()));
        }
        let n = inputs.len();

        let baseline_index = AtomicUsize::new(0);
        let baseline = self
            .bench
            .measure_many(
                &Self::run_name(name, &self.baseline_label),
                n,
                || op_a(inputs[next_index(&baseline_index, n)].clone()),
                results_dir,
            )
            .await?;

        let candidate_index = AtomicUsize::new(0);
        let candidate = self
            .bench
            .measure_many(
                &Self::run_name(name, &self.candidate_label),
                n,
                || op_b(inputs[next_index(&candidate_index, n)].clone()),
                results_dir,
            )
            .await?;

        info!(
            name,
            baseline_mean_ms = baseline.mean_ms,
            candidate_mean_ms = candidate.mean_ms,
            "a/b run complete"
        );
        Ok(AbSummary { baseline, candidate })
    }

    /// Method form of [`warmup`].
    pub async fn warmup<I, FA, FutA, FB, FutB>(
        &self,
        inputs: &[I],
        op_a: FA,
        op_b: FB,
        parallelism: usize,
    ) -> Result<(), BenchError>
    where
        I: Clone + Send + 'static,
        FA: Fn(I) -> FutA + Send + Sync + 'static,
        FutA: Future<Output = anyhow::Result<()>> + Send + 'static,
        FB: Fn(I) -> FutB + Send + Sync + 'static,
        FutB: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        warmup(inputs, op_a, op_b, parallelism).await
    }
}

/// Dispense the next input index, clamped to the last input.
fn next_index(counter: &AtomicUsize, len: usize) -> usize {
    counter.fetch_add(1, Ordering::Relaxed).min(len - 1)
}

/// Run `op_a` then `op_b` on each input with at most `parallelism` inputs in
/// flight, discarding all timings.
///
/// Every task holds a semaphore permit for its whole lifetime, so a slot is
/// returned on success, error and panic alike.  All tasks are joined before
/// the first error is reported.
///
/// # Errors
/// - [`BenchError::InvalidArgument`] if `parallelism == 0`.
/// - [`BenchError::Operation`] (name `warmup`, iteration = input index).
/// - [`BenchError::Warmup`] if a task panicked.
pub async fn warmup<I, FA, FutA, FB, FutB>(
    inputs: &[I],
    op_a: FA,
    op_b: FB,
    parallelism: usize,
) -> Result<(), BenchError>
where
    I: Clone + Send + 'static,
    FA: Fn(I) -> FutA + Send + Sync + 'static,
    FutA: Future<Output = anyhow::Result<()>> + Send + 'static,
    FB: Fn(I) -> FutB + Send + Sync + 'static,
    FutB: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    if parallelism == 0 {
        return Err(BenchError::InvalidArgument("parallelism must be positive".into()));
    }

    let gate = Arc::new(Semaphore::new(parallelism));
    let (op_a, op_b) = (Arc::new(op_a), Arc::new(op_b));
    let mut tasks = JoinSet::new();

    for (index, input) in inputs.iter().cloned().enumerate() {
        let permit = gate
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| BenchError::Warmup(e.to_string()))?;
        let (a, b) = (op_a.clone(), op_b.clone());

        tasks.spawn(async move {
            let _permit = permit;
            a.as_ref()(input.clone()).await.map_err(|e| (index, e))?;
            b.as_ref()(input).await.map_err(|e| (index, e))
        });
    }

    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        let failure = match joined {
            Ok(Ok(())) => continue,
            Ok(Err((iteration, source))) => {
                BenchError::Operation { name: "warmup".into(), iteration, source }
            }
            Err(e) => BenchError::Warmup(e.to_string()),
        };
        first_error.get_or_insert(failure);
    }

    match first_error {
        Some(err) => Err(err),
        None => {
            debug!(inputs = inputs.len(), parallelism, "warmup complete");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BenchConfig;
    use std::sync::Mutex;
    use std::time::Duration;

    fn bench_in(dir: &Path) -> Benchmark {
        Benchmark::new(BenchConfig::new(dir))
    }

    fn inputs(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("q{i}")).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn slower_baseline_has_higher_mean() {
        let tmp = tempfile::tempdir().unwrap();
        let bench = bench_in(tmp.path());

        let summary = AbHarness::new(&bench)
            .run_latency_ab(
                "sleep",
                &inputs(20),
                |_q| async {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    anyhow::Ok(())
                },
                |_q| async {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    anyhow::Ok(())
                },
                None,
            )
            .await
            .unwrap();

        assert!(summary.baseline.mean_ms > summary.candidate.mean_ms);
        assert_eq!(summary.baseline.name, "sleep_chain_latency");
        assert_eq!(summary.candidate.name, "sleep_graph_latency");
        assert_eq!(summary.baseline.iterations, 20);
        assert!(summary.mean_speedup().unwrap() > 1.0);
        assert!(tmp.path().join("sleep_chain_latency-summary.json").exists());
        assert!(tmp.path().join("sleep_graph_latency-summary.md").exists());
    }

    #[tokio::test]
    async fn both_sides_see_inputs_in_the_same_order() {
        let tmp = tempfile::tempdir().unwrap();
        let bench = bench_in(tmp.path());
        let seen_a = Mutex::new(Vec::new());
        let seen_b = Mutex::new(Vec::new());
        let data = inputs(6);

        AbHarness::with_labels(&bench, "v1", "v2")
            .run_latency_ab(
                "order",
                &data,
                |q: String| {
                    seen_a.lock().unwrap().push(q);
                    async { anyhow::Ok(()) }
                },
                |q: String| {
                    // A must have finished completely before B starts.
                    assert_eq!(seen_a.lock().unwrap().len(), 6);
                    seen_b.lock().unwrap().push(q);
                    async { anyhow::Ok(()) }
                },
                None,
            )
            .await
            .unwrap();

        assert_eq!(*seen_a.lock().unwrap(), data);
        assert_eq!(*seen_b.lock().unwrap(), data);
        assert!(tmp.path().join("order_v1_latency-summary.json").exists());
    }

    #[tokio::test]
    async fn baseline_failure_skips_candidate() {
        let tmp = tempfile::tempdir().unwrap();
        let bench = bench_in(tmp.path());
        let candidate_calls = AtomicUsize::new(0);

        let err = AbHarness::new(&bench)
            .run_latency_ab(
                "broken",
                &inputs(3),
                |q: String| async move {
                    if q == "q1" {
                        anyhow::bail!("cannot handle {q}");
                    }
                    anyhow::Ok(())
                },
                |_q| {
                    candidate_calls.fetch_add(1, Ordering::SeqCst);
                    async { anyhow::Ok(()) }
                },
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BenchError::Operation { iteration: 1, .. }));
        assert_eq!(candidate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_inputs_and_blank_names_are_rejected() {
        let bench = Benchmark::default();
        let harness = AbHarness::new(&bench);
        let noop = |_q: String| async { anyhow::Ok(()) };

        let err = harness.run_latency_ab("x", &[], noop, noop, None).await.unwrap_err();
        assert!(matches!(err, BenchError::InvalidArgument(_)));

        let err = harness.run_latency_ab("  ", &inputs(1), noop, noop, None).await.unwrap_err();
        assert!(matches!(err, BenchError::InvalidArgument(_)));
    }

    #[test]
    fn index_counter_clamps_to_last_input() {
        let counter = AtomicUsize::new(0);
        let dispensed: Vec<usize> = (0..5).map(|_| next_index(&counter, 3)).collect();
        assert_eq!(dispensed, vec![0, 1, 2, 2, 2]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn warmup_respects_parallelism() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(AtomicUsize::new(0));

        let op = {
            let (in_flight, peak, calls) = (in_flight.clone(), peak.clone(), calls.clone());
            move |_q: String| {
                let (in_flight, peak, calls) = (in_flight.clone(), peak.clone(), calls.clone());
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    anyhow::Ok(())
                }
            }
        };

        warmup(&inputs(10), op.clone(), op, 2).await.unwrap();

        // Each input runs A then B sequentially inside its task.
        assert_eq!(calls.load(Ordering::SeqCst), 20);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn warmup_failure_releases_permits_and_propagates() {
        let completed = Arc::new(AtomicUsize::new(0));
        let ok = {
            let completed = completed.clone();
            move |_q: String| {
                let completed = completed.clone();
                async move {
                    completed.fetch_add(1, Ordering::SeqCst);
                    anyhow::Ok(())
                }
            }
        };
        let failing = |q: String| async move {
            if q == "q0" {
                anyhow::bail!("cold start failed");
            }
            anyhow::Ok(())
        };

        // With a single slot, a leaked permit from q0 would hang the loop.
        let err = warmup(&inputs(4), ok, failing, 1).await.unwrap_err();
        assert!(matches!(err, BenchError::Operation { iteration: 0, .. }));
        assert_eq!(completed.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn warmup_runs_baseline_before_candidate_per_input() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let side = |label: &'static str| {
            let log = log.clone();
            move |q: String| {
                let log = log.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    log.lock().unwrap().push((q, label));
                    anyhow::Ok(())
                }
            }
        };

        warmup(&inputs(8), side("a"), side("b"), 3).await.unwrap();

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 16);
        for q in inputs(8) {
            let a = log.iter().position(|e| *e == (q.clone(), "a")).unwrap();
            let b = log.iter().position(|e| *e == (q.clone(), "b")).unwrap();
            assert!(a < b, "{q}: candidate ran before baseline");
        }
    }

    #[tokio::test]
    async fn concurrent_runs_keep_their_own_counters() {
        let tmp = tempfile::tempdir().unwrap();
        let bench = bench_in(tmp.path());
        let harness = AbHarness::new(&bench);

        let left: Vec<String> = (0..5).map(|i| format!("left{i}")).collect();
        let right: Vec<String> = (0..5).map(|i| format!("right{i}")).collect();
        let seen_left = Mutex::new(Vec::new());
        let seen_right = Mutex::new(Vec::new());

        async fn tick() -> anyhow::Result<()> {
            tokio::time::sleep(Duration::from_millis(1)).await;
            Ok(())
        }

        // Both runs share one task, so their trials interleave at each tick.
        let (l, r) = tokio::join!(
            harness.run_latency_ab(
                "left",
                &left,
                |q: String| {
                    seen_left.lock().unwrap().push(q);
                    tick()
                },
                |q: String| {
                    seen_left.lock().unwrap().push(q);
                    tick()
                },
                None
            ),
            harness.run_latency_ab(
                "right",
                &right,
                |q: String| {
                    seen_right.lock().unwrap().push(q);
                    tick()
                },
                |q: String| {
                    seen_right.lock().unwrap().push(q);
                    tick()
                },
                None
            ),
        );
        l.unwrap();
        r.unwrap();

        // Each side of each run walks its own list from the start.
        let expected_left: Vec<String> = left.iter().chain(left.iter()).cloned().collect();
        let expected_right: Vec<String> = right.iter().chain(right.iter()).cloned().collect();
        assert_eq!(*seen_left.lock().unwrap(), expected_left);
        assert_eq!(*seen_right.lock().unwrap(), expected_right);
    }

    #[tokio::test]
    async fn warmup_requires_a_slot() {
        let noop = |_q: String| async { anyhow::Ok(()) };
        let err = warmup(&inputs(1), noop, noop, 0).await.unwrap_err();
        assert!(matches!(err, BenchError::InvalidArgument(_)));
    }
}
