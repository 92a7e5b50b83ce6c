//! `dagbench` CLI entry-point.
//!
//! Available sub-commands:
//! - `validate`: check that a graph file is acyclic and print its order.
//! - `analyze`: critical path, betweenness centrality and makespan bounds.
//! - `ab`: chain vs graph latency comparison over simulated nodes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use bench::{AbHarness, BenchConfig, Benchmark};
use clap::{Parser, Subcommand};
use engine::{DurationTable, EngineError, GraphDescription, NodeRegistry, PipelineExecutor};
use nodes::{ExecutableNode, SimulatedNode};
use serde_json::{json, Value};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "dagbench",
    about = "Chain vs graph orchestration analysis and benchmarks",
    version
)]
struct Cli {
    /// Directory for JSON and Markdown summaries.  Falls back to
    /// `$DAGBENCH_RESULTS_DIR`, then `benchmark/results`.
    #[arg(long, global = true)]
    results_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a graph definition JSON file.
    Validate {
        /// Path to the graph JSON file.
        path: PathBuf,
    },
    /// Report critical path, centrality and makespan for a graph.
    Analyze {
        path: PathBuf,
        /// JSON object mapping node id to duration in milliseconds.
        #[arg(long)]
        durations: Option<PathBuf>,
    },
    /// Measure chain vs graph execution latency with simulated nodes.
    Ab {
        path: PathBuf,
        #[arg(long)]
        durations: PathBuf,
        #[arg(long, default_value_t = 10)]
        inputs: usize,
        #[arg(long, default_value_t = bench::fixtures::DEFAULT_SEED)]
        seed: u64,
        /// Warmup passes over the inputs before measuring.
        #[arg(long, default_value_t = 1)]
        warmup: usize,
        #[arg(long, default_value_t = 2)]
        parallelism: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = cli.results_dir.map(BenchConfig::new).unwrap_or_else(BenchConfig::from_env);
    let bench = Benchmark::new(config);

    match cli.command {
        Command::Validate { path } => {
            let graph = load_graph(&path)?;
            match engine::ensure_acyclic(&graph) {
                Ok(order) => {
                    println!("Graph is valid. Execution order: {}", order.join(" -> "));
                }
                Err(e) => {
                    eprintln!("Validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Command::Analyze { path, durations } => {
            let graph = load_graph(&path)?;
            let durations = match durations {
                Some(p) => load_durations(&p)?,
                None => DurationTable::new(),
            };
            analyze(&bench, &path, &graph, &durations).await?;
        }
        Command::Ab { path, durations, inputs, seed, warmup, parallelism } => {
            let graph = load_graph(&path)?;
            let durations = load_durations(&durations)?;
            run_ab(&bench, &path, &graph, &durations, inputs, seed, warmup, parallelism).await?;
        }
    }
    Ok(())
}

fn load_graph(path: &Path) -> anyhow::Result<GraphDescription> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read graph file {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid graph JSON in {}", path.display()))
}

fn load_durations(path: &Path) -> anyhow::Result<DurationTable> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read durations file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("invalid durations JSON in {}", path.display()))
}

/// Run name derived from the graph file stem.
fn run_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "graph".to_owned())
}

async fn analyze(
    bench: &Benchmark,
    path: &Path,
    graph: &GraphDescription,
    durations: &DurationTable,
) -> anyhow::Result<()> {
    let plan = engine::compile(graph);
    let scores = engine::centrality(&plan);

    let mut ranked: Vec<_> = scores.iter().collect();
    ranked.sort_by(|(a_id, a), (b_id, b)| b.total_cmp(a).then_with(|| a_id.cmp(b_id)));
    println!("Betweenness centrality:");
    for (id, score) in &ranked {
        println!("  {id:<16} {score:.4}");
    }

    let mut data = BTreeMap::from([
        ("centrality".to_owned(), json!(scores)),
        ("has_cycles".to_owned(), json!(plan.has_cycles)),
    ]);

    // Centrality is defined on cyclic graphs; timing bounds are not.
    match engine::makespan(&plan, durations) {
        Ok(makespan) => {
            println!("Critical path: {} ({} ms)", makespan.critical_path.join(" -> "), makespan.graph_total);
            println!("Chain total:   {} ms", makespan.chain_total);
            println!("Speedup:       {:.2}x", makespan.speedup);
            data.extend([
                ("critical_path".to_owned(), json!(makespan.critical_path.join(" -> "))),
                ("critical_path_total_ms".to_owned(), json!(makespan.graph_total)),
                ("chain_total_ms".to_owned(), json!(makespan.chain_total)),
                ("speedup".to_owned(), json!(makespan.speedup)),
            ]);
        }
        Err(EngineError::CycleDetected) => {
            warn!("graph contains a cycle; critical path and makespan skipped");
            println!("Critical path: n/a (graph contains a cycle)");
        }
        Err(e) => return Err(e.into()),
    }

    let name = format!("{}_theory", run_name(path));
    bench.write_theory(&name, data, None).await?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_ab(
    bench: &Benchmark,
    path: &Path,
    graph: &GraphDescription,
    durations: &DurationTable,
    inputs: usize,
    seed: u64,
    warmup_passes: usize,
    parallelism: usize,
) -> anyhow::Result<()> {
    let registry: NodeRegistry = graph
        .nodes()
        .iter()
        .map(|id| {
            let delay = durations.get(id).copied().unwrap_or(0);
            let node: Arc<dyn ExecutableNode> = Arc::new(SimulatedNode::from_millis(id.clone(), delay));
            (id.clone(), node)
        })
        .collect();
    let executor = Arc::new(PipelineExecutor::new(graph, registry)?);
    let prompts = bench::fixed_text_inputs(inputs, seed)?;

    let chain = {
        let executor = executor.clone();
        move |prompt: String| {
            let executor = executor.clone();
            async move {
                executor.run_chain(Value::String(prompt)).await?;
                anyhow::Ok(())
            }
        }
    };
    let graph_run = {
        let executor = executor.clone();
        move |prompt: String| {
            let executor = executor.clone();
            async move {
                executor.run_graph(Value::String(prompt)).await?;
                anyhow::Ok(())
            }
        }
    };

    let harness = AbHarness::new(bench);
    for pass in 0..warmup_passes {
        info!(pass, parallelism, "warmup");
        harness.warmup(&prompts, chain.clone(), graph_run.clone(), parallelism).await?;
    }

    let summary = harness
        .run_latency_ab(&run_name(path), &prompts, chain, graph_run, None)
        .await?;

    println!(
        "{:<28} mean {:>6} ms  p95 {:>6} ms  p99 {:>6} ms",
        summary.baseline.name, summary.baseline.mean_ms, summary.baseline.p95_ms, summary.baseline.p99_ms
    );
    println!(
        "{:<28} mean {:>6} ms  p95 {:>6} ms  p99 {:>6} ms",
        summary.candidate.name,
        summary.candidate.mean_ms,
        summary.candidate.p95_ms,
        summary.candidate.p99_ms
    );
    if let Some(speedup) = summary.mean_speedup() {
        println!("Mean speedup: {speedup:.2}x");
    }
    Ok(())
}
