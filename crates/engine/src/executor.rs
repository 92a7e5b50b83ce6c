//! Pipeline executor used to drive chain-vs-graph measurements.
//!
//! `PipelineExecutor` owns a compiled, acyclic plan and a registry of node
//! implementations:
//! 1. [`PipelineExecutor::run_chain`] runs the topological order one node at
//!    a time, passing each node's JSON output to the next.
//! 2. [`PipelineExecutor::run_graph`] starts every node as soon as all of its
//!    predecessors have completed; a node's input is an object keyed by
//!    predecessor id.
//!
//! Any node failure aborts the run.  Events are traced and, when a channel is
//! attached, forwarded to it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use nodes::{ExecutableNode, ExecutionContext, NodeError};

use crate::dag::compile;
use crate::events::{ExecutionEvent, ExecutionMode};
use crate::{EngineError, ExecutionPlan, GraphDescription};

// ---------------------------------------------------------------------------
// Node registry
// ---------------------------------------------------------------------------

/// Maps node ids to their implementations.
pub type NodeRegistry = HashMap<String, Arc<dyn ExecutableNode>>;

// ---------------------------------------------------------------------------
// Output of a completed run
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub execution_id: Uuid,
    /// Chain mode: the last node's output.  Graph mode: an object keyed by
    /// sink id.
    pub output: Value,
    /// Node ids in completion order.
    pub completed: Vec<String>,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// PipelineExecutor
// ---------------------------------------------------------------------------

pub struct PipelineExecutor {
    plan: ExecutionPlan,
    order: Vec<String>,
    registry: NodeRegistry,
    events: Option<UnboundedSender<ExecutionEvent>>,
}

type NodeOutcome = (String, Duration, Result<Value, NodeError>);

impl PipelineExecutor {
    /// Compile `graph` and check that every node has an implementation.
    ///
    /// # Errors
    /// - [`EngineError::CycleDetected`] if the graph is not a DAG.
    /// - [`EngineError::MissingNode`] if a node id is absent from `registry`.
    pub fn new(graph: &GraphDescription, registry: NodeRegistry) -> Result<Self, EngineError> {
        let plan = compile(graph);
        let order = plan.topological_order.clone().ok_or(EngineError::CycleDetected)?;
        if let Some(missing) = plan.node_ids.iter().find(|id| !registry.contains_key(*id)) {
            return Err(EngineError::MissingNode(missing.clone()));
        }
        Ok(Self { plan, order, registry, events: None })
    }

    /// Forward every event to `tx` as well as to the trace log.
    pub fn with_events(mut self, tx: UnboundedSender<ExecutionEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    /// Run every node back to back in topological order.
    #[instrument(skip(self, input), fields(nodes = self.order.len()))]
    pub async fn run_chain(&self, input: Value) -> Result<ExecutionResult, EngineError> {
        let ctx = ExecutionContext::new(input.clone());
        let started = self.start(&ctx, ExecutionMode::Chain);

        let mut current = input;
        for node_id in &self.order {
            let node = self.node(node_id)?;
            self.emit(ExecutionEvent::NodeStarted {
                execution_id: ctx.execution_id,
                node_id: node_id.clone(),
                timestamp: Utc::now(),
            });

            let t0 = Instant::now();
            current = node
                .execute(current, &ctx)
                .await
                .map_err(|source| self.fail(node_id, source))?;
            self.node_done(&ctx, node_id, t0.elapsed());
        }

        Ok(self.finish(&ctx, started, current, self.order.clone()))
    }

    /// Run each node as soon as all of its predecessors have finished.
    #[instrument(skip(self, input), fields(nodes = self.order.len()))]
    pub async fn run_graph(&self, input: Value) -> Result<ExecutionResult, EngineError> {
        let ctx = ExecutionContext::new(input.clone());
        let started = self.start(&ctx, ExecutionMode::Graph);

        let predecessors = self.plan.predecessors();
        let mut pending: HashMap<&str, usize> =
            predecessors.iter().map(|(id, p)| (*id, p.len())).collect();
        let mut outputs: HashMap<String, Value> = HashMap::with_capacity(self.order.len());
        let mut completed = Vec::with_capacity(self.order.len());
        let mut running: JoinSet<NodeOutcome> = JoinSet::new();

        // Sources start immediately, in topological order.
        for node_id in self.order.iter().filter(|id| pending[id.as_str()] == 0) {
            self.spawn_node(&mut running, &ctx, node_id, input.clone())?;
        }

        while let Some(joined) = running.join_next().await {
            let (node_id, elapsed, result) =
                joined.map_err(|e| EngineError::TaskAborted(e.to_string()))?;
            let output = result.map_err(|source| self.fail(&node_id, source))?;
            self.node_done(&ctx, &node_id, elapsed);

            outputs.insert(node_id.clone(), output);
            for next in self.plan.successors(&node_id) {
                let Some(left) = pending.get_mut(next.as_str()) else { continue };
                *left -= 1;
                if *left == 0 {
                    let gathered = gather_inputs(&predecessors[next.as_str()], &outputs);
                    self.spawn_node(&mut running, &ctx, next, gathered)?;
                }
            }
            completed.push(node_id);
        }

        let sinks: Map<String, Value> = self
            .order
            .iter()
            .filter(|id| self.plan.successors(id).is_empty())
            .filter_map(|id| outputs.remove(id.as_str()).map(|v| (id.clone(), v)))
            .collect();

        Ok(self.finish(&ctx, started, Value::Object(sinks), completed))
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn node(&self, node_id: &str) -> Result<Arc<dyn ExecutableNode>, EngineError> {
        self.registry
            .get(node_id)
            .cloned()
            .ok_or_else(|| EngineError::MissingNode(node_id.to_owned()))
    }

    fn spawn_node(
        &self,
        running: &mut JoinSet<NodeOutcome>,
        ctx: &ExecutionContext,
        node_id: &str,
        input: Value,
    ) -> Result<(), EngineError> {
        let node = self.node(node_id)?;
        self.emit(ExecutionEvent::NodeStarted {
            execution_id: ctx.execution_id,
            node_id: node_id.to_owned(),
            timestamp: Utc::now(),
        });

        let (id, ctx) = (node_id.to_owned(), ctx.clone());
        running.spawn(async move {
            let t0 = Instant::now();
            let result = node.execute(input, &ctx).await;
            (id, t0.elapsed(), result)
        });
        Ok(())
    }

    fn start(&self, ctx: &ExecutionContext, mode: ExecutionMode) -> Instant {
        self.emit(ExecutionEvent::ExecutionStarted {
            execution_id: ctx.execution_id,
            mode,
            timestamp: Utc::now(),
        });
        Instant::now()
    }

    fn node_done(&self, ctx: &ExecutionContext, node_id: &str, elapsed: Duration) {
        self.emit(ExecutionEvent::NodeCompleted {
            execution_id: ctx.execution_id,
            node_id: node_id.to_owned(),
            duration_ms: elapsed.as_millis() as u64,
            timestamp: Utc::now(),
        });
    }

    fn finish(
        &self,
        ctx: &ExecutionContext,
        started: Instant,
        output: Value,
        completed: Vec<String>,
    ) -> ExecutionResult {
        let elapsed = started.elapsed();
        self.emit(ExecutionEvent::ExecutionCompleted {
            execution_id: ctx.execution_id,
            total_duration_ms: elapsed.as_millis() as u64,
            timestamp: Utc::now(),
        });
        info!(execution_id = %ctx.execution_id, elapsed_ms = elapsed.as_millis() as u64, "run completed");
        ExecutionResult { execution_id: ctx.execution_id, output, completed, elapsed }
    }

    fn fail(&self, node_id: &str, source: NodeError) -> EngineError {
        error!("node '{}' failed: {}", node_id, source);
        EngineError::NodeFailed { node_id: node_id.to_owned(), source }
    }

    fn emit(&self, event: ExecutionEvent) {
        debug!("{}", event.trace_line());
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is listening any more.
            let _ = tx.send(event);
        }
    }
}

/// Input for a node with predecessors: `{ pred_id: pred_output, ... }`.
fn gather_inputs(preds: &[&str], outputs: &HashMap<String, Value>) -> Value {
    let mut gathered = Map::new();
    for &p in preds {
        if let Some(v) = outputs.get(p) {
            gathered.insert(p.to_owned(), v.clone());
        }
    }
    Value::Object(gathered)
}
