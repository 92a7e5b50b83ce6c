//! `SimulatedNode`: a pipeline stage whose only work is a fixed delay.
//!
//! Stands in for a real stage (LLM call, retrieval, tool use) when comparing
//! orchestration strategies: the interesting quantity is when each stage
//! starts and ends, not what it computes.  A stage can also be scripted to
//! fail once its delay has elapsed, which is how abort paths are exercised.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{trace, warn};

use crate::{ExecutableNode, ExecutionContext, NodeError};

#[derive(Debug)]
pub struct SimulatedNode {
    pub id: String,
    pub delay: Duration,
    failure: Option<String>,
    invocations: AtomicUsize,
}

impl SimulatedNode {
    pub fn new(id: impl Into<String>, delay: Duration) -> Self {
        Self { id: id.into(), delay, failure: None, invocations: AtomicUsize::new(0) }
    }

    pub fn from_millis(id: impl Into<String>, millis: u64) -> Self {
        Self::new(id, Duration::from_millis(millis))
    }

    /// Fail with `reason` after sleeping instead of producing an output.
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    /// How many times `execute` has been entered.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutableNode for SimulatedNode {
    async fn execute(&self, input: Value, _ctx: &ExecutionContext) -> Result<Value, NodeError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        trace!(node = %self.id, delay_ms = self.delay.as_millis() as u64, "simulated stage");
        tokio::time::sleep(self.delay).await;

        if let Some(reason) = &self.failure {
            warn!(node = %self.id, %reason, "simulated stage failing");
            return Err(NodeError::Failed(reason.clone()));
        }
        Ok(json!({ "node": self.id, "input": input }))
    }
}
