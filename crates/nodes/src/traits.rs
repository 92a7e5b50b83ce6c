//! The `ExecutableNode` trait: the contract every pipeline stage must fulfil.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::NodeError;

/// Shared context passed to every node during a run.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// ID of the current run.
    pub execution_id: Uuid,
    /// Input supplied when the run was started.
    pub input: Value,
}

impl ExecutionContext {
    /// Fresh context with a new run id.
    pub fn new(input: Value) -> Self {
        Self { execution_id: Uuid::new_v4(), input }
    }
}

/// The core node trait.
#[async_trait]
pub trait ExecutableNode: Send + Sync {
    /// Execute the node.
    ///
    /// In chain mode `input` is the previous node's output; in graph mode it
    /// is an object keyed by predecessor id (or the run input for sources).
    async fn execute(
        &self,
        input: Value,
        ctx: &ExecutionContext,
    ) -> Result<Value, NodeError>;
}
