//! Execution events emitted while a pipeline runs.
//!
//! A closed set: consumers match exhaustively instead of inspecting types at
//! runtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a pipeline is being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One node at a time, in topological order.
    Chain,
    /// Every node as soon as its predecessors have finished.
    Graph,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionEvent {
    ExecutionStarted {
        execution_id: Uuid,
        mode: ExecutionMode,
        timestamp: DateTime<Utc>,
    },
    NodeStarted {
        execution_id: Uuid,
        node_id: String,
        timestamp: DateTime<Utc>,
    },
    NodeCompleted {
        execution_id: Uuid,
        node_id: String,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    ConditionEvaluated {
        execution_id: Uuid,
        node_id: String,
        condition: String,
        result: bool,
        timestamp: DateTime<Utc>,
    },
    ExecutionCompleted {
        execution_id: Uuid,
        total_duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

impl ExecutionEvent {
    pub fn execution_id(&self) -> Uuid {
        match self {
            Self::ExecutionStarted { execution_id, .. }
            | Self::NodeStarted { execution_id, .. }
            | Self::NodeCompleted { execution_id, .. }
            | Self::ConditionEvaluated { execution_id, .. }
            | Self::ExecutionCompleted { execution_id, .. } => *execution_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::ExecutionStarted { timestamp, .. }
            | Self::NodeStarted { timestamp, .. }
            | Self::NodeCompleted { timestamp, .. }
            | Self::ConditionEvaluated { timestamp, .. }
            | Self::ExecutionCompleted { timestamp, .. } => *timestamp,
        }
    }

    /// One-line human-readable trace of the event.
    pub fn trace_line(&self) -> String {
        let ts = self.timestamp().to_rfc3339();
        match self {
            Self::ExecutionStarted { execution_id, mode, .. } => {
                format!("[TRACE] {ts} EXECUTION STARTED id={execution_id} mode={mode:?}")
            }
            Self::NodeStarted { node_id, .. } => format!("[TRACE] {ts} NODE START id={node_id}"),
            Self::NodeCompleted { node_id, duration_ms, .. } => {
                format!("[TRACE] {ts} NODE DONE id={node_id} durMs={duration_ms}")
            }
            Self::ConditionEvaluated { node_id, condition, result, .. } => {
                format!("[TRACE] {ts} CONDITION id={node_id} `{condition}` => {result}")
            }
            Self::ExecutionCompleted { total_duration_ms, .. } => {
                format!("[TRACE] {ts} EXECUTION COMPLETED durMs={total_duration_ms}")
            }
        }
    }
}
