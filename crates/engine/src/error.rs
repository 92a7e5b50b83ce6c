//! Engine-level error types.

use thiserror::Error;

/// Errors produced by the engine (graph construction, analysis, execution).
#[derive(Debug, Error)]
pub enum EngineError {
    // ------ Construction errors ------

    /// Two or more nodes share the same ID.
    #[error("duplicate node ID: '{0}'")]
    DuplicateNodeId(String),

    /// An edge references a node ID that doesn't exist in the graph.
    #[error("edge references unknown node '{node_id}' ({side} side)")]
    UnknownNodeReference {
        node_id: String,
        side: &'static str,
    },

    // ------ Structural errors ------

    /// Acyclicity was required but the graph contains a cycle.
    #[error("graph contains a cycle (not a DAG); review dependencies/edges")]
    CycleDetected,

    /// Accumulated durations no longer fit in a `u64` millisecond count.
    #[error("duration total overflows at node '{0}'")]
    DurationOverflow(String),

    // ------ Execution errors ------

    /// A plan node has no registered implementation.
    #[error("no implementation registered for node '{0}'")]
    MissingNode(String),

    /// A node failed; the whole run is aborted.
    #[error("node '{node_id}' failed: {source}")]
    NodeFailed {
        node_id: String,
        #[source]
        source: nodes::NodeError,
    },

    /// A spawned node task panicked or was cancelled.
    #[error("node task did not complete: {0}")]
    TaskAborted(String),
}
