//! Node-level error type.

use thiserror::Error;

/// Errors returned by a node's `execute` method.
///
/// Any failure aborts the surrounding run; there is no retry path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// The node could not produce an output.
    #[error("node error: {0}")]
    Failed(String),
}
