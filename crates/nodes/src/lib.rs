//! `nodes` crate: the `ExecutableNode` trait and the pipeline stages used to
//! drive chain-vs-graph measurements.
//!
//! The engine crate dispatches execution through this trait object.

pub mod error;
pub mod traits;
pub mod simulated;

pub use error::NodeError;
pub use simulated::SimulatedNode;
pub use traits::{ExecutableNode, ExecutionContext};
