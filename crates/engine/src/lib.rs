//! `engine` crate: graph models, plan compilation, structural analysis
//! (critical path, betweenness centrality) and the pipeline executor.

pub mod models;
pub mod error;
pub mod dag;
pub mod critical_path;
pub mod centrality;
pub mod events;
pub mod executor;

pub use models::{DurationTable, Edge, ExecutionPlan, GraphDescription};
pub use error::EngineError;
pub use dag::{analyze, compile, ensure_acyclic};
pub use critical_path::{critical_path, makespan, CriticalPathResult, Makespan};
pub use centrality::{centrality, CentralityScores};
pub use events::{ExecutionEvent, ExecutionMode};
pub use executor::{ExecutionResult, NodeRegistry, PipelineExecutor};
