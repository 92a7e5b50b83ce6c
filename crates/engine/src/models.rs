//! Core graph models.
//!
//! A [`GraphDescription`] is what callers hand to the plan compiler: an
//! ordered set of node ids plus an ordered list of directed edges.  The
//! structural invariants (unique ids, edges only between declared nodes) are
//! enforced when the description is built, so the compiler itself never has
//! to fail.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::EngineError;

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

/// Directed edge from one node to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self { from: from.into(), to: to.into() }
    }
}

// ---------------------------------------------------------------------------
// GraphDescription
// ---------------------------------------------------------------------------

/// Wire shape of a graph file, before validation.
#[derive(Debug, Clone, Deserialize)]
struct RawGraph {
    nodes: Vec<String>,
    #[serde(default)]
    edges: Vec<Edge>,
}

/// A validated workflow graph.
///
/// Node registration order is preserved; it drives every deterministic
/// tie-break downstream (queue seeding in the compiler, source iteration in
/// centrality).  Duplicate edges are kept as given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGraph")]
pub struct GraphDescription {
    nodes: Vec<String>,
    edges: Vec<Edge>,
    #[serde(skip)]
    index: HashSet<String>,
}

impl GraphDescription {
    /// Build and validate a graph in one go.
    ///
    /// # Errors
    /// - [`EngineError::DuplicateNodeId`] if two nodes share an id.
    /// - [`EngineError::UnknownNodeReference`] if an edge references a
    ///   node that was not declared.
    pub fn new<I, S>(nodes: I, edges: Vec<Edge>) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut graph = Self::default();
        for id in nodes {
            graph.add_node(id)?;
        }
        for edge in edges {
            graph.add_edge(edge.from, edge.to)?;
        }
        Ok(graph)
    }

    /// Register a node.  Registration order is significant.
    pub fn add_node(&mut self, id: impl Into<String>) -> Result<&mut Self, EngineError> {
        let id = id.into();
        if !self.index.insert(id.clone()) {
            return Err(EngineError::DuplicateNodeId(id));
        }
        self.nodes.push(id);
        Ok(self)
    }

    /// Connect two already-registered nodes.
    pub fn add_edge(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Result<&mut Self, EngineError> {
        let (from, to) = (from.into(), to.into());
        if !self.index.contains(&from) {
            return Err(EngineError::UnknownNodeReference { node_id: from, side: "from" });
        }
        if !self.index.contains(&to) {
            return Err(EngineError::UnknownNodeReference { node_id: to, side: "to" });
        }
        self.edges.push(Edge { from, to });
        Ok(self)
    }

    /// Node ids in registration order.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }
}

impl TryFrom<RawGraph> for GraphDescription {
    type Error = EngineError;

    fn try_from(raw: RawGraph) -> Result<Self, Self::Error> {
        Self::new(raw.nodes, raw.edges)
    }
}

// ---------------------------------------------------------------------------
// ExecutionPlan
// ---------------------------------------------------------------------------

/// Output of [`crate::dag::compile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    /// Node ids in compile (registration) order.
    pub node_ids: Vec<String>,
    /// Successor lists, in edge insertion order.  Every node has an entry.
    pub adjacency: HashMap<String, Vec<String>>,
    pub has_cycles: bool,
    /// `Some` iff `!has_cycles`.
    pub topological_order: Option<Vec<String>>,
}

impl ExecutionPlan {
    pub fn successors(&self, id: &str) -> &[String] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Reverse the adjacency.  Each predecessor list follows the order in
    /// which `node_ids` and their successor lists are walked.
    pub fn predecessors(&self) -> HashMap<&str, Vec<&str>> {
        let mut preds: HashMap<&str, Vec<&str>> =
            self.node_ids.iter().map(|id| (id.as_str(), Vec::new())).collect();
        for src in &self.node_ids {
            for dst in self.successors(src) {
                preds.entry(dst.as_str()).or_default().push(src.as_str());
            }
        }
        preds
    }
}

// ---------------------------------------------------------------------------
// Durations
// ---------------------------------------------------------------------------

/// Per-node durations supplied by the caller.  Missing entries count as 0.
pub type DurationTable = HashMap<String, u64>;
