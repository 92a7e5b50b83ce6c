//! Plan compilation: run this before analysing or executing a graph.
//!
//! [`compile`] never fails: a cycle is reported through
//! [`ExecutionPlan::has_cycles`].  [`ensure_acyclic`] is the policy wrapper
//! that turns a cycle into [`EngineError::CycleDetected`].

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::{EngineError, ExecutionPlan, GraphDescription};

/// Compile a graph into an [`ExecutionPlan`] (Kahn's algorithm, O(V+E)).
///
/// Zero in-degree nodes are seeded in registration order and successors are
/// released in edge order, so the same description always yields the same
/// topological order.
pub fn compile(graph: &GraphDescription) -> ExecutionPlan {
    // -----------------------------------------------------------------------
    // 1. Adjacency list and in-degree map
    // -----------------------------------------------------------------------
    let mut adjacency: HashMap<String, Vec<String>> = graph
        .nodes()
        .iter()
        .map(|id| (id.clone(), Vec::new()))
        .collect();
    let mut in_degree: HashMap<&str, usize> =
        graph.nodes().iter().map(|id| (id.as_str(), 0)).collect();

    for edge in graph.edges() {
        adjacency.entry(edge.from.clone()).or_default().push(edge.to.clone());
        *in_degree.entry(edge.to.as_str()).or_insert(0) += 1;
    }

    // -----------------------------------------------------------------------
    // 2. Seed the queue with nodes that have no incoming edges
    // -----------------------------------------------------------------------
    let mut queue: VecDeque<&str> = graph
        .nodes()
        .iter()
        .map(String::as_str)
        .filter(|id| in_degree[id] == 0)
        .collect();

    let mut sorted: Vec<String> = Vec::with_capacity(graph.nodes().len());

    while let Some(node_id) = queue.pop_front() {
        sorted.push(node_id.to_owned());

        for next in &adjacency[node_id] {
            if let Some(deg) = in_degree.get_mut(next.as_str()) {
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(next.as_str());
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // 3. Fewer emitted nodes than declared means a cycle
    // -----------------------------------------------------------------------
    let has_cycles = sorted.len() < graph.nodes().len();
    debug!(
        nodes = graph.nodes().len(),
        edges = graph.edges().len(),
        has_cycles,
        "compiled execution plan"
    );

    ExecutionPlan {
        node_ids: graph.nodes().to_vec(),
        adjacency,
        has_cycles,
        topological_order: (!has_cycles).then_some(sorted),
    }
}

/// Whether the graph is acyclic, plus its topological order when it is.
pub fn analyze(graph: &GraphDescription) -> (bool, Option<Vec<String>>) {
    let plan = compile(graph);
    (!plan.has_cycles, plan.topological_order)
}

/// Compile and require a DAG.
///
/// # Errors
/// [`EngineError::CycleDetected`] if the graph is not acyclic.
pub fn ensure_acyclic(graph: &GraphDescription) -> Result<Vec<String>, EngineError> {
    match analyze(graph) {
        (true, Some(order)) => Ok(order),
        _ => Err(EngineError::CycleDetected),
    }
}

// ============================================================
// Unit tests
// ============================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::Edge;
    use proptest::prelude::*;

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> GraphDescription {
        GraphDescription::new(
            nodes.iter().copied(),
            edges.iter().map(|(f, t)| Edge::new(*f, *t)).collect(),
        )
        .expect("well-formed graph")
    }

    #[test]
    fn linear_graph_sorts_in_order() {
        // A → B → C
        let plan = compile(&graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]));
        assert!(!plan.has_cycles);
        assert_eq!(plan.topological_order.unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn diamond_graph() {
        //   A
        //  / \
        // B   C
        //  \ /
        //   D
        let plan = compile(&graph(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
        ));
        assert_eq!(plan.topological_order.as_ref().unwrap(), &vec!["a", "b", "c", "d"]);
        assert_eq!(plan.successors("a"), ["b", "c"]);
        assert!(plan.successors("d").is_empty());
    }

    #[test]
    fn sources_are_seeded_in_registration_order() {
        let plan = compile(&graph(&["z", "y", "x", "sink"], &[("x", "sink"), ("z", "sink")]));
        assert_eq!(plan.topological_order.unwrap(), vec!["z", "y", "x", "sink"]);
    }

    #[test]
    fn two_node_cycle_is_data_not_error() {
        // A → B → A
        let plan = compile(&graph(&["a", "b"], &[("a", "b"), ("b", "a")]));
        assert!(plan.has_cycles);
        assert!(plan.topological_order.is_none());
        assert_eq!(plan.node_ids, vec!["a", "b"]);
    }

    #[test]
    fn cycle_behind_a_valid_prefix() {
        // S → A → B → C → A
        let g = graph(
            &["s", "a", "b", "c"],
            &[("s", "a"), ("a", "b"), ("b", "c"), ("c", "a")],
        );
        assert!(compile(&g).has_cycles);
        assert!(matches!(ensure_acyclic(&g), Err(EngineError::CycleDetected)));
        assert_eq!(analyze(&g), (false, None));
    }

    #[test]
    fn ensure_acyclic_returns_order() {
        let order = ensure_acyclic(&graph(&["solo"], &[])).expect("single node is a DAG");
        assert_eq!(order, vec!["solo"]);
    }

    #[test]
    fn duplicate_edges_do_not_break_kahn() {
        let plan = compile(&graph(&["a", "b"], &[("a", "b"), ("a", "b")]));
        assert_eq!(plan.successors("a").len(), 2);
        assert_eq!(plan.topological_order.unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn empty_graph_is_acyclic() {
        let plan = compile(&GraphDescription::default());
        assert!(!plan.has_cycles);
        assert_eq!(plan.topological_order, Some(vec![]));
    }

    /// Random DAG: edges only go from a lower to a higher index.
    fn arb_dag() -> impl Strategy<Value = GraphDescription> {
        (1usize..12)
            .prop_flat_map(|n| (Just(n), prop::collection::vec((0..n, 0..n), 0..30)))
            .prop_map(|(n, pairs)| {
                let ids: Vec<String> = (0..n).map(|i| format!("n{i}")).collect();
                let edges = pairs
                    .into_iter()
                    .filter(|(a, b)| a != b)
                    .map(|(a, b)| Edge::new(ids[a.min(b)].clone(), ids[a.max(b)].clone()))
                    .collect();
                GraphDescription::new(ids.clone(), edges).expect("generated graph is well-formed")
            })
    }

    proptest! {
        #[test]
        fn topological_order_is_permutation_respecting_edges(g in arb_dag()) {
            let plan = compile(&g);
            prop_assert!(!plan.has_cycles);
            let order = plan.topological_order.expect("DAG has an order");

            let mut sorted_order = order.clone();
            sorted_order.sort();
            let mut sorted_nodes = g.nodes().to_vec();
            sorted_nodes.sort();
            prop_assert_eq!(sorted_order, sorted_nodes);

            let pos: HashMap<&str, usize> =
                order.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();
            for e in g.edges() {
                prop_assert!(pos[e.from.as_str()] < pos[e.to.as_str()]);
            }
        }
    }
}
