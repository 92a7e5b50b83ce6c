//! Betweenness centrality (Brandes) for unweighted directed plans.
//!
//! Used to judge whether an aggregation point is a structural bottleneck.
//! Cost is O(V·(V+E)), which is fine for graphs of a few dozen nodes.

use std::collections::{HashMap, VecDeque};

use crate::ExecutionPlan;

/// Node id → normalised betweenness score.
pub type CentralityScores = HashMap<String, f64>;

/// Compute betweenness centrality for every node of `plan`.
///
/// Scores are multiplied by `1 / ((n-1)(n-2))` when `n > 2` and left raw
/// otherwise.  Parallel edges are counted as distinct shortest paths.
pub fn centrality(plan: &ExecutionPlan) -> CentralityScores {
    let nodes = &plan.node_ids;
    let mut totals: HashMap<&str, f64> = nodes.iter().map(|v| (v.as_str(), 0.0)).collect();

    for s in nodes {
        let s = s.as_str();
        let mut stack: Vec<&str> = Vec::with_capacity(nodes.len());
        let mut preds: HashMap<&str, Vec<&str>> =
            nodes.iter().map(|v| (v.as_str(), Vec::new())).collect();
        let mut sigma: HashMap<&str, f64> = nodes.iter().map(|v| (v.as_str(), 0.0)).collect();
        let mut dist: HashMap<&str, Option<usize>> =
            nodes.iter().map(|v| (v.as_str(), None)).collect();

        sigma.insert(s, 1.0);
        dist.insert(s, Some(0));

        // Forward phase: BFS counting shortest paths.
        let mut queue = VecDeque::from([s]);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            let dv = dist[v].unwrap_or(0);
            for w in plan.successors(v) {
                let w = w.as_str();
                if dist[w].is_none() {
                    dist.insert(w, Some(dv + 1));
                    queue.push_back(w);
                }
                if dist[w] == Some(dv + 1) {
                    let sv = sigma[v];
                    *sigma.entry(w).or_insert(0.0) += sv;
                    preds.entry(w).or_default().push(v);
                }
            }
        }

        // Backward phase: accumulate dependencies in reverse visit order.
        let mut delta: HashMap<&str, f64> = nodes.iter().map(|v| (v.as_str(), 0.0)).collect();
        while let Some(w) = stack.pop() {
            let (sw, dw) = (sigma[w], delta[w]);
            if sw > 0.0 {
                for &v in &preds[w] {
                    *delta.entry(v).or_insert(0.0) += sigma[v] / sw * (1.0 + dw);
                }
            }
            if w != s {
                *totals.entry(w).or_insert(0.0) += dw;
            }
        }
    }

    let n = nodes.len() as f64;
    let norm = if nodes.len() > 2 { 1.0 / ((n - 1.0) * (n - 2.0)) } else { 1.0 };
    totals
        .into_iter()
        .map(|(id, score)| (id.to_owned(), score * norm))
        .collect()
}
