//! Critical-path (longest path) analysis over a compiled plan.
//!
//! A node cannot start before all of its predecessors have finished, and
//! everything off the critical path is assumed to run in parallel.  The
//! result is therefore the theoretical makespan of the graph.

use std::collections::HashMap;

use serde::Serialize;

use crate::{DurationTable, EngineError, ExecutionPlan};

/// Longest-duration path through a DAG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CriticalPathResult {
    pub total: u64,
    /// From a source to the latest-finishing node.
    pub path: Vec<String>,
}

/// Compute the critical path of `plan` given per-node `durations`.
///
/// Parent selection keeps the first predecessor (in predecessor-list order)
/// that reaches the maximum finish time.  When several nodes share the global
/// maximum finish time, the lexicographically smallest id is the terminal.
///
/// # Errors
/// - [`EngineError::CycleDetected`] if the plan has no topological order.
/// - [`EngineError::DurationOverflow`] if a finish time exceeds `u64::MAX` ms.
pub fn critical_path(
    plan: &ExecutionPlan,
    durations: &DurationTable,
) -> Result<CriticalPathResult, EngineError> {
    let order = match (&plan.topological_order, plan.has_cycles) {
        (Some(order), false) => order,
        _ => return Err(EngineError::CycleDetected),
    };

    let predecessors = plan.predecessors();
    let mut finish: HashMap<&str, u64> = HashMap::with_capacity(order.len());
    let mut parent: HashMap<&str, &str> = HashMap::with_capacity(order.len());

    for v in order {
        let v = v.as_str();
        let mut best: Option<(&str, u64)> = None;
        for &p in predecessors.get(v).map(Vec::as_slice).unwrap_or(&[]) {
            let candidate = finish.get(p).copied().unwrap_or(0);
            if best.map_or(true, |(_, t)| candidate > t) {
                best = Some((p, candidate));
            }
        }
        let start = best.map_or(0, |(_, t)| t);
        let end = start
            .checked_add(durations.get(v).copied().unwrap_or(0))
            .ok_or_else(|| EngineError::DurationOverflow(v.to_owned()))?;
        finish.insert(v, end);
        if let Some((p, _)) = best {
            parent.insert(v, p);
        }
    }

    // Terminal node: maximum finish, smallest id on ties.
    let Some((&terminal, &total)) = finish
        .iter()
        .max_by(|(a_id, a_t), (b_id, b_t)| a_t.cmp(b_t).then_with(|| b_id.cmp(a_id)))
    else {
        return Ok(CriticalPathResult { total: 0, path: Vec::new() });
    };

    let mut path = vec![terminal.to_owned()];
    let mut cursor = terminal;
    while let Some(&p) = parent.get(cursor) {
        path.push(p.to_owned());
        cursor = p;
    }
    path.reverse();

    Ok(CriticalPathResult { total, path })
}

/// Chain versus graph completion time for the same set of stages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Makespan {
    /// Every node run back to back.
    pub chain_total: u64,
    /// Critical path under unlimited parallelism.
    pub graph_total: u64,
    /// `chain_total / graph_total`; 1.0 when the graph total is zero.
    pub speedup: f64,
    pub critical_path: Vec<String>,
}

/// Compare sequential execution of every node with the critical path.
///
/// Fails like [`critical_path`]; the chain sum is checked for overflow too.
pub fn makespan(plan: &ExecutionPlan, durations: &DurationTable) -> Result<Makespan, EngineError> {
    let cp = critical_path(plan, durations)?;
    let chain_total = plan.node_ids.iter().try_fold(0u64, |acc, id| {
        acc.checked_add(durations.get(id).copied().unwrap_or(0))
            .ok_or_else(|| EngineError::DurationOverflow(id.clone()))
    })?;
    let speedup = if cp.total == 0 { 1.0 } else { chain_total as f64 / cp.total as f64 };

    Ok(Makespan {
        chain_total,
        graph_total: cp.total,
        speedup,
        critical_path: cp.path,
    })
}
