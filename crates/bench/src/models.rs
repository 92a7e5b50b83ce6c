//! Result records produced by the benchmark engine.
//!
//! Every record is timestamped and serialisable; the sink writes each one as
//! a JSON file plus a Markdown report.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sink::Report;

/// One timed invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResult {
    pub name: String,
    pub elapsed_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub outcome: String,
}

/// Latency aggregate over many sequential trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub name: String,
    pub iterations: usize,
    pub mean_ms: u64,
    pub p95_ms: u64,
    pub p99_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// Success-rate aggregate over many sequential trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessSummaryResult {
    pub name: String,
    pub iterations: usize,
    pub success_count: usize,
    pub success_rate: f64,
    pub timestamp: DateTime<Utc>,
}

/// Free-form key/value record for theoretical figures (critical path,
/// centrality, makespan bounds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TheoryResult {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub data: BTreeMap<String, Value>,
}

fn utc(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Report for SummaryResult {
    fn to_markdown(&self) -> String {
        let mut md = format!("# {}: latency summary\n\n", self.name);
        let _ = writeln!(md, "- Iterations: {}", self.iterations);
        let _ = writeln!(md, "- Mean (ms): {}", self.mean_ms);
        let _ = writeln!(md, "- p95 (ms): {}", self.p95_ms);
        let _ = writeln!(md, "- p99 (ms): {}", self.p99_ms);
        let _ = writeln!(md, "- Timestamp (UTC): {}", utc(&self.timestamp));
        md
    }
}

impl Report for SuccessSummaryResult {
    fn to_markdown(&self) -> String {
        let mut md = format!("# {}: success summary\n\n", self.name);
        let _ = writeln!(md, "- Iterations: {}", self.iterations);
        let _ = writeln!(md, "- Successes: {}", self.success_count);
        let _ = writeln!(md, "- Success rate: {:.2}%", self.success_rate * 100.0);
        let _ = writeln!(md, "- Timestamp (UTC): {}", utc(&self.timestamp));
        md
    }
}

impl Report for TheoryResult {
    fn to_markdown(&self) -> String {
        let mut md = format!("# {}: theoretical validation\n\n", self.name);
        let _ = writeln!(md, "- Timestamp (UTC): {}", utc(&self.timestamp));
        for (key, value) in &self.data {
            match value {
                Value::String(s) => { let _ = writeln!(md, "- {key}: {s}"); }
                other => { let _ = writeln!(md, "- {key}: {other}"); }
            }
        }
        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_markdown_formats_rate_as_percent() {
        let s = SuccessSummaryResult {
            name: "retry".into(),
            iterations: 8,
            success_count: 7,
            success_rate: 0.875,
            timestamp: Utc::now(),
        };
        let md = s.to_markdown();
        assert!(md.starts_with("# retry: success summary"));
        assert!(md.contains("- Success rate: 87.50%"));
    }

    #[test]
    fn theory_markdown_lists_keys_in_order() {
        let t = TheoryResult {
            name: "glossary".into(),
            timestamp: Utc::now(),
            data: BTreeMap::from([
                ("b_total".to_string(), json!(130)),
                ("a_path".to_string(), json!("start -> A -> merge")),
            ]),
        };
        let md = t.to_markdown();
        let a = md.find("- a_path: start -> A -> merge").unwrap();
        let b = md.find("- b_total: 130").unwrap();
        assert!(a < b);
    }
}
