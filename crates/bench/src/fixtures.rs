//! Deterministic text inputs for reproducible A/B runs.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::BenchError;

pub const DEFAULT_SEED: u64 = 12345;

pub const DEFAULT_PROMPTS: [&str; 10] = [
    "Explain the concept of a graph in simple words.",
    "Summarise the role of nodes and edges in two sentences.",
    "List three use cases of graphs in AI.",
    "What is the difference between chain and graph orchestration?",
    "Define the critical path of a DAG.",
    "When is running branches in parallel better than a sequence?",
    "Explain topological order and why it is useful.",
    "What is a conditional node in an execution graph?",
    "How should failures and fallbacks be handled in a graph?",
    "When is a linear pipeline preferable to a graph?",
];

/// `count` prompts drawn with replacement from [`DEFAULT_PROMPTS`].
///
/// The same `(count, seed)` always yields the same list.
pub fn fixed_text_inputs(count: usize, seed: u64) -> Result<Vec<String>, BenchError> {
    if count == 0 {
        return Err(BenchError::InvalidArgument("count must be positive".into()));
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Ok((0..count)
        .map(|_| DEFAULT_PROMPTS[rng.gen_range(0..DEFAULT_PROMPTS.len())].to_owned())
        .collect())
}

/// A question and a substring any acceptable answer must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QaPair {
    pub question: &'static str,
    pub expected_contains: &'static str,
}

impl QaPair {
    /// Case-insensitive containment check of the expected substring.
    pub fn is_answered_by(&self, answer: &str) -> bool {
        answer.to_lowercase().contains(&self.expected_contains.to_lowercase())
    }
}

/// Small synthetic Q&A set for success-rate runs.
pub fn qa_pairs() -> &'static [QaPair] {
    const PAIRS: &[QaPair] = &[
        QaPair { question: "What is a DAG?", expected_contains: "acyclic" },
        QaPair { question: "What is topological order for?", expected_contains: "sequence" },
        QaPair { question: "When should chain be used instead of graph?", expected_contains: "depends" },
        QaPair { question: "Explain fallback in graphs.", expected_contains: "failure" },
        QaPair { question: "Define the critical path.", expected_contains: "critical" },
    ];
    PAIRS
}
