//! Sample statistics: mean and linearly interpolated percentiles.

/// Percentile of an ascending-sorted sample set.
///
/// `rank = p * (N - 1)`.  An integral rank returns that sample; otherwise the
/// two neighbours are interpolated by the fractional part and the result is
/// rounded half away from zero.  An empty set yields 0.
pub fn percentile(sorted: &[u64], p: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let weight = rank - lo as f64;
    (sorted[lo] as f64 * (1.0 - weight) + sorted[hi] as f64 * weight).round() as u64
}

/// Integer mean (truncated).  An empty set yields 0.
pub fn mean(samples: &[u64]) -> u64 {
    if samples.is_empty() {
        return 0;
    }
    let sum: u128 = samples.iter().map(|&s| u128::from(s)).sum();
    (sum / samples.len() as u128) as u64
}

/// Mean, p95 and p99 of a sample set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyStats {
    pub mean: u64,
    pub p95: u64,
    pub p99: u64,
}

impl LatencyStats {
    /// Sorts `samples` in place and summarises them.
    pub fn from_samples(samples: &mut [u64]) -> Self {
        samples.sort_unstable();
        Self {
            mean: mean(samples),
            p95: percentile(samples, 0.95),
            p99: percentile(samples, 0.99),
        }
    }
}
