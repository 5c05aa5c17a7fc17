//! Partitioning a configuration into balanced, contiguous chunks.

use std::ops::Range;

use super::Configuration;

/// A configuration partitioned into `n` contiguous, non-empty chunks.
///
/// `⋃ chunks = C`; chunk boundaries are monotonic; `1 <= n <= |C|` (§3).
/// Recomputed each outer engine iteration from the current granularity.
#[derive(Debug, Clone)]
pub struct Chunking {
    ranges: Vec<Range<usize>>,
}

impl Chunking {
    /// The chunk ranges, in order, indexing into the split configuration.
    #[must_use]
    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    /// Number of chunks in this partition.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// `true` if there are no chunks (only possible for an empty configuration).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Partitions `configuration` into `n` contiguous chunks.
///
/// When `|C|` is not divisible by `n`, the first `|C| mod n` chunks
/// receive one extra unit (balanced split). Deterministic: the same
/// `(configuration, n)` always yields the same partition (§4.1).
///
/// `n` is clamped to `[1, |C|]`; an empty configuration yields a single
/// empty chunking.
#[must_use]
pub fn split(configuration: &Configuration, n: usize) -> Chunking {
    let total = configuration.len();
    if total == 0 {
        return Chunking { ranges: Vec::new() };
    }
    let n = n.clamp(1, total);

    let base = total / n;
    let remainder = total % n;

    let mut ranges = Vec::with_capacity(n);
    let mut start = 0;
    for i in 0..n {
        let size = base + usize::from(i < remainder);
        let end = start + size;
        ranges.push(start..end);
        start = end;
    }
    debug_assert_eq!(start, total);

    Chunking { ranges }
}

/// `increase_granularity(n) -> min(factor * n, |C|)` (§4.1).
///
/// Termination condition for the engine's outer loop is `n >= |C|`.
#[must_use]
pub const fn increase_granularity(n: usize, factor: usize, total: usize) -> usize {
    let scaled = n.saturating_mul(factor);
    if scaled < total { scaled } else { total }
}
