//! Iteration strategies for enumerating which chunk index to probe next.
//!
//! The engine supplies the candidate list already ordered; the scheduler
//! is strategy-oblivious (§4.4). Strategies apply independently to the
//! subset and complement loops.

/// Ordering in which chunk indices are probed.
///
/// A small closed set of behaviours, modelled as a plain enum rather
/// than a trait object hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Strategy {
    /// Indices `0, 1, ..., n-1`.
    Forward,
    /// Indices `n-1, n-2, ..., 0`.
    Backward,
    /// Empty list — the whole loop is bypassed.
    Skip,
}

impl Strategy {
    /// Produces the ordered list of chunk indices `0..chunk_count` to
    /// probe, per this strategy.
    #[must_use]
    pub fn order(self, chunk_count: usize) -> Vec<usize> {
        match self {
            Self::Forward => (0..chunk_count).collect(),
            Self::Backward => (0..chunk_count).rev().collect(),
            Self::Skip => Vec::new(),
        }
    }

    /// `true` if this strategy never produces any indices.
    #[must_use]
    pub const fn is_skip(self) -> bool {
        matches!(self, Self::Skip)
    }
}
