//! Units and configurations.
//!
//! A [`Configuration`] is an ordered sub-sequence of [`UnitId`]s drawn from
//! a fixed universe. Configurations are immutable once published and are
//! shared across fan-out tasks via `Arc` so probing a chunk never clones
//! the whole unit list.

use std::sync::Arc;

/// Opaque identifier for one atomic unit of the input (a line, a
/// character, or any caller-supplied token). Totally ordered; stable for
/// the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId(pub usize);

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ordered sub-sequence of [`UnitId`]s, drawn from a fixed universe.
///
/// `C ⊆ U`, order matches `U`, no duplicates (§3). Immutable once
/// constructed; cheap to clone (`Arc`-backed) so it can be handed to many
/// concurrent probe tasks without copying the underlying slice.
#[derive(Debug, Clone)]
pub struct Configuration {
    units: Arc<[UnitId]>,
}

impl Configuration {
    /// Builds a configuration from the full, ordered universe of units.
    #[must_use]
    pub fn universe(unit_count: usize) -> Self {
        let units: Vec<UnitId> = (0..unit_count).map(UnitId).collect();
        Self {
            units: Arc::from(units.into_boxed_slice()),
        }
    }

    /// Builds a configuration from an already-ordered, deduplicated slice.
    #[must_use]
    pub fn from_units(units: &[UnitId]) -> Self {
        Self {
            units: Arc::from(units),
        }
    }

    /// The units in this configuration, in order.
    #[must_use]
    pub fn units(&self) -> &[UnitId] {
        &self.units
    }

    /// Number of units in this configuration.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// `true` if this configuration contains no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// `subset(i)` — the `i`-th chunk alone, per `chunking`.
    #[must_use]
    pub fn subset(&self, chunking: &super::Chunking, i: usize) -> Self {
        let range = &chunking.ranges()[i];
        Self::from_units(&self.units[range.clone()])
    }

    /// `complement(i)` — everything except the `i`-th chunk.
    #[must_use]
    pub fn complement(&self, chunking: &super::Chunking, i: usize) -> Self {
        let range = &chunking.ranges()[i];
        let mut kept = Vec::with_capacity(self.units.len() - range.len());
        kept.extend_from_slice(&self.units[..range.start]);
        kept.extend_from_slice(&self.units[range.end..]);
        Self::from_units(&kept)
    }
}
