//! Core data model: units, configurations, chunkings, and probes.
//!
//! Everything here is pure and synchronous — no I/O, no async, fully
//! deterministic given its inputs. The engine and scheduler build on top
//! of these types but own no logic of their own at this layer.

pub mod config;
pub mod split;
pub mod strategy;

pub use config::{Configuration, UnitId};
pub use split::{split, Chunking};
pub use strategy::Strategy;

/// Which half of a chunk a candidate probe represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    /// The chunk alone (`subset(i)`).
    Subset,
    /// Everything except the chunk (`complement(i)`).
    Complement,
}

impl std::fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Subset => f.write_str("sub"),
            Self::Complement => f.write_str("comp"),
        }
    }
}

/// One segment of a hierarchical probe identifier.
///
/// Rendered slash-joined as the per-probe workspace path, e.g.
/// `it0/sub/c3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Outer-loop iteration counter.
    Iteration(usize),
    /// Marks the subset probing phase.
    Subset,
    /// Marks the complement probing phase.
    Complement,
    /// Chunk index within the current partition.
    Chunk(usize),
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Iteration(n) => write!(f, "it{n}"),
            Self::Subset => f.write_str("sub"),
            Self::Complement => f.write_str("comp"),
            Self::Chunk(i) => write!(f, "c{i}"),
        }
    }
}

/// Hierarchical identifier for a candidate probe.
///
/// Unique per probe across a run; doubles as the namespace for the
/// probe's workspace directory (§6, "per-probe workspace layout").
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProbeId(Vec<PathSegment>);

impl ProbeId {
    /// Builds a probe id by appending `segment` to `parent`.
    #[must_use]
    pub fn child(parent: &Self, segment: PathSegment) -> Self {
        let mut segments = parent.0.clone();
        segments.push(segment);
        Self(segments)
    }

    /// Renders the slash-joined probe path, e.g. `it0/sub/c3`.
    #[must_use]
    pub fn path(&self) -> String {
        self.0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl std::fmt::Display for ProbeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

/// A candidate oracle invocation: one chunk's subset or complement.
#[derive(Debug, Clone)]
pub struct Probe {
    /// Unique, hierarchical identifier (also the workspace namespace).
    pub id: ProbeId,
    /// The configuration to test.
    pub configuration: Configuration,
    /// Whether this is a subset or complement probe.
    pub kind: ProbeKind,
    /// Which chunk of the current partition this probe corresponds to.
    pub chunk_index: usize,
}

/// Outcome of a single oracle invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The candidate exhibits the property under test.
    Interesting,
    /// The candidate does not exhibit the property.
    Uninteresting,
    /// The scheduler preempted this probe before a verdict was reached.
    ///
    /// Never persisted to the cache (§4.2).
    Cancelled,
}
