//! Outcome cache: remembers oracle verdicts so a configuration already
//! tested this run is never re-tested (§4.2).
//!
//! Three keying modes are supported:
//!
//! - [`CacheMode::None`] disables caching entirely (every lookup misses).
//! - [`CacheMode::Config`] keys on the sorted [`crate::core::UnitId`] set — cheap,
//!   exact, but blind to configurations that serialize to identical
//!   bytes through different unit combinations.
//! - [`CacheMode::Content`] keys on the SHA-256 digest of the serialized
//!   candidate bytes, catching that case at the cost of a digest per
//!   probe.
//!
//! Grounded on `llm-pyexec/src/cache.rs`'s `BytecodeCache`: SHA-256
//! digest as a fixed-size key, a mutex-guarded map, and a single shared
//! instance per run (there, a process-wide `OnceLock`; here, one
//! `OutcomeCache` owned by the engine for the run's lifetime, since
//! unlike bytecode the outcome cache must not outlive a single run —
//! §4.2 is explicit that persistence across runs is a non-goal).

use std::collections::HashMap;
use std::sync::RwLock;

use sha2::{Digest, Sha256};

use crate::core::{Configuration, Verdict};

/// Which data a [`CacheKey`] is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CacheMode {
    /// Caching disabled: every lookup misses, every insert is a no-op.
    None,
    /// Key on the configuration's sorted unit-id set.
    Config,
    /// Key on the SHA-256 digest of the serialized candidate bytes.
    Content,
}

/// A cache key: either a sorted unit-id vector or a content digest.
///
/// Both variants hash and compare cheaply and carry no borrowed data, so
/// a key can be computed once per probe and moved into the cache without
/// re-touching the configuration or candidate bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Config(Vec<usize>),
    Content([u8; 32]),
}

impl CacheKey {
    /// Builds a [`CacheKey::Config`] from `configuration`'s sorted unit ids.
    #[must_use]
    pub fn from_configuration(configuration: &Configuration) -> Self {
        let mut ids: Vec<usize> = configuration.units().iter().map(|u| u.0).collect();
        ids.sort_unstable();
        Self::Config(ids)
    }

    /// Builds a [`CacheKey::Content`] from the serialized candidate bytes.
    #[must_use]
    pub fn from_content(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self::Content(hasher.finalize().into())
    }
}

/// Maps [`CacheKey`]s to the oracle verdict already observed for them.
///
/// `Verdict::Cancelled` is never stored (§4.2): a cancelled probe carries
/// no information about the candidate, so a later probe of the same
/// configuration must still run the oracle.
pub struct OutcomeCache {
    mode: CacheMode,
    entries: RwLock<HashMap<CacheKey, Verdict>>,
}

impl OutcomeCache {
    /// Creates an empty cache using `mode` to derive keys.
    #[must_use]
    pub fn new(mode: CacheMode) -> Self {
        Self {
            mode,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Which keying mode this cache uses.
    #[must_use]
    pub const fn mode(&self) -> CacheMode {
        self.mode
    }

    /// Derives the key for `configuration`, using `content` (the
    /// serialized candidate bytes) when the mode is content-keyed.
    ///
    /// Returns `None` when caching is disabled (`CacheMode::None`), in
    /// which case [`Self::get`] and [`Self::record`] are no-ops.
    #[must_use]
    pub fn key_for(&self, configuration: &Configuration, content: &[u8]) -> Option<CacheKey> {
        match self.mode {
            CacheMode::None => None,
            CacheMode::Config => Some(CacheKey::from_configuration(configuration)),
            CacheMode::Content => Some(CacheKey::from_content(content)),
        }
    }

    /// Looks up a previously recorded verdict for `key`, if any.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn get(&self, key: &CacheKey) -> Option<Verdict> {
        // A poisoned lock means a prior accessor panicked mid-update; the
        // cache is advisory (a miss just re-runs the oracle), but a
        // torn map is not safe to read from, so this is a hard stop.
        self.entries
            .read()
            .expect("outcome cache lock poisoned")
            .get(key)
            .copied()
    }

    /// Records `verdict` for `key`. A `Verdict::Cancelled` is silently
    /// dropped rather than stored (§4.2).
    ///
    /// Monotonic: once a key is set it is never overwritten. A later call
    /// with a *different* verdict for an already-recorded key means the
    /// oracle broke its determinism contract (§7,
    /// `OracleNonDeterminismDetected`); that call is logged and ignored
    /// rather than allowed to clobber the earlier, already-acted-upon
    /// verdict.
    #[allow(clippy::expect_used)]
    pub fn record(&self, key: CacheKey, verdict: Verdict) {
        if matches!(verdict, Verdict::Cancelled) {
            return;
        }
        let mut entries = self.entries.write().expect("outcome cache lock poisoned");
        match entries.get(&key) {
            None => {
                entries.insert(key, verdict);
            }
            Some(&existing) if existing == verdict => {}
            Some(_) => {
                tracing::warn!(key = ?key, "oracle returned inconsistent verdicts for an identical candidate, ignoring the later one");
            }
        }
    }

    /// Number of distinct verdicts currently cached.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn len(&self) -> usize {
        self.entries.read().expect("outcome cache lock poisoned").len()
    }

    /// `true` if no verdicts have been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
