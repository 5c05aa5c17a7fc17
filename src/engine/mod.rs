//! The main delta-debugging loop (§4.5).
//!
//! Single-threaded in control flow: the only suspension points are the
//! `await`s on `Scheduler::race`, matching §5's "the DD engine runs
//! single-threaded" requirement even though it's an async function.

pub mod report;

use crate::core::{split, Chunking, Configuration, PathSegment, Probe, ProbeId, ProbeKind, Strategy};
use crate::error::{EngineError, Result};
use crate::scheduler::{RaceOutcome, Scheduler};

pub use report::MinimizationReport;

/// Engine tuning knobs, one-to-one with the CLI's minimisation flags.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Split factor, used both for the initial partition size and for
    /// granularity escalation (`--split`, default 2).
    pub split_factor: usize,
    /// Ordering for the subset loop (`--subset-iterator`).
    pub subset_strategy: Strategy,
    /// Ordering for the complement loop (`--complement-iterator`).
    pub complement_strategy: Strategy,
    /// Probe the complement loop before the subset loop (`--complement-first`).
    pub complement_first: bool,
    /// Race subset and complement candidates together instead of in two
    /// separate phases (`--combine-loops`).
    pub combine_loops: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            split_factor: 2,
            subset_strategy: Strategy::Forward,
            complement_strategy: Strategy::Forward,
            complement_first: false,
            combine_loops: false,
        }
    }
}

/// Drives the configuration/subset/complement reduction loop to a
/// 1-minimal result, delegating every oracle call to a [`Scheduler`].
pub struct Engine {
    scheduler: Scheduler,
    config: EngineConfig,
}

impl Engine {
    /// Builds an engine. Rejects the degenerate configuration where both
    /// loops are `skip` (§9, "implementations should reject this
    /// configuration at startup").
    pub fn new(scheduler: Scheduler, config: EngineConfig) -> Result<Self> {
        if config.subset_strategy.is_skip() && config.complement_strategy.is_skip() {
            return Err(EngineError::Configuration {
                message: "subset and complement iterators cannot both be skip".to_string(),
            });
        }
        Ok(Self { scheduler, config })
    }

    /// Minimises `initial` to a 1-minimal configuration.
    ///
    /// Returns `Err(EngineError::InitialUninteresting)` if `initial`
    /// itself is not interesting under the oracle — the precondition the
    /// whole algorithm depends on.
    pub async fn minimize(&self, initial: Configuration) -> Result<MinimizationReport> {
        let original_unit_count = initial.len();

        let precondition_probe = Probe {
            id: ProbeId::default(),
            configuration: initial.clone(),
            kind: ProbeKind::Subset,
            chunk_index: 0,
        };
        if matches!(
            self.scheduler.race(vec![precondition_probe]).await,
            RaceOutcome::Exhausted
        ) {
            return Err(EngineError::InitialUninteresting {
                message: "the initial input is not interesting under the oracle".to_string(),
            });
        }

        // S3: a single-unit *initial* input is already 1-minimal by
        // construction — its only chunk is the whole configuration, so
        // there is nothing left to subset-probe, and per spec.md §8 no
        // further oracle calls are made beyond the precondition check.
        // This is distinct from a configuration that reduces down to one
        // unit mid-run (S4), which still goes through the normal loop
        // below and may shrink further via the complement phase.
        if original_unit_count <= 1 {
            return Ok(MinimizationReport {
                original_unit_count,
                final_unit_count: initial.len(),
                iterations: 0,
                cache_entries: self.scheduler_cache_len(),
                final_configuration: initial,
            });
        }

        let mut configuration = initial;
        let mut granularity = self.config.split_factor.max(1);
        let mut iteration = 0usize;

        loop {
            let effective_n = granularity.clamp(1, configuration.len().max(1));
            let chunking = split(&configuration, effective_n);
            let probe_root = ProbeId::child(&ProbeId::default(), PathSegment::Iteration(iteration));

            let winner = if self.config.combine_loops {
                self.race_combined(&configuration, &chunking, &probe_root).await
            } else {
                self.race_phased(&configuration, &chunking, &probe_root).await
            };

            match winner {
                Some((kind, new_configuration, _chunk_index)) => {
                    tracing::info!(
                        iteration,
                        remaining_units = new_configuration.len(),
                        granularity = effective_n,
                        phase = %kind,
                        "accepted reduction"
                    );
                    granularity = match kind {
                        ProbeKind::Subset => 2,
                        ProbeKind::Complement => effective_n
                            .saturating_sub(self.config.split_factor.saturating_sub(1))
                            .max(2),
                    };
                    configuration = new_configuration;
                    iteration += 1;
                }
                None => {
                    if effective_n < configuration.len() {
                        let next = crate::core::split::increase_granularity(
                            effective_n,
                            self.config.split_factor,
                            configuration.len(),
                        );
                        tracing::info!(iteration, granularity = next, "escalating granularity");
                        granularity = next;
                    } else {
                        break;
                    }
                }
            }
        }

        Ok(MinimizationReport {
            original_unit_count,
            final_unit_count: configuration.len(),
            iterations: iteration,
            cache_entries: self.scheduler_cache_len(),
            final_configuration: configuration,
        })
    }

    fn scheduler_cache_len(&self) -> usize {
        self.scheduler.cache_len()
    }

    async fn race_phased(
        &self,
        configuration: &Configuration,
        chunking: &Chunking,
        probe_root: &ProbeId,
    ) -> Option<(ProbeKind, Configuration, usize)> {
        let (first, second) = if self.config.complement_first {
            (ProbeKind::Complement, ProbeKind::Subset)
        } else {
            (ProbeKind::Subset, ProbeKind::Complement)
        };
        if let Some(winner) = self.race_single_phase(configuration, chunking, probe_root, first).await {
            return Some(winner);
        }
        self.race_single_phase(configuration, chunking, probe_root, second).await
    }

    async fn race_single_phase(
        &self,
        configuration: &Configuration,
        chunking: &Chunking,
        probe_root: &ProbeId,
        kind: ProbeKind,
    ) -> Option<(ProbeKind, Configuration, usize)> {
        let strategy = self.strategy_for(kind);
        if strategy.is_skip() || chunking.is_empty() || Self::is_vacuous(kind, chunking) {
            return None;
        }
        let probes = self.build_probes(configuration, chunking, probe_root, kind, strategy);
        match self.scheduler.race(probes).await {
            RaceOutcome::Winner(probe) => Some((probe.kind, probe.configuration, probe.chunk_index)),
            RaceOutcome::Exhausted => None,
        }
    }

    async fn race_combined(
        &self,
        configuration: &Configuration,
        chunking: &Chunking,
        probe_root: &ProbeId,
    ) -> Option<(ProbeKind, Configuration, usize)> {
        if chunking.is_empty() {
            return None;
        }
        let (first, second) = if self.config.complement_first {
            (ProbeKind::Complement, ProbeKind::Subset)
        } else {
            (ProbeKind::Subset, ProbeKind::Complement)
        };

        let mut probes = Vec::new();
        for kind in [first, second] {
            let strategy = self.strategy_for(kind);
            if strategy.is_skip() || Self::is_vacuous(kind, chunking) {
                continue;
            }
            probes.extend(self.build_probes(configuration, chunking, probe_root, kind, strategy));
        }

        match self.scheduler.race(probes).await {
            RaceOutcome::Winner(probe) => Some((probe.kind, probe.configuration, probe.chunk_index)),
            RaceOutcome::Exhausted => None,
        }
    }

    fn strategy_for(&self, kind: ProbeKind) -> Strategy {
        match kind {
            ProbeKind::Subset => self.config.subset_strategy,
            ProbeKind::Complement => self.config.complement_strategy,
        }
    }

    /// `true` for a subset phase whose only possible probe is the whole
    /// current configuration (a single chunk): `subset(0)` would equal
    /// `configuration` exactly, so racing it can only ever "win" without
    /// shrinking anything, stalling the outer loop forever. The
    /// complement phase has no such degenerate case — `complement(0)` of
    /// a single chunk is the empty configuration, a real reduction (S4).
    fn is_vacuous(kind: ProbeKind, chunking: &Chunking) -> bool {
        matches!(kind, ProbeKind::Subset) && chunking.len() < 2
    }

    fn build_probes(
        &self,
        configuration: &Configuration,
        chunking: &Chunking,
        probe_root: &ProbeId,
        kind: ProbeKind,
        strategy: Strategy,
    ) -> Vec<Probe> {
        let segment = match kind {
            ProbeKind::Subset => PathSegment::Subset,
            ProbeKind::Complement => PathSegment::Complement,
        };
        let phase_root = ProbeId::child(probe_root, segment);
        strategy
            .order(chunking.len())
            .into_iter()
            .map(|i| {
                let probe_configuration = match kind {
                    ProbeKind::Subset => configuration.subset(chunking, i),
                    ProbeKind::Complement => configuration.complement(chunking, i),
                };
                Probe {
                    id: ProbeId::child(&phase_root, PathSegment::Chunk(i)),
                    configuration: probe_configuration,
                    kind,
                    chunk_index: i,
                }
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cache::{CacheMode, OutcomeCache};
    use crate::oracle::in_process::InProcessOracle;
    use crate::splitter::{Atom, SplitInput};
    use std::sync::Arc;

    fn engine_over(unit_count: usize, oracle: InProcessOracle, config: EngineConfig) -> (Engine, Configuration) {
        let cache = Arc::new(OutcomeCache::new(CacheMode::Config));
        let bytes: Vec<u8> = (0..unit_count).map(|_| b'x').collect();
        let splitter = Arc::new(SplitInput::split(&bytes, Atom::Char));
        let scheduler = Scheduler::new(Arc::new(oracle), cache, splitter, 1);
        let engine = Engine::new(scheduler, config).unwrap();
        (engine, Configuration::universe(unit_count))
    }

    #[tokio::test]
    async fn rejects_double_skip_at_construction() {
        let cache = Arc::new(OutcomeCache::new(CacheMode::Config));
        let splitter = Arc::new(SplitInput::split(b"x", Atom::Char));
        let oracle = Arc::new(InProcessOracle::from_predicate(|_| true));
        let scheduler = Scheduler::new(oracle, cache, splitter, 1);
        let config = EngineConfig {
            subset_strategy: Strategy::Skip,
            complement_strategy: Strategy::Skip,
            ..EngineConfig::default()
        };
        assert!(Engine::new(scheduler, config).is_err());
    }

    #[tokio::test]
    async fn rejects_an_uninteresting_initial_input() {
        let oracle = InProcessOracle::from_predicate(|_| false);
        let (engine, initial) = engine_over(8, oracle, EngineConfig::default());
        let result = engine.minimize(initial).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn s1_classic_zeller_finds_the_hidden_pair() {
        // Units are 0-indexed here (UnitId(2), UnitId(5)) for {3,6} 1-indexed.
        let oracle = InProcessOracle::from_predicate(|c| {
            let units: Vec<usize> = c.units().iter().map(|u| u.0).collect();
            units.contains(&2) && units.contains(&5)
        });
        let (engine, initial) = engine_over(8, oracle, EngineConfig::default());
        let report = engine.minimize(initial).await.unwrap();
        let mut units: Vec<usize> = report.final_configuration.units().iter().map(|u| u.0).collect();
        units.sort_unstable();
        assert_eq!(units, vec![2, 5]);
    }

    #[tokio::test]
    async fn s3_trivially_minimal_single_unit_stays_as_is() {
        let oracle = InProcessOracle::from_predicate(|_| true);
        let (engine, initial) = engine_over(1, oracle, EngineConfig::default());
        let report = engine.minimize(initial).await.unwrap();
        assert_eq!(report.final_configuration.len(), 1);
    }

    #[tokio::test]
    async fn s4_empty_minimum_when_oracle_is_always_interesting() {
        let oracle = InProcessOracle::from_predicate(|_| true);
        let (engine, initial) = engine_over(3, oracle, EngineConfig::default());
        let report = engine.minimize(initial).await.unwrap();
        assert_eq!(report.final_configuration.len(), 0);
    }

    #[tokio::test]
    async fn s4_terminates_with_combine_loops_too() {
        // A length-1 configuration only ever offers one subset probe (the
        // whole chunking) which can never shrink anything; this must not
        // stall the combined subset+complement race either.
        let oracle = InProcessOracle::from_predicate(|_| true);
        let config = EngineConfig {
            combine_loops: true,
            ..EngineConfig::default()
        };
        let (engine, initial) = engine_over(3, oracle, config);
        let report = tokio::time::timeout(std::time::Duration::from_secs(5), engine.minimize(initial))
            .await
            .expect("minimisation must terminate once it reaches a length-1 configuration")
            .unwrap();
        assert_eq!(report.final_configuration.len(), 0);
    }

    #[tokio::test]
    async fn result_is_one_minimal() {
        let target = [1usize, 4, 6];
        let oracle = InProcessOracle::from_predicate(move |c| {
            let units: Vec<usize> = c.units().iter().map(|u| u.0).collect();
            target.iter().all(|t| units.contains(t))
        });
        let (engine, initial) = engine_over(8, oracle.clone(), EngineConfig::default());
        let report = engine.minimize(initial).await.unwrap();

        // Invariant 3: removing any single unit from the result makes it
        // uninteresting under the same oracle.
        let result_units = report.final_configuration.units().to_vec();
        for i in 0..result_units.len() {
            let mut remaining = result_units.clone();
            remaining.remove(i);
            let probe_configuration = Configuration::from_units(&remaining);
            assert!(!oracle_is_interesting(&oracle, &probe_configuration).await);
        }
    }

    async fn oracle_is_interesting(oracle: &InProcessOracle, configuration: &Configuration) -> bool {
        use crate::core::{PathSegment as PS, ProbeId as PI, Verdict};
        use crate::oracle::Oracle as _;
        use crate::scheduler::cancel::CancellationToken;

        let probe = Probe {
            id: PI::child(&PI::default(), PS::Iteration(0)),
            configuration: configuration.clone(),
            kind: ProbeKind::Subset,
            chunk_index: 0,
        };
        matches!(oracle.run(&probe, CancellationToken::new()).await, Verdict::Interesting)
    }

    fn minimize_blocking(total: usize, target: usize, concurrency: usize) -> Configuration {
        let cache = Arc::new(OutcomeCache::new(CacheMode::Config));
        let bytes: Vec<u8> = (0..total).map(|_| b'x').collect();
        let splitter = Arc::new(SplitInput::split(&bytes, Atom::Char));
        let oracle = InProcessOracle::from_predicate(move |c| c.units().iter().any(|u| u.0 == target));
        let scheduler = Scheduler::new(Arc::new(oracle), cache, splitter, concurrency);
        let engine = Engine::new(scheduler, EngineConfig::default()).unwrap();
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(engine.minimize(Configuration::universe(total)))
            .unwrap()
            .final_configuration
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(20))]
        // Invariant 4 (§8): for any deterministic oracle and any j >= 1,
        // parallel and sequential racing return the same 1-minimal result.
        #[test]
        fn invariant_parallel_equals_sequential_across_targets(
            total in 2usize..24,
            target_seed in 0usize..24,
            concurrency in 1usize..8,
        ) {
            let target = target_seed % total;
            let sequential = minimize_blocking(total, target, 1);
            let parallel = minimize_blocking(total, target, concurrency);
            proptest::prop_assert_eq!(sequential.units(), parallel.units());
        }
    }
}
