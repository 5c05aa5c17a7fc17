//! Probe scheduler: races an ordered list of candidate probes against
//! the oracle, returning the lowest-indexed winner (§4.4).

pub mod cancel;

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};

use crate::cache::{CacheKey, CacheMode, OutcomeCache};
use crate::core::{Probe, Verdict};
use crate::oracle::Oracle;
use crate::splitter::SplitInput;
use cancel::CancellationToken;

/// Result of racing a candidate list: either the lowest-indexed winner,
/// or `Exhausted` if every probe came back uninteresting.
///
/// A named enum reads as "no winner" at call sites rather than leaving
/// an ambiguous bare `None`.
#[derive(Debug, Clone)]
pub enum RaceOutcome {
    Winner(Probe),
    Exhausted,
}

/// Dispatches oracle calls for an ordered probe list, sequentially or
/// with bounded parallelism, consulting and populating a shared cache.
///
/// A `tokio::sync::Semaphore` bounds concurrency; permits are acquired in
/// candidate order so dispatch order matches the configured strategy's
/// ordering, and results are collected back on the calling task.
pub struct Scheduler {
    oracle: Arc<dyn Oracle>,
    cache: Arc<OutcomeCache>,
    splitter: Arc<SplitInput>,
    concurrency: usize,
}

impl Scheduler {
    /// Builds a scheduler bounding concurrent oracle calls to `concurrency`
    /// (`concurrency <= 1` takes the sequential fast path).
    #[must_use]
    pub fn new(oracle: Arc<dyn Oracle>, cache: Arc<OutcomeCache>, splitter: Arc<SplitInput>, concurrency: usize) -> Self {
        Self {
            oracle,
            cache,
            splitter,
            concurrency: concurrency.max(1),
        }
    }

    /// Number of distinct verdicts recorded in the shared cache so far.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    fn cache_key(&self, probe: &Probe) -> Option<CacheKey> {
        let content = if self.cache.mode() == CacheMode::Content {
            self.splitter.serialize(&probe.configuration)
        } else {
            Vec::new()
        };
        self.cache.key_for(&probe.configuration, &content)
    }

    /// Races `probes`, in order, to the first (lowest-index) interesting
    /// verdict. An empty list is immediately `Exhausted`.
    pub async fn race(&self, probes: Vec<Probe>) -> RaceOutcome {
        if probes.is_empty() {
            return RaceOutcome::Exhausted;
        }
        if self.concurrency <= 1 {
            self.race_sequential(probes).await
        } else {
            self.race_parallel(probes).await
        }
    }

    async fn race_sequential(&self, probes: Vec<Probe>) -> RaceOutcome {
        for probe in probes {
            let key = self.cache_key(&probe);
            if let Some(key) = &key {
                if let Some(verdict) = self.cache.get(key) {
                    if verdict == Verdict::Interesting {
                        return RaceOutcome::Winner(probe);
                    }
                    continue;
                }
            }
            let verdict = self.oracle.run(&probe, CancellationToken::new()).await;
            if let Some(key) = key {
                self.cache.record(key, verdict);
            }
            if verdict == Verdict::Interesting {
                return RaceOutcome::Winner(probe);
            }
        }
        RaceOutcome::Exhausted
    }

    async fn race_parallel(&self, probes: Vec<Probe>) -> RaceOutcome {
        let total = probes.len();
        let probes = Arc::new(probes);
        let tokens: Vec<CancellationToken> = (0..total).map(|_| CancellationToken::new()).collect();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, Verdict)>();

        let dispatch = {
            let oracle = Arc::clone(&self.oracle);
            let cache = Arc::clone(&self.cache);
            let probes = Arc::clone(&probes);
            let tokens = tokens.clone();
            let semaphore = Arc::clone(&semaphore);
            let scheduler_cache_mode = self.cache.mode();
            let splitter = Arc::clone(&self.splitter);
            tokio::spawn(async move {
                for index in 0..probes.len() {
                    let probe = probes[index].clone();
                    let content = if scheduler_cache_mode == CacheMode::Content {
                        splitter.serialize(&probe.configuration)
                    } else {
                        Vec::new()
                    };
                    let key = cache.key_for(&probe.configuration, &content);

                    if let Some(key) = &key {
                        if let Some(verdict) = cache.get(key) {
                            if tx.send((index, verdict)).is_err() {
                                return;
                            }
                            continue;
                        }
                    }

                    let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                        return;
                    };
                    let oracle = Arc::clone(&oracle);
                    let cache = Arc::clone(&cache);
                    let cancel = tokens[index].clone();
                    let tx = tx.clone();
                    // A worker whose oracle call panics must still publish
                    // a verdict: otherwise `verdicts[index]` stays `None`
                    // forever and the collector's `pointer` can never
                    // advance past it, hanging the whole race (§7,
                    // `WorkerCrash` — "treated as UNINTERESTING for that
                    // probe; logged").
                    let worker = tokio::spawn(async move {
                        let _permit = permit;
                        let verdict = oracle.run(&probe, cancel).await;
                        if let Some(key) = key {
                            cache.record(key, verdict);
                        }
                        verdict
                    });
                    tokio::spawn(async move {
                        let verdict = match worker.await {
                            Ok(verdict) => verdict,
                            Err(join_error) => {
                                tracing::warn!(probe_index = index, error = %join_error, "worker crashed without a verdict, treating as uninteresting");
                                Verdict::Uninteresting
                            }
                        };
                        let _ = tx.send((index, verdict));
                    });
                }
            })
        };

        let mut verdicts: Vec<Option<Verdict>> = vec![None; total];
        let mut pointer = 0usize;
        let mut winner_index = None;

        while let Some((index, verdict)) = rx.recv().await {
            verdicts[index] = Some(verdict);
            while pointer < total {
                match verdicts[pointer] {
                    Some(Verdict::Interesting) => {
                        winner_index = Some(pointer);
                        break;
                    }
                    Some(_) => pointer += 1,
                    None => break,
                }
            }
            if let Some(winner) = winner_index {
                for token in tokens.iter().skip(winner + 1) {
                    token.cancel();
                }
                break;
            }
        }

        dispatch.abort();

        match winner_index {
            Some(winner) => RaceOutcome::Winner(probes[winner].clone()),
            None => RaceOutcome::Exhausted,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cache::CacheMode;
    use crate::core::{Configuration, PathSegment, ProbeId, ProbeKind, UnitId};
    use crate::oracle::in_process::InProcessOracle;
    use crate::splitter::Atom;
    use std::time::Duration;

    fn probes_for(units: &[usize]) -> Vec<Probe> {
        units
            .iter()
            .enumerate()
            .map(|(i, &u)| Probe {
                id: ProbeId::child(&ProbeId::default(), PathSegment::Chunk(i)),
                configuration: Configuration::from_units(&[UnitId(u)]),
                kind: ProbeKind::Subset,
                chunk_index: i,
            })
            .collect()
    }

    fn new_scheduler(oracle: InProcessOracle, concurrency: usize) -> Scheduler {
        let cache = Arc::new(OutcomeCache::new(CacheMode::Config));
        let splitter = Arc::new(SplitInput::split(b"0123456789", Atom::Char));
        Scheduler::new(Arc::new(oracle), cache, splitter, concurrency)
    }

    #[tokio::test]
    async fn sequential_returns_lowest_interesting_index() {
        let oracle = InProcessOracle::from_predicate(|c| c.units().contains(&UnitId(3)));
        let scheduler = new_scheduler(oracle, 1);
        let outcome = scheduler.race(probes_for(&[1, 2, 3, 4])).await;
        match outcome {
            RaceOutcome::Winner(probe) => assert_eq!(probe.configuration.units(), &[UnitId(3)]),
            RaceOutcome::Exhausted => panic!("expected a winner"),
        }
    }

    #[tokio::test]
    async fn exhausted_when_nothing_matches() {
        let oracle = InProcessOracle::from_predicate(|c| c.units().contains(&UnitId(99)));
        let scheduler = new_scheduler(oracle, 1);
        let outcome = scheduler.race(probes_for(&[1, 2, 3])).await;
        assert!(matches!(outcome, RaceOutcome::Exhausted));
    }

    #[tokio::test]
    async fn parallel_matches_sequential_under_artificial_latency() {
        // S5: later indices resolve faster, but the lowest index containing
        // the hidden unit must still win, for both j=1 and j=8.
        let make_oracle = || {
            InProcessOracle::from_async(|configuration| {
                let units = configuration.units().to_vec();
                async move {
                    let index = units.first().map_or(0, |u| u.0);
                    tokio::time::sleep(Duration::from_millis((16 - index as u64) % 16)).await;
                    if units.contains(&UnitId(5)) {
                        Verdict::Interesting
                    } else {
                        Verdict::Uninteresting
                    }
                }
            })
        };

        let units: Vec<usize> = (0..16).collect();

        let sequential = new_scheduler(make_oracle(), 1).race(probes_for(&units)).await;
        let parallel = new_scheduler(make_oracle(), 8).race(probes_for(&units)).await;

        match (sequential, parallel) {
            (RaceOutcome::Winner(a), RaceOutcome::Winner(b)) => {
                assert_eq!(a.configuration.units(), b.configuration.units());
                assert_eq!(a.configuration.units(), &[UnitId(5)]);
            }
            other => panic!("expected both modes to find a winner: {other:?}"),
        }
    }

    #[tokio::test]
    async fn cache_hit_skips_the_oracle_without_affecting_the_winner() {
        let cache = Arc::new(OutcomeCache::new(CacheMode::Config));
        let pre_key = cache
            .key_for(&Configuration::from_units(&[UnitId(2)]), b"")
            .unwrap();
        cache.record(pre_key, Verdict::Uninteresting);

        let oracle = Arc::new(InProcessOracle::from_predicate(|c| c.units().contains(&UnitId(3))));
        let splitter = Arc::new(SplitInput::split(b"0123456789", Atom::Char));
        let scheduler = Scheduler::new(oracle, cache, splitter, 4);

        let outcome = scheduler.race(probes_for(&[2, 3])).await;
        match outcome {
            RaceOutcome::Winner(probe) => assert_eq!(probe.configuration.units(), &[UnitId(3)]),
            RaceOutcome::Exhausted => panic!("expected a winner"),
        }
    }

    #[tokio::test]
    async fn a_crashing_worker_does_not_hang_the_race() {
        // The probe for unit 1 panics inside the oracle; the collector
        // must still treat it as uninteresting and move on to find the
        // lower-priority winner rather than stalling on the dead index.
        let oracle = InProcessOracle::from_async(|configuration| {
            let units = configuration.units().to_vec();
            async move {
                if units.contains(&UnitId(1)) {
                    panic!("simulated worker crash");
                }
                if units.contains(&UnitId(3)) {
                    Verdict::Interesting
                } else {
                    Verdict::Uninteresting
                }
            }
        });
        let scheduler = new_scheduler(oracle, 4);
        let outcome = tokio::time::timeout(Duration::from_secs(5), scheduler.race(probes_for(&[1, 2, 3, 4])))
            .await
            .expect("race must not hang when a worker panics");
        match outcome {
            RaceOutcome::Winner(probe) => assert_eq!(probe.configuration.units(), &[UnitId(3)]),
            RaceOutcome::Exhausted => panic!("expected a winner"),
        }
    }
}
