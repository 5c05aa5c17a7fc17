//! A boxed-closure oracle for tests, driving the engine and scheduler
//! without spawning real processes.
//!
//! A trait-object seam like this lets tests exercise the engine and
//! scheduler against a fake, in-memory verdict source instead of a real
//! subprocess tester.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use super::Oracle;
use crate::core::{Configuration, Probe, Verdict};
use crate::scheduler::cancel::CancellationToken;

type Judge = dyn Fn(&Configuration) -> Pin<Box<dyn Future<Output = Verdict> + Send>> + Send + Sync;

/// An oracle backed by an in-process closure instead of a subprocess.
///
/// The closure receives the probe's configuration and returns a verdict;
/// it may itself await (e.g. `tokio::time::sleep`, as S5 in spec.md §8
/// does to exercise race ordering under artificial latency).
#[derive(Clone)]
pub struct InProcessOracle {
    judge: Arc<Judge>,
}

impl InProcessOracle {
    /// Wraps a synchronous predicate: `true` means interesting.
    #[must_use]
    pub fn from_predicate<F>(predicate: F) -> Self
    where
        F: Fn(&Configuration) -> bool + Send + Sync + 'static,
    {
        Self {
            judge: Arc::new(move |configuration| {
                let verdict = if predicate(configuration) {
                    Verdict::Interesting
                } else {
                    Verdict::Uninteresting
                };
                Box::pin(async move { verdict })
            }),
        }
    }

    /// Wraps an async judge directly, for scenarios that need to await
    /// (artificial latency, simulated flakiness, etc).
    #[must_use]
    pub fn from_async<F, Fut>(judge: F) -> Self
    where
        F: Fn(&Configuration) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Verdict> + Send + 'static,
    {
        Self {
            judge: Arc::new(move |configuration| Box::pin(judge(configuration))),
        }
    }
}

#[async_trait]
impl Oracle for InProcessOracle {
    async fn run(&self, probe: &Probe, cancel: CancellationToken) -> Verdict {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Verdict::Cancelled,
            verdict = (self.judge)(&probe.configuration) => verdict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PathSegment, ProbeId, ProbeKind, UnitId};

    fn probe_with(units: &[UnitId]) -> Probe {
        Probe {
            id: ProbeId::child(&ProbeId::default(), PathSegment::Iteration(0)),
            configuration: Configuration::from_units(units),
            kind: ProbeKind::Subset,
            chunk_index: 0,
        }
    }

    #[tokio::test]
    async fn predicate_oracle_reports_interesting_and_uninteresting() {
        let oracle = InProcessOracle::from_predicate(|c| c.units().contains(&UnitId(5)));
        let hit = oracle.run(&probe_with(&[UnitId(5)]), CancellationToken::new()).await;
        assert_eq!(hit, Verdict::Interesting);
        let miss = oracle.run(&probe_with(&[UnitId(1)]), CancellationToken::new()).await;
        assert_eq!(miss, Verdict::Uninteresting);
    }

    #[tokio::test]
    async fn cancellation_preempts_a_slow_judge() {
        let oracle = InProcessOracle::from_async(|_configuration| async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Verdict::Interesting
        });
        let cancel = CancellationToken::new();
        cancel.cancel();
        let verdict = oracle.run(&probe_with(&[UnitId(0)]), cancel).await;
        assert_eq!(verdict, Verdict::Cancelled);
    }
}
