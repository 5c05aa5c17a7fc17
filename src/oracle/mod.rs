//! Oracle adapter: the contract between the engine and whatever external
//! process decides if a candidate is "interesting" (§5).

pub mod in_process;
pub mod subprocess;

use async_trait::async_trait;

use crate::core::{Probe, Verdict};
use crate::scheduler::cancel::CancellationToken;

/// Tests a single candidate probe and reports a verdict.
///
/// Implementations must be cancellation-safe: once `cancel` resolves, an
/// in-flight `run` should stop as promptly as it can and return
/// `Verdict::Cancelled` rather than keep spending resources on a probe
/// the scheduler has already decided doesn't matter. An `async_trait`
/// with a `Send + Sync` bound so implementors can be shared across
/// concurrently spawned tasks via `Arc`.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Runs the test against `probe` and returns its verdict.
    ///
    /// A verdict of `Uninteresting` is also returned for infrastructure
    /// failures the oracle itself can recover from (e.g. a worker crash);
    /// per the error design, the engine never escalates a single probe's
    /// failure into a hard error, it just treats the probe as
    /// uninteresting and moves on. `cancel` resolving mid-run should make
    /// this return `Verdict::Cancelled` promptly.
    async fn run(&self, probe: &Probe, cancel: CancellationToken) -> Verdict;
}

pub use subprocess::SubprocessOracle;
