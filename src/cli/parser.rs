//! Command-line argument parsing.
//!
//! A single top-level [`Cli`] struct — this tool does one thing (reduce
//! one input against one tester), so there is no `#[command(subcommand)]`,
//! just a flat set of `#[arg(long, default_value = "...")]` fields and a
//! `#[command(after_help = "...")]` usage-example block.

use std::path::PathBuf;

use clap::Parser;

use crate::cache::CacheMode;
use crate::cli::output::OutputFormat;
use crate::core::Strategy;
use crate::splitter::Atom;

/// picire-rs: a parallel minimising delta-debugger.
///
/// Shrinks a failing test input to a 1-minimal witness that still
/// exhibits whatever property the tester checks for.
#[derive(Parser, Debug)]
#[command(name = "picire-rs")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"Examples:
  picire-rs --input crash.c --test ./check.sh
  picire-rs --input crash.c --test ./check.sh --parallel -j 8
  picire-rs --input crash.js --test ./check.sh --atom char --cache content
  picire-rs --input crash.c --test ./check.sh --combine-loops --complement-first
  picire-rs --input crash.c --test ./check.sh --subset-iterator skip --complement-iterator backward
"#)]
pub struct Cli {
    /// Input file to minimise.
    #[arg(long)]
    pub input: PathBuf,

    /// Tester executable, invoked with the candidate file's path as its
    /// sole argument. Exit code 0 means interesting.
    #[arg(long)]
    pub test: PathBuf,

    /// Run the probe scheduler in parallel mode instead of sequentially.
    #[arg(long)]
    pub parallel: bool,

    /// Worker count in parallel mode. Defaults to the available CPU count.
    #[arg(short = 'j', long = "jobs")]
    pub jobs: Option<usize>,

    /// Merge the subset and complement loops into a single race per
    /// iteration instead of probing them in two separate phases.
    #[arg(long = "combine-loops")]
    pub combine_loops: bool,

    /// Probe the complement loop before the subset loop.
    #[arg(long = "complement-first")]
    pub complement_first: bool,

    /// Ordering for the subset loop.
    #[arg(long = "subset-iterator", value_enum, default_value_t = Strategy::Forward)]
    pub subset_iterator: Strategy,

    /// Ordering for the complement loop.
    #[arg(long = "complement-iterator", value_enum, default_value_t = Strategy::Forward)]
    pub complement_iterator: Strategy,

    /// Split factor: chunk count at the start of each iteration and the
    /// granularity escalation step.
    #[arg(long, default_value_t = 2)]
    pub split: usize,

    /// Outcome cache keying mode.
    #[arg(long, value_enum, default_value_t = CacheMode::None)]
    pub cache: CacheMode,

    /// Remove each probe's workspace directory as soon as its verdict is
    /// known. Default: keep only the most recent interesting probe,
    /// evicting it once a later one supersedes it.
    #[arg(long)]
    pub cleanup: bool,

    /// Initial splitter granularity: one unit per line or per character.
    #[arg(long, value_enum, default_value_t = Atom::Line)]
    pub atom: Atom,

    /// Final-report rendering.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    /// Include cache statistics and run timing in the final report.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Grace period, in milliseconds, between SIGTERM and SIGKILL when
    /// cancelling an in-flight oracle process.
    #[arg(long = "kill-grace", default_value_t = 200)]
    pub kill_grace_millis: u64,

    /// Per-probe tester timeout, in seconds. Unset means wait indefinitely.
    #[arg(long = "oracle-timeout")]
    pub oracle_timeout_secs: Option<u64>,

    /// Overrides the generated session id used in the per-run workspace
    /// path (`<tmp_root>/<session_id>/...`). Defaults to a timestamp-
    /// derived identifier.
    #[arg(long = "session-id")]
    pub session_id: Option<String>,
}

impl Cli {
    /// Effective worker count: `--jobs` if given, else the available
    /// parallelism, falling back to `1` if that can't be determined.
    #[must_use]
    pub fn effective_jobs(&self) -> usize {
        if !self.parallel {
            return 1;
        }
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["picire-rs"];
        full.extend_from_slice(args);
        Cli::parse_from(full)
    }

    #[test]
    fn minimal_invocation_uses_defaults() {
        let cli = parse(&["--input", "crash.c", "--test", "./check.sh"]);
        assert_eq!(cli.split, 2);
        assert_eq!(cli.cache, CacheMode::None);
        assert_eq!(cli.atom, Atom::Line);
        assert_eq!(cli.subset_iterator, Strategy::Forward);
        assert!(!cli.parallel);
        assert_eq!(cli.effective_jobs(), 1);
    }

    #[test]
    fn parallel_without_jobs_falls_back_to_available_parallelism() {
        let cli = parse(&["--input", "crash.c", "--test", "./check.sh", "--parallel"]);
        assert!(cli.effective_jobs() >= 1);
    }

    #[test]
    fn explicit_jobs_is_honoured() {
        let cli = parse(&["--input", "crash.c", "--test", "./check.sh", "--parallel", "-j", "4"]);
        assert_eq!(cli.effective_jobs(), 4);
    }

    #[test]
    fn value_enum_flags_parse() {
        let cli = parse(&[
            "--input",
            "crash.c",
            "--test",
            "./check.sh",
            "--subset-iterator",
            "skip",
            "--complement-iterator",
            "backward",
            "--cache",
            "content",
            "--atom",
            "char",
        ]);
        assert_eq!(cli.subset_iterator, Strategy::Skip);
        assert_eq!(cli.complement_iterator, Strategy::Backward);
        assert_eq!(cli.cache, CacheMode::Content);
        assert_eq!(cli.atom, Atom::Char);
    }
}
