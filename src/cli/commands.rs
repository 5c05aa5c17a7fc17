//! Wires the splitter, workspace, oracle, scheduler, and engine together
//! into the single command this binary runs (§6, "CLI surface").
//!
//! This tool has exactly one job: reduce one input against one tester,
//! so `run` is the sole entry point rather than one of many subcommand
//! handlers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::OutcomeCache;
use crate::cli::output::{render_report, VerboseStats};
use crate::cli::parser::Cli;
use crate::engine::{Engine, EngineConfig};
use crate::error::{EngineError, Result};
use crate::oracle::SubprocessOracle;
use crate::scheduler::Scheduler;
use crate::splitter::SplitInput;
use crate::workspace::Workspace;

/// Runs one minimisation from end to end and returns the rendered report.
///
/// On success, the input file at `cli.input` is overwritten in place with
/// the 1-minimal result — there is no `--output` flag in the CLI surface,
/// so the reduced candidate is promoted back to where it was found, the
/// same convention classic delta-debugging tools use.
pub async fn run(cli: &Cli) -> Result<String> {
    let started = Instant::now();

    let input_bytes = std::fs::read(&cli.input).map_err(|source| EngineError::Input {
        message: format!("failed to read input file {}: {source}", cli.input.display()),
    })?;
    if input_bytes.is_empty() {
        return Err(EngineError::Input {
            message: format!("input file {} is empty", cli.input.display()),
        });
    }

    let splitter = Arc::new(SplitInput::split(&input_bytes, cli.atom));
    if splitter.unit_count() == 0 {
        return Err(EngineError::Input {
            message: format!("input file {} produced zero atomic units", cli.input.display()),
        });
    }

    let candidate_file_name = cli
        .input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "candidate".to_string());

    let workspace = Arc::new(match &cli.session_id {
        Some(session_id) => Workspace::with_session_id(candidate_file_name, session_id.clone())?,
        None => Workspace::new(candidate_file_name)?,
    });

    let oracle = Arc::new(SubprocessOracle::new(
        cli.test.clone(),
        Arc::clone(&workspace),
        Arc::clone(&splitter),
        cli.oracle_timeout_secs.map(Duration::from_secs),
        Duration::from_millis(cli.kill_grace_millis),
        cli.cleanup,
    )?);

    let cache = Arc::new(OutcomeCache::new(cli.cache));
    let scheduler = Scheduler::new(oracle, cache, Arc::clone(&splitter), cli.effective_jobs());

    let engine_config = EngineConfig {
        split_factor: cli.split.max(1),
        subset_strategy: cli.subset_iterator,
        complement_strategy: cli.complement_iterator,
        complement_first: cli.complement_first,
        combine_loops: cli.combine_loops,
    };
    let engine = Engine::new(scheduler, engine_config)?;

    let report = engine.minimize(splitter.universe()).await?;

    let reduced_bytes = splitter.serialize(&report.final_configuration);
    std::fs::write(&cli.input, &reduced_bytes).map_err(|source| EngineError::Io {
        operation: format!("writing minimized result to {}", cli.input.display()),
        source,
    })?;

    let verbose = cli.verbose.then(|| VerboseStats {
        cache_entries: report.cache_entries,
        elapsed_ms: started.elapsed().as_millis(),
    });

    Ok(render_report(&report, cli.format, &cli.input, verbose.as_ref()))
}
