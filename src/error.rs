//! Crate-wide error hierarchy.
//!
//! One `thiserror`-derived enum per the error kinds laid out in the
//! reduction engine's design: each variant carries enough context to
//! produce the one-line diagnostic the CLI prints on exit.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by the splitter, cache, oracle, scheduler, or engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The input file is unreadable, empty, or the tester isn't executable.
    #[error("input error: {message}")]
    Input {
        /// Human-readable explanation.
        message: String,
    },

    /// A CLI flag combination is rejected before any oracle call is made.
    #[error("configuration error: {message}")]
    Configuration {
        /// Human-readable explanation.
        message: String,
    },

    /// The full, unreduced input was not interesting under the oracle.
    #[error("initial input is not interesting: {message}")]
    InitialUninteresting {
        /// Human-readable explanation.
        message: String,
    },

    /// The cache observed a contradicting verdict for the same key.
    ///
    /// Logged and the later verdict is ignored; never aborts the run.
    #[error("oracle returned inconsistent verdicts for an identical candidate: {key}")]
    OracleNonDeterminism {
        /// Debug rendering of the offending cache key.
        key: String,
    },

    /// A worker process died without producing a verdict.
    ///
    /// Treated as `Uninteresting` for that probe; never escalated.
    #[error("worker for probe {probe_path} crashed: {message}")]
    WorkerCrash {
        /// Slash-joined probe path, for correlation with logs.
        probe_path: String,
        /// Human-readable explanation.
        message: String,
    },

    /// The per-probe workspace directory could not be created or cleaned up.
    #[error("workspace error at {path}: {message}")]
    Workspace {
        /// The workspace path involved.
        path: PathBuf,
        /// Human-readable explanation.
        message: String,
    },

    /// Wraps an I/O failure with the operation that triggered it.
    #[error("I/O error during {operation}: {source}")]
    Io {
        /// What was being attempted (e.g. "reading input file").
        operation: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    /// Process exit code this error should map to.
    ///
    /// `Input`, `Configuration`, and `InitialUninteresting` are the
    /// "surfaced immediately, no retry" kinds from the error design;
    /// everything else that reaches the top level is an unrecoverable
    /// infrastructure failure.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Input { .. } | Self::Configuration { .. } | Self::InitialUninteresting { .. } => 1,
            Self::OracleNonDeterminism { .. }
            | Self::WorkerCrash { .. }
            | Self::Workspace { .. }
            | Self::Io { .. } => 2,
        }
    }
}
