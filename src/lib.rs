//! A parallel minimising delta-debugger: shrinks a failing test input to
//! a 1-minimal interesting witness.
//!
//! The crate is organised leaves-first: [`core`] is the pure data model
//! (units, configurations, chunkings, strategies), [`cache`] memoises
//! oracle verdicts, [`oracle`] is the tester contract, [`scheduler`]
//! races candidate probes against it, and [`engine`] drives the main
//! reduction loop on top of all four. [`splitter`] and [`workspace`] are
//! the I/O-facing collaborators that turn a byte buffer into units and
//! back, and give each probe a scratch directory to run in.

pub mod cache;
pub mod cli;
pub mod core;
pub mod engine;
pub mod error;
pub mod oracle;
pub mod scheduler;
pub mod splitter;
pub mod workspace;

pub use engine::{Engine, EngineConfig, MinimizationReport};
pub use error::{EngineError, Result};
pub use oracle::{Oracle, SubprocessOracle};
pub use scheduler::{RaceOutcome, Scheduler};
