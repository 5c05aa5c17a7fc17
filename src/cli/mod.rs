//! CLI layer for picire-rs.
//!
//! Provides the command-line interface using clap: argument parsing
//! ([`parser`]), the run orchestration that wires splitter, workspace,
//! oracle, scheduler and engine together ([`commands`]), and result
//! rendering ([`output`]).

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::run;
pub use output::OutputFormat;
pub use parser::Cli;
