//! `picire-rs` binary entry point.
//!
//! Parses the CLI, initialises structured logging, and runs the
//! minimisation, mapping the result to an exit code and the final
//! report rendering (§6, "Exit code: 0 on successful minimisation;
//! non-zero on configuration error or unrecoverable oracle failure").

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use picire_rs::cli::{output, run, Cli};

// The final report is the program's actual output, not a log line, so
// it goes to stdout via `println!` deliberately.
#[allow(clippy::print_stdout)]
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli).await {
        Ok(rendered) => {
            println!("{rendered}");
            ExitCode::SUCCESS
        }
        Err(source) => {
            if let Some(json) = output::render_error(cli.format, &source.to_string()) {
                println!("{json}");
            } else {
                eprintln!("error: {source}");
            }
            ExitCode::from(u8::try_from(source.exit_code()).unwrap_or(1))
        }
    }
}
