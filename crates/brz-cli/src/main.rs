//! `brz` binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use brz_cli::Cli;

fn main() -> ExitCode {
    // Logs go to stderr; stdout carries only results.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), brz_cli::CliError> {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                debug!("interrupted, cancelling");
                on_interrupt.cancel();
            }
            Err(e) => warn!(error = %e, "can't listen for Ctrl-C"),
        }
    });

    let mut stdout = io::stdout().lock();
    let result = brz_cli::app::run(&cli, &mut stdout, cancel).await;
    interrupt.abort();
    result
}
