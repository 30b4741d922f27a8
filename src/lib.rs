pub mod cli;
pub mod core;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Args;

pub fn run() -> ExitCode {
    let args = Args::parse();

    // Initialize structured logging
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,bedrock_lib=debug"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Bedrock launcher starting...");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Could not start the async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(cli::execute(args)) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{}", err);
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
