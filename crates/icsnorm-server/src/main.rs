//! icsnorm binary.

use std::process::ExitCode;

use clap::Parser;
use icsnorm_core::init_tracing;
use icsnorm_server::cli::{Cli, run};

#[tokio::main]
async fn main() -> ExitCode {
    // .env values feed clap's env fallbacks
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let tracing = match cli.tracing_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_tracing(tracing) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
