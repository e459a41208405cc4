use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tapcard_core::AppConfig;
use tapcard_server::cli::{Cli, Command};
use tapcard_server::{logging, preflight};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("Environment misconfigured")?;
    logging::init(&config.logging);

    match cli.command() {
        Command::Serve => {
            tapcard_server::serve(config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Preflight => {
            let passed = preflight::run(&config).await?;
            Ok(if passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
