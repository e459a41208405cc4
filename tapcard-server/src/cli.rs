use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "tapcard", version, about = "NFC AI networking card backend")]
pub struct Cli {
    /// TOML config file. Missing files are ignored.
    #[arg(short, long, global = true, env = "TAPCARD_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Check store, generation service, template and vCard, then exit.
    Preflight,
}

impl Cli {
    #[must_use]
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }
}
