use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub(crate) mod build;
pub(crate) mod run;

pub use self::{build::BuildCommand, run::RunCommand};

#[derive(Debug, Clone, Subcommand)]
pub enum CliSubcommand {
    Build(BuildCommand),
    Run(RunCommand),
}

impl Default for CliSubcommand {
    fn default() -> Self {
        Self::Build(BuildCommand::default())
    }
}

/// Bundles a multi-file Luau library into a single self-contained script
#[derive(Parser, Debug, Default, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[clap(subcommand)]
    subcommand: Option<CliSubcommand>,
}

impl Cli {
    pub async fn run(self) -> Result<ExitCode> {
        match self.subcommand.unwrap_or_default() {
            CliSubcommand::Build(cmd) => cmd.run().await,
            CliSubcommand::Run(cmd) => cmd.run().await,
        }
    }
}
