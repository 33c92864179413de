use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use tokio::task;

use lune_bundle::{Bundle, Manifest};

// Build a single-file artifact from a bundle manifest
#[derive(Debug, Clone, Parser)]
pub struct BuildCommand {
    /// The path to the manifest, or to a
    /// directory containing a `bundle.toml`
    #[clap(default_value = ".")]
    pub manifest: PathBuf,

    /// The path to the output file - defaults
    /// to the output set in the manifest
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Leave out the progress prints of the artifact
    #[clap(short, long)]
    pub quiet: bool,
}

impl Default for BuildCommand {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("."),
            output: None,
            quiet: false,
        }
    }
}

impl BuildCommand {
    pub async fn run(self) -> Result<ExitCode> {
        let mut manifest = Manifest::read(&self.manifest).context("failed to read manifest")?;
        if self.quiet {
            manifest.bundle.verbose = false;
        }

        println!(
            "{} {} v{}",
            style("Bundle").green().bold(),
            style(&manifest.bundle.name).bold(),
            manifest.bundle.version
        );

        let bundle = Bundle::from_manifest(&manifest).context("failed to collect modules")?;
        for module in bundle.registry().modules() {
            println!("   {} {}", style("Loaded").blue().bold(), module.path());
        }
        for skipped in bundle.registry().skipped() {
            println!(
                "  {} {} {}",
                style("Skipped").yellow().bold(),
                skipped.path(),
                style(format!("({})", skipped.reason())).dim()
            );
        }

        let output_path = self.output.unwrap_or_else(|| manifest.output_path());
        println!(
            "    {} artifact to {}",
            style("Write").blue().bold(),
            style(output_path.display()).underlined()
        );

        let module_count = bundle.registry().len();
        let size = task::spawn_blocking(move || bundle.write_to(output_path))
            .await?
            .context("failed to write artifact")?;

        #[allow(clippy::cast_precision_loss)]
        let size_kb = size as f64 / 1024.0;
        println!(
            "\nBuilt {module_count} modules ({})",
            style(format!("{size_kb:.1} KB")).bold()
        );

        Ok(ExitCode::SUCCESS)
    }
}
