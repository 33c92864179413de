use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use mlua::{Function as LuaFunction, Lua, Value as LuaValue};
use tokio::fs;

use lune_bundle::{Bundle, Manifest};

// Run a bundle, either from its sources or from a built artifact
#[derive(Debug, Clone, Parser)]
pub struct RunCommand {
    /// The path to a manifest, a directory containing
    /// a `bundle.toml`, or a previously built artifact
    #[clap(default_value = ".")]
    pub path: PathBuf,
}

impl RunCommand {
    pub async fn run(self) -> Result<ExitCode> {
        let lua = Lua::new();
        let is_manifest =
            self.path.is_dir() || self.path.extension().is_some_and(|ext| ext == "toml");

        let result = if is_manifest {
            let manifest = Manifest::read(&self.path).context("failed to read manifest")?;
            let bundle = Bundle::from_manifest(&manifest).context("failed to collect modules")?;
            println!(
                "{} {} from sources",
                style("Run").green().bold(),
                style(&manifest.bundle.name).bold()
            );
            bundle
                .loader()
                .resolve(&lua, manifest.bundle.entry.as_str())
                .with_context(|| format!("failed to run entry module '{}'", manifest.bundle.entry))?
        } else {
            let artifact = fs::read_to_string(&self.path)
                .await
                .context("failed to read artifact")?;
            println!(
                "{} artifact {}",
                style("Run").green().bold(),
                style(self.path.display()).underlined()
            );
            lua.load(&artifact)
                .set_name(format!("@{}", self.path.display()))
                .eval::<LuaValue>()
                .context("failed to run artifact")?
        };

        let tostring: LuaFunction = lua.globals().get("tostring")?;
        let described: String = tostring.call(result)?;
        println!("{} {described}", style("Result").blue().bold());

        Ok(ExitCode::SUCCESS)
    }
}
