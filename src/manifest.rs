use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{
    bundle::HierarchyLayout,
    error::{BuildError, BuildResult},
    runtime::HostGlobals,
};

pub const MANIFEST_FILE_NAME: &str = "bundle.toml";

/**
    Metadata for the bundle itself, the `[bundle]` table of a manifest.
*/
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BundleInfo {
    pub name: String,
    pub version: String,
    pub entry: String,
    pub source: PathBuf,
    pub output: PathBuf,
    pub url: Option<String>,
    pub verbose: bool,
}

impl Default for BundleInfo {
    fn default() -> Self {
        Self {
            name: "Bundle".to_string(),
            version: "Unknown".to_string(),
            entry: "init".to_string(),
            source: PathBuf::from("."),
            output: PathBuf::from("Bundle_Built.lua"),
            url: None,
            verbose: true,
        }
    }
}

/**
    A parsed `bundle.toml` manifest.

    ```toml
    modules = ["lib/util.lua", "init.lua", "components/button.lua"]

    [bundle]
    name = "Fiend"
    entry = "init"
    ```
*/
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub bundle: BundleInfo,
    pub modules: Vec<String>,
    #[serde(default)]
    pub globals: HostGlobals,
    #[serde(default)]
    pub hierarchy: HierarchyLayout,
    #[serde(skip)]
    root: PathBuf,
}

impl Manifest {
    pub fn from_toml_str(contents: &str) -> BuildResult<Self> {
        let manifest: Self = toml::from_str(contents)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /**
        Reads a manifest from disk. Accepts either the path to the
        manifest file itself or a directory containing `bundle.toml`.

        Relative source and output paths are resolved against
        the directory the manifest file is located in.
    */
    pub fn read(path: impl AsRef<Path>) -> BuildResult<Self> {
        let mut path = path.as_ref().to_path_buf();
        if path.is_dir() {
            path = path.join(MANIFEST_FILE_NAME);
        }
        let contents = fs::read_to_string(&path).map_err(|source| BuildError::ManifestRead {
            path: path.clone(),
            source,
        })?;
        let mut manifest = Self::from_toml_str(&contents)?;
        manifest.root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(manifest)
    }

    fn validate(&self) -> BuildResult<()> {
        if self.modules.is_empty() {
            return Err(BuildError::ManifestInvalid(
                "at least one module must be listed in 'modules'".to_string(),
            ));
        }
        if self.bundle.entry.trim().is_empty() {
            return Err(BuildError::ManifestInvalid(
                "'bundle.entry' must not be empty".to_string(),
            ));
        }
        if let Some(siblings) = &self.hierarchy.siblings {
            if !self.hierarchy.categories.contains_key(siblings) {
                return Err(BuildError::ManifestInvalid(format!(
                    "sibling category '{siblings}' is not listed in 'hierarchy.categories'"
                )));
            }
        }
        Ok(())
    }

    /// Directory the module paths are relative to
    pub fn source_dir(&self) -> PathBuf {
        self.root.join(&self.bundle.source)
    }

    /// Path the artifact is written to
    pub fn output_path(&self) -> PathBuf {
        self.root.join(&self.bundle.output)
    }
}
