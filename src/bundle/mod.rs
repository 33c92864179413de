use std::{fs, path::Path};

use tracing::{debug, warn};

use crate::{
    error::{BuildError, BuildResult},
    manifest::{BundleInfo, Manifest},
    runtime::{HostGlobals, Loader},
};

mod assembler;
mod delimiter;
mod hierarchy;
mod registry;

pub use self::{
    assembler::Assembler,
    delimiter::{quote_string, EmbeddedText, LongBracket},
    hierarchy::{Category, Hierarchy, HierarchyLayout, HierarchyNode},
    registry::{
        normalize_module_path, strip_source_ext, DirectoryReader, ModuleRegistry, SkippedModule,
        SourceModule, SourceReader,
    },
};

/**
    A set of modules read from disk, ready to be assembled
    into an artifact or loaded directly into a Luau VM.
*/
#[derive(Debug, Clone)]
pub struct Bundle {
    info: BundleInfo,
    globals: HostGlobals,
    registry: ModuleRegistry,
    hierarchy: Hierarchy,
}

impl Bundle {
    /**
        Reads all of the modules listed in the manifest from its source directory.
    */
    pub fn from_manifest(manifest: &Manifest) -> BuildResult<Self> {
        let reader = DirectoryReader::new(manifest.source_dir());
        Self::collect(manifest, &reader)
    }

    /**
        Reads all of the modules listed in the manifest using the given reader.

        Modules that can not be read are skipped, the caller can
        inspect them using [`ModuleRegistry::skipped`] afterwards.
    */
    pub fn collect(manifest: &Manifest, reader: &impl SourceReader) -> BuildResult<Self> {
        let registry = ModuleRegistry::collect(&manifest.modules, reader)?;
        if registry.lookup(&manifest.bundle.entry).is_none() {
            warn!(
                "entry module '{}' is not part of the bundle, the artifact will fail to load",
                manifest.bundle.entry
            );
        }
        let hierarchy = Hierarchy::from_registry(&manifest.hierarchy, &registry);
        Ok(Self {
            info: manifest.bundle.clone(),
            globals: manifest.globals.clone(),
            registry,
            hierarchy,
        })
    }

    pub fn info(&self) -> &BundleInfo {
        &self.info
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /**
        Assembles the full artifact source text.
    */
    pub fn assemble(&self) -> String {
        Assembler::new(&self.info, &self.globals, &self.hierarchy).assemble(&self.registry)
    }

    /**
        Creates a loader that runs the bundled modules directly,
        without going through an assembled artifact.
    */
    pub fn loader(&self) -> Loader {
        Loader::new(
            self.registry.clone(),
            self.hierarchy.clone(),
            self.globals.clone(),
        )
    }

    /**
        Assembles the artifact and writes it to the given path, returning its size.

        The artifact is first written to a temporary file next to
        the output and then moved into place, so a failed write
        never leaves a partial artifact behind.
    */
    pub fn write_to(&self, path: impl AsRef<Path>) -> BuildResult<usize> {
        let path = path.as_ref();
        let artifact = self.assemble();

        let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
        temp_name.push(".tmp");
        let temp_path = path.with_file_name(temp_name);

        let write = |target: &Path| {
            if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(target, &artifact)
        };
        write(&temp_path)
            .and_then(|()| fs::rename(&temp_path, path))
            .map_err(|source| {
                let _ = fs::remove_file(&temp_path);
                BuildError::Write {
                    path: path.to_path_buf(),
                    source,
                }
            })?;

        debug!(path = %path.display(), bytes = artifact.len(), "wrote artifact");
        Ok(artifact.len())
    }
}
