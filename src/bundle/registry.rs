use std::{
    collections::{BTreeMap, HashMap},
    fs, io,
    path::{Path, PathBuf},
};

use path_clean::PathClean;
use tracing::{debug, warn};

use crate::error::{BuildError, BuildResult};

/**
    Strips a trailing `.lua` or `.luau` extension from a module path or name.
*/
pub fn strip_source_ext(path: &str) -> &str {
    path.strip_suffix(".luau")
        .or_else(|| path.strip_suffix(".lua"))
        .unwrap_or(path)
}

/**
    Normalizes a relative module path into its canonical form,
    resolving `.` and `..` segments and using forward slashes.
*/
pub fn normalize_module_path(path: &str) -> String {
    let cleaned = Path::new(&path.replace('\\', "/")).clean();
    cleaned
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/**
    A single source file that will be embedded into the bundle.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceModule {
    path: String,
    stem: String,
    base_name: String,
    source: String,
}

impl SourceModule {
    pub fn new(path: impl AsRef<str>, source: impl Into<String>) -> BuildResult<Self> {
        let path = normalize_module_path(path.as_ref());
        let stem = Path::new(&path)
            .with_extension("")
            .to_string_lossy()
            .to_string();
        let base_name = Path::new(&path)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .filter(|s| !s.is_empty() && !s.starts_with('.'))
            .ok_or_else(|| BuildError::InvalidModulePath(path.clone()))?;
        Ok(Self {
            path,
            stem,
            base_name,
            source: source.into(),
        })
    }

    /// The canonical path, `lib/util.lua`
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path without its extension, `lib/util`
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// The file name without its extension, `util`
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /**
        All of the distinct keys this module can be looked up by,
        starting with the canonical path.
    */
    pub fn keys(&self) -> Vec<&str> {
        let mut keys = vec![self.path.as_str()];
        for key in [self.stem.as_str(), self.base_name.as_str()] {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

/**
    Reads module sources by their relative path.

    Returns `Ok(None)` for a module that does not exist and
    [`BuildError::Read`] for one that exists but can't be read
    as text, the registry skips both rather than failing the build.
*/
pub trait SourceReader {
    fn read_source(&self, path: &str) -> BuildResult<Option<String>>;
}

/**
    Reads module sources from files below a base directory.
*/
#[derive(Debug, Clone)]
pub struct DirectoryReader {
    base: PathBuf,
}

impl DirectoryReader {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl SourceReader for DirectoryReader {
    fn read_source(&self, path: &str) -> BuildResult<Option<String>> {
        let full_path = self.base.join(path);
        match fs::read_to_string(&full_path) {
            Ok(source) => Ok(Some(source)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(BuildError::Read {
                path: full_path,
                source,
            }),
        }
    }
}

impl SourceReader for HashMap<String, String> {
    fn read_source(&self, path: &str) -> BuildResult<Option<String>> {
        Ok(self.get(path).cloned())
    }
}

impl SourceReader for BTreeMap<String, String> {
    fn read_source(&self, path: &str) -> BuildResult<Option<String>> {
        Ok(self.get(path).cloned())
    }
}

/**
    A listed module that was left out of the bundle.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedModule {
    path: String,
    reason: String,
}

impl SkippedModule {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/**
    Ordered collection of modules, addressable by any of their keys.
*/
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: Vec<SourceModule>,
    keys: HashMap<String, usize>,
    skipped: Vec<SkippedModule>,
}

impl ModuleRegistry {
    /**
        Reads every module in the given order, skipping any
        that do not exist or can't be read as text.
    */
    pub fn collect<I, S>(order: I, reader: &impl SourceReader) -> BuildResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::default();
        for path in order {
            let path = normalize_module_path(path.as_ref());
            let reason = match reader.read_source(&path) {
                Ok(Some(source)) => {
                    debug!(path = %path, bytes = source.len(), "read module");
                    registry.insert(SourceModule::new(&path, source)?)?;
                    continue;
                }
                Ok(None) => "not found".to_string(),
                Err(BuildError::Read { source, .. }) => source.to_string(),
                Err(err) => return Err(err),
            };
            warn!("skipping module '{path}' - {reason}");
            registry.skipped.push(SkippedModule { path, reason });
        }
        Ok(registry)
    }

    /**
        Registers a module under all of its keys.

        A key that already belongs to a different module is a conflict
        and leaves the registry untouched.
    */
    pub fn insert(&mut self, module: SourceModule) -> BuildResult<()> {
        for key in module.keys() {
            if let Some(&index) = self.keys.get(key) {
                let existing = &self.modules[index];
                return Err(BuildError::KeyConflict {
                    key: key.to_string(),
                    existing: existing.path().to_string(),
                    incoming: module.path().to_string(),
                });
            }
        }
        let index = self.modules.len();
        for key in module.keys() {
            self.keys.insert(key.to_string(), index);
        }
        self.modules.push(module);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&SourceModule> {
        self.keys.get(key).map(|&index| &self.modules[index])
    }

    /**
        Looks up a module by its exact key first, and then
        by the same key with any source extension removed.
    */
    pub fn lookup(&self, key: &str) -> Option<&SourceModule> {
        self.get(key).or_else(|| self.get(strip_source_ext(key)))
    }

    /// Modules in emission order
    pub fn modules(&self) -> &[SourceModule] {
        &self.modules
    }

    /// Modules that were listed but could not be read
    pub fn skipped(&self) -> &[SkippedModule] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn sources(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(path, source)| (path.to_string(), source.to_string()))
            .collect()
    }

    #[test]
    fn derives_three_keys() {
        let module = SourceModule::new("components/button.lua", "return {}").unwrap();
        assert_eq!(module.path(), "components/button.lua");
        assert_eq!(module.stem(), "components/button");
        assert_eq!(module.base_name(), "button");
        assert_eq!(
            module.keys(),
            vec!["components/button.lua", "components/button", "button"]
        );
    }

    #[test]
    fn top_level_keys_are_deduplicated() {
        let module = SourceModule::new("init.lua", "").unwrap();
        assert_eq!(module.keys(), vec!["init.lua", "init"]);
    }

    #[test]
    fn paths_are_normalized() {
        assert_eq!(normalize_module_path("./lib/../lib/util.lua"), "lib/util.lua");
        assert_eq!(normalize_module_path("lib\\util.luau"), "lib/util.luau");
        assert!(SourceModule::new("./", "").is_err());
    }

    #[test]
    fn every_key_resolves_to_the_same_module() {
        let reader = sources(&[("lib/util.lua", "return 1")]);
        let registry = ModuleRegistry::collect(["lib/util.lua"], &reader).unwrap();
        let by_path = registry.get("lib/util.lua").unwrap();
        for key in ["lib/util", "util"] {
            let module = registry.get(key).unwrap();
            assert!(std::ptr::eq(module, by_path));
            assert_eq!(module.source(), "return 1");
        }
    }

    #[test]
    fn lookup_falls_back_to_stripped_extension() {
        let reader = sources(&[("lib/util.lua", "return 1")]);
        let registry = ModuleRegistry::collect(["lib/util.lua"], &reader).unwrap();
        assert_eq!(registry.lookup("util.lua").unwrap().path(), "lib/util.lua");
        assert_eq!(registry.lookup("lib/util.luau").unwrap().path(), "lib/util.lua");
        assert!(registry.lookup("lib/other").is_none());
    }

    #[test]
    fn missing_sources_are_skipped() {
        let reader = sources(&[("a.lua", "return 'a'"), ("c.lua", "return 'c'")]);
        let registry = ModuleRegistry::collect(["a.lua", "b.lua", "c.lua"], &reader).unwrap();
        let paths = registry.modules().iter().map(SourceModule::path).collect::<Vec<_>>();
        assert_eq!(paths, vec!["a.lua", "c.lua"]);
        let skipped = registry.skipped();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].path(), "b.lua");
        assert_eq!(skipped[0].reason(), "not found");
    }

    #[test]
    fn shared_base_names_conflict() {
        let reader = sources(&[("lib/config.lua", ""), ("components/config.lua", "")]);
        let err = ModuleRegistry::collect(["lib/config.lua", "components/config.lua"], &reader)
            .unwrap_err();
        match err {
            BuildError::KeyConflict {
                key,
                existing,
                incoming,
            } => {
                assert_eq!(key, "config");
                assert_eq!(existing, "lib/config.lua");
                assert_eq!(incoming, "components/config.lua");
            }
            other => panic!("expected a key conflict, got {other:?}"),
        }
    }

    #[test]
    fn reads_from_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib/util.lua"), "return 'util'").unwrap();
        let reader = DirectoryReader::new(dir.path());
        assert_eq!(
            reader.read_source("lib/util.lua").unwrap().as_deref(),
            Some("return 'util'")
        );
        assert_eq!(reader.read_source("lib/missing.lua").unwrap(), None);
    }

    #[test]
    fn unreadable_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.lua"), "return 1").unwrap();
        fs::write(dir.path().join("b.lua"), [0xff, 0xfe, b'x']).unwrap();
        fs::create_dir_all(dir.path().join("c.lua")).unwrap();

        let reader = DirectoryReader::new(dir.path());
        assert!(matches!(
            reader.read_source("b.lua"),
            Err(BuildError::Read { .. })
        ));

        let registry = ModuleRegistry::collect(["a.lua", "b.lua", "c.lua"], &reader).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a").unwrap().source(), "return 1");
        let skipped = registry
            .skipped()
            .iter()
            .map(SkippedModule::path)
            .collect::<Vec<_>>();
        assert_eq!(skipped, vec!["b.lua", "c.lua"]);
        assert!(registry.skipped()[0].reason().contains("UTF-8"));
    }
}
