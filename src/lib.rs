mod error;
mod manifest;
mod util;

pub mod bundle;
pub mod runtime;

pub use crate::{
    bundle::Bundle,
    error::{BuildError, BuildResult},
    manifest::{BundleInfo, Manifest, MANIFEST_FILE_NAME},
    runtime::{HostGlobals, Loader, ModuleStatus, RequireError, RequirePath},
};
