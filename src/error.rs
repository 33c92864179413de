use std::{io, path::PathBuf};

use thiserror::Error;

/**
    Errors that abort a bundle build.

    Missing or unreadable source files are not errors - they are
    skipped with a warning and reported in the build summary instead.
*/
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("module key '{key}' is claimed by both '{existing}' and '{incoming}'")]
    KeyConflict {
        key: String,
        existing: String,
        incoming: String,
    },
    #[error("module path '{0}' has no file name")]
    InvalidModulePath(String),
    #[error("failed to read source file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write artifact '{path}'")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read manifest '{path}'")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse manifest - {0}")]
    ManifestParse(#[from] toml::de::Error),
    #[error("invalid manifest - {0}")]
    ManifestInvalid(String),
}

pub type BuildResult<T> = Result<T, BuildError>;
