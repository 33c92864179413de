use mlua::prelude::*;
use thiserror::Error;

/**
    Errors raised while resolving a module through `require`.

    Compile and execution errors keep the underlying Luau error around,
    so that a failure deep inside a chain of requires still shows
    every module it passed through on its way up.
*/
#[derive(Debug, Clone, Error)]
pub enum RequireError {
    #[error("require called with nil path")]
    MissingPath,
    #[error("require only supports string paths and module references, got: {0}")]
    UnsupportedPathType(String),
    #[error("module not found: '{0}'")]
    ModuleNotFound(String),
    #[error("cyclic require of module '{0}'")]
    CyclicRequire(String),
    #[error("failed to parse module '{path}': {cause}")]
    Compile { path: String, cause: LuaError },
    #[error("failed to execute module '{path}': {cause}")]
    Execution { path: String, cause: LuaError },
    #[error(transparent)]
    Lua(#[from] LuaError),
}

pub type RequireResult<T> = Result<T, RequireError>;

impl From<RequireError> for LuaError {
    fn from(value: RequireError) -> Self {
        LuaError::external(value)
    }
}
