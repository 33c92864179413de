use std::{cell::RefCell, collections::HashMap, rc::Rc};

use mlua::prelude::*;
use tracing::debug;

use crate::{
    bundle::{Hierarchy, ModuleRegistry, SourceModule},
    util::TableBuilder,
};

mod error;
mod globals;
mod path;
mod shim;

pub use self::{
    error::{RequireError, RequireResult},
    globals::HostGlobals,
    path::RequirePath,
    shim::create_script_mock,
};

/**
    The state of a single module in the execution cache.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleStatus {
    Unresolved,
    Resolving,
    Cached,
    Failed,
}

#[derive(Debug)]
enum CacheEntry {
    Resolving,
    Cached(LuaRegistryKey),
    Failed(RequireError),
}

#[derive(Debug)]
struct LoaderState {
    registry: ModuleRegistry,
    hierarchy: Hierarchy,
    globals: HostGlobals,
    cache: RefCell<HashMap<String, CacheEntry>>,
}

impl LoaderState {
    fn resolve<'lua>(
        self: &Rc<Self>,
        lua: &'lua Lua,
        path: &RequirePath,
    ) -> RequireResult<LuaValue<'lua>> {
        let normalized = path.normalize();
        let module = self
            .registry
            .lookup(normalized)
            .ok_or_else(|| RequireError::ModuleNotFound(normalized.to_string()))?;
        let canonical = module.path();

        // NOTE: The borrow must be released before executing the module,
        // module code will call back into resolve for its own requires
        {
            let mut cache = self.cache.borrow_mut();
            match cache.get(canonical) {
                Some(CacheEntry::Cached(key)) => return Ok(lua.registry_value(key)?),
                Some(CacheEntry::Failed(err)) => return Err(err.clone()),
                Some(CacheEntry::Resolving) => {
                    return Err(RequireError::CyclicRequire(canonical.to_string()))
                }
                None => {
                    cache.insert(canonical.to_string(), CacheEntry::Resolving);
                }
            }
        }

        debug!(path = canonical, "executing module");
        let result = self.execute(lua, module);

        let entry = match &result {
            Ok(value) => CacheEntry::Cached(lua.create_registry_value(value.clone())?),
            Err(err) => CacheEntry::Failed(err.clone()),
        };
        self.cache.borrow_mut().insert(canonical.to_string(), entry);

        result
    }

    fn execute<'lua>(
        self: &Rc<Self>,
        lua: &'lua Lua,
        module: &SourceModule,
    ) -> RequireResult<LuaValue<'lua>> {
        let env = self.create_environment(lua)?;
        let chunk = lua
            .load(module.source())
            .set_name(format!("@{}", module.path()))
            .set_environment(env)
            .into_function()
            .map_err(|cause| RequireError::Compile {
                path: module.path().to_string(),
                cause,
            })?;
        chunk
            .call::<_, LuaValue>(())
            .map_err(|cause| RequireError::Execution {
                path: module.path().to_string(),
                cause,
            })
    }

    fn create_environment<'lua>(self: &Rc<Self>, lua: &'lua Lua) -> LuaResult<LuaTable<'lua>> {
        let globals = lua.globals();
        let allowed = self
            .globals
            .names()
            .map(|name| Ok((name, globals.raw_get::<_, LuaValue>(name)?)))
            .collect::<LuaResult<Vec<_>>>()?;
        TableBuilder::new(lua)?
            .with_values(allowed)?
            .with_value("script", create_script_mock(lua, &self.hierarchy)?)?
            .with_value("require", self.create_require_function(lua)?)?
            .with_fallback(globals)?
            .build()
    }

    fn create_require_function<'lua>(self: &Rc<Self>, lua: &'lua Lua) -> LuaResult<LuaFunction<'lua>> {
        let state = Rc::clone(self);
        lua.create_function(move |lua, value: LuaValue| {
            let path = RequirePath::from_value(&value)?;
            Ok(state.resolve(lua, &path)?)
        })
    }
}

/**
    Resolves and executes bundled modules inside a Luau VM.

    A loader owns the registry of module sources and the cache of module
    results for a single execution, every module body runs at most once
    no matter how many times, or through which keys, it is required.
*/
#[derive(Debug, Clone)]
pub struct Loader {
    state: Rc<LoaderState>,
}

impl Loader {
    pub fn new(registry: ModuleRegistry, hierarchy: Hierarchy, globals: HostGlobals) -> Self {
        Self {
            state: Rc::new(LoaderState {
                registry,
                hierarchy,
                globals,
                cache: RefCell::new(HashMap::new()),
            }),
        }
    }

    /**
        Resolves a module, executing it if it has not been executed yet.
    */
    pub fn resolve<'lua>(
        &self,
        lua: &'lua Lua,
        path: impl Into<RequirePath>,
    ) -> RequireResult<LuaValue<'lua>> {
        self.state.resolve(lua, &path.into())
    }

    /**
        Creates a `require` function bound to this loader,
        sharing the same cache as every other bound function.
    */
    pub fn create_require_function<'lua>(&self, lua: &'lua Lua) -> LuaResult<LuaFunction<'lua>> {
        self.state.create_require_function(lua)
    }

    /**
        Returns the cache status of the module with the given key.

        Any key the module is registered under gives the same status.
    */
    pub fn status(&self, key: &str) -> ModuleStatus {
        let Some(module) = self.state.registry.lookup(key) else {
            return ModuleStatus::Unresolved;
        };
        match self.state.cache.borrow().get(module.path()) {
            None => ModuleStatus::Unresolved,
            Some(CacheEntry::Resolving) => ModuleStatus::Resolving,
            Some(CacheEntry::Cached(_)) => ModuleStatus::Cached,
            Some(CacheEntry::Failed(_)) => ModuleStatus::Failed,
        }
    }
}
