use mlua::prelude::*;

use crate::bundle::{strip_source_ext, HierarchyNode};

use super::error::{RequireError, RequireResult};

/**
    An argument given to `require`.

    Module code may pass either a plain string path or one of the
    synthetic hierarchy nodes handed out through `script`, any
    other kind of value is rejected when converting from Luau.
    Nodes are always tables here, userdata is never accepted.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirePath {
    String(String),
    Node {
        name: String,
        canonical: Option<String>,
    },
}

impl RequirePath {
    pub fn from_value(value: &LuaValue) -> RequireResult<Self> {
        match value {
            LuaValue::Nil => Err(RequireError::MissingPath),
            LuaValue::String(s) => Ok(Self::String(s.to_str()?.to_string())),
            LuaValue::Table(t) => match string_field(t, "Name")? {
                Some(name) => Ok(Self::Node {
                    name,
                    canonical: string_field(t, "RequirePath")?,
                }),
                None => Err(RequireError::UnsupportedPathType("table".to_string())),
            },
            // Luau has a single number type, match what `type` would return
            LuaValue::Integer(_) | LuaValue::Number(_) => {
                Err(RequireError::UnsupportedPathType("number".to_string()))
            }
            other => Err(RequireError::UnsupportedPathType(
                other.type_name().to_string(),
            )),
        }
    }

    /**
        Reduces the argument to the key it will be looked up by.

        Nodes without an explicit canonical path are looked up by
        their name, with any trailing source extension removed.
    */
    pub fn normalize(&self) -> &str {
        match self {
            Self::String(path) => path,
            Self::Node {
                canonical: Some(canonical),
                ..
            } => canonical,
            Self::Node { name, .. } => strip_source_ext(name),
        }
    }
}

impl From<&str> for RequirePath {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for RequirePath {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&HierarchyNode> for RequirePath {
    fn from(value: &HierarchyNode) -> Self {
        Self::Node {
            name: value.name().to_string(),
            canonical: Some(value.canonical_path().to_string()),
        }
    }
}

fn string_field(table: &LuaTable, key: &str) -> LuaResult<Option<String>> {
    match table.raw_get::<_, LuaValue>(key)? {
        LuaValue::String(s) => Ok(Some(s.to_str()?.to_string())),
        _ => Ok(None),
    }
}
