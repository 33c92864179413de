use mlua::prelude::*;

use crate::{
    bundle::{Hierarchy, HierarchyNode},
    util::TableBuilder,
};

const PARENT: &str = "Parent";

/**
    Creates the `script` value given to a module, a fresh set of
    tables mirroring the emulated hierarchy on every call.
*/
pub fn create_script_mock<'lua>(lua: &'lua Lua, hierarchy: &Hierarchy) -> LuaResult<LuaTable<'lua>> {
    let sibling_name = hierarchy.siblings().map(|category| category.name());

    let mut root = TableBuilder::new(lua)?;
    let mut siblings = Vec::new();
    for category in hierarchy.categories() {
        let mut nodes = Vec::new();
        for node in category.nodes() {
            nodes.push((node.name(), create_node(lua, node)?));
        }
        if sibling_name == Some(category.name()) {
            siblings.extend(
                nodes
                    .iter()
                    .filter(|(name, _)| *name != PARENT)
                    .cloned(),
            );
        }
        let folder = TableBuilder::new(lua)?.with_values(nodes)?.build()?;
        root = root.with_value(category.name(), folder)?;
    }

    let parent = TableBuilder::new(lua)?
        .with_value(PARENT, root.build()?)?
        .with_values(siblings)?
        .build()?;

    TableBuilder::new(lua)?.with_value(PARENT, parent)?.build()
}

/**
    Creates a single node table, lookups of fields the table does
    not hold go through [`HierarchyNode::field`] on a copy of the node.
*/
fn create_node<'lua>(lua: &'lua Lua, node: &HierarchyNode) -> LuaResult<LuaTable<'lua>> {
    let resolver = node.clone();
    let fallback = lua.create_function(move |_, (_, key): (LuaTable, LuaValue)| {
        let key = match &key {
            LuaValue::String(s) => s.to_str()?.to_string(),
            _ => String::new(),
        };
        Ok(resolver.field(&key).to_string())
    })?;
    TableBuilder::new(lua)?
        .with_value("Name", node.name())?
        .with_value("RequirePath", node.canonical_path())?
        .with_fallback(fallback)?
        .build()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::bundle::{HierarchyLayout, ModuleRegistry};

    use super::*;

    fn script_mock(lua: &Lua) -> LuaResult<LuaTable<'_>> {
        let reader = HashMap::from([
            ("lib/util.lua".to_string(), String::new()),
            ("components/button.lua".to_string(), String::new()),
            ("components/toggle.lua".to_string(), String::new()),
        ]);
        let registry = ModuleRegistry::collect(
            ["lib/util.lua", "components/button.lua", "components/toggle.lua"],
            &reader,
        )
        .unwrap();
        let hierarchy = Hierarchy::from_registry(&HierarchyLayout::default(), &registry);
        create_script_mock(lua, &hierarchy)
    }

    #[test]
    fn nodes_are_reachable_from_ancestors_and_siblings() -> LuaResult<()> {
        let lua = Lua::new();
        lua.globals().set("script", script_mock(&lua)?)?;
        lua.load(
            r#"
            local util = script.Parent.Parent.lib.util
            assert(util.Name == "util")
            assert(util.RequirePath == "lib/util")

            local button = script.Parent.button
            assert(button == script.Parent.Parent.components.button)
            assert(button.RequirePath == "components/button")
            assert(script.Parent.toggle.Name == "toggle")
            assert(script.Parent.util == nil)
            "#,
        )
        .exec()
    }

    #[test]
    fn unknown_fields_fall_back_to_the_path() -> LuaResult<()> {
        let lua = Lua::new();
        lua.globals().set("script", script_mock(&lua)?)?;
        lua.load(
            r#"
            local util = script.Parent.Parent.lib.util
            assert(util.Value == "lib/util")
            assert(util.ClassName == "lib/util")
            assert(script.Parent.button.Source == "components/button")
            assert(util[1] == "lib/util")
            assert(util[true] == "lib/util")
            "#,
        )
        .exec()
    }

    #[test]
    fn every_call_creates_fresh_nodes() -> LuaResult<()> {
        let lua = Lua::new();
        let first = script_mock(&lua)?;
        let second = script_mock(&lua)?;
        assert!(first != second);
        Ok(())
    }
}
