use mlua::prelude::*;

/**
    Small builder for Luau tables, used to assemble
    module environments and hierarchy nodes.

    Values are set with raw access, the fallback given to
    [`TableBuilder::with_fallback`] only applies to lookups
    of keys that were never set.
*/
pub struct TableBuilder<'lua> {
    lua: &'lua Lua,
    tab: LuaTable<'lua>,
}

impl<'lua> TableBuilder<'lua> {
    pub fn new(lua: &'lua Lua) -> LuaResult<Self> {
        let tab = lua.create_table()?;
        Ok(Self { lua, tab })
    }

    pub fn with_value<K, V>(self, key: K, value: V) -> LuaResult<Self>
    where
        K: IntoLua<'lua>,
        V: IntoLua<'lua>,
    {
        self.tab.raw_set(key, value)?;
        Ok(self)
    }

    pub fn with_values<I, K, V>(self, values: I) -> LuaResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: IntoLua<'lua>,
        V: IntoLua<'lua>,
    {
        for (key, value) in values {
            self.tab.raw_set(key, value)?;
        }
        Ok(self)
    }

    /**
        Sets the `__index` fallback of the table, either another
        table to read missing keys from or a function to call.

        The metatable itself is frozen so module code can't swap it out.
    */
    pub fn with_fallback<V>(self, fallback: V) -> LuaResult<Self>
    where
        V: IntoLua<'lua>,
    {
        let meta = self.lua.create_table()?;
        meta.raw_set("__index", fallback)?;
        meta.set_readonly(true);
        self.tab.set_metatable(Some(meta));
        Ok(self)
    }

    pub fn build(self) -> LuaResult<LuaTable<'lua>> {
        Ok(self.tab)
    }
}
