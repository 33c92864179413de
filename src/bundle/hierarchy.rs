use std::collections::BTreeMap;

use serde::Deserialize;

use super::registry::{ModuleRegistry, SourceModule};

/**
    Which source directories become folders in the
    emulated hierarchy, and which folder holds siblings.
*/
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HierarchyLayout {
    /// Folder name in the hierarchy -> source directory it holds
    pub categories: BTreeMap<String, String>,
    /// Folder whose modules are also reachable as direct siblings
    pub siblings: Option<String>,
}

impl Default for HierarchyLayout {
    fn default() -> Self {
        Self {
            categories: BTreeMap::from([
                ("lib".to_string(), "lib".to_string()),
                ("components".to_string(), "components".to_string()),
            ]),
            siblings: Some("components".to_string()),
        }
    }
}

/**
    A synthetic module reference in the emulated hierarchy.

    Any field other than `Name` and `RequirePath` falls back
    to the canonical path of the module the node refers to.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyNode {
    name: String,
    canonical_path: String,
}

impl HierarchyNode {
    pub fn new(name: impl Into<String>, canonical_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            canonical_path: canonical_path.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn canonical_path(&self) -> &str {
        &self.canonical_path
    }

    pub fn field(&self, key: &str) -> &str {
        match key {
            "Name" => &self.name,
            "RequirePath" => &self.canonical_path,
            _ => self.resolve_default(),
        }
    }

    fn resolve_default(&self) -> &str {
        &self.canonical_path
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    nodes: BTreeMap<String, HierarchyNode>,
}

impl Category {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> impl Iterator<Item = &HierarchyNode> {
        self.nodes.values()
    }

    pub fn get(&self, name: &str) -> Option<&HierarchyNode> {
        self.nodes.get(name)
    }
}

/**
    The emulated tree of modules, as seen from a module's `script` value.

    ```text
    script
    └── Parent                  (siblings are reachable here)
        └── Parent              (the root, one folder per category)
            ├── lib
            │   └── util        -> lib/util
            └── components
                └── button      -> components/button
    ```
*/
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
    categories: Vec<Category>,
    siblings: Option<String>,
}

impl Hierarchy {
    pub fn from_registry(layout: &HierarchyLayout, registry: &ModuleRegistry) -> Self {
        let categories = layout
            .categories
            .iter()
            .map(|(name, directory)| {
                let directory = directory.trim_matches('/');
                let nodes = registry
                    .modules()
                    .iter()
                    .filter(|module| parent_directory(module) == directory)
                    .map(|module| {
                        let node = HierarchyNode::new(module.base_name(), module.stem());
                        (module.base_name().to_string(), node)
                    })
                    .collect();
                Category {
                    name: name.clone(),
                    nodes,
                }
            })
            .collect();
        Self {
            categories,
            siblings: layout.siblings.clone(),
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn siblings(&self) -> Option<&Category> {
        self.siblings.as_deref().and_then(|name| self.category(name))
    }
}

fn parent_directory(module: &SourceModule) -> &str {
    module
        .path()
        .rsplit_once('/')
        .map_or("", |(directory, _)| directory)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn hierarchy(paths: &[&str]) -> Hierarchy {
        let reader = paths
            .iter()
            .map(|path| (path.to_string(), String::from("return nil")))
            .collect::<HashMap<_, _>>();
        let registry = ModuleRegistry::collect(paths.iter().copied(), &reader).unwrap();
        Hierarchy::from_registry(&HierarchyLayout::default(), &registry)
    }

    #[test]
    fn nodes_fall_back_to_their_path() {
        let node = HierarchyNode::new("util", "lib/util");
        assert_eq!(node.field("Name"), "util");
        assert_eq!(node.field("RequirePath"), "lib/util");
        assert_eq!(node.field("Value"), "lib/util");
        assert_eq!(node.field("anything at all"), "lib/util");
    }

    #[test]
    fn groups_modules_by_directory() {
        let tree = hierarchy(&[
            "lib/util.lua",
            "lib/theme.lua",
            "init.lua",
            "components/button.lua",
            "components/nested/deep.lua",
        ]);
        let lib = tree.category("lib").unwrap();
        let names = lib.nodes().map(HierarchyNode::name).collect::<Vec<_>>();
        assert_eq!(names, vec!["theme", "util"]);
        let components = tree.category("components").unwrap();
        assert_eq!(components.nodes().count(), 1);
        assert!(tree
            .categories()
            .iter()
            .all(|category| category.get("init").is_none()));
    }

    #[test]
    fn siblings_come_from_the_configured_category() {
        let tree = hierarchy(&["lib/util.lua", "components/button.lua"]);
        let siblings = tree.siblings().unwrap();
        assert_eq!(siblings.name(), "components");
        assert_eq!(
            siblings.get("button"),
            tree.category("components").unwrap().get("button")
        );
        assert!(siblings.get("util").is_none());

        let layout = HierarchyLayout {
            siblings: None,
            ..HierarchyLayout::default()
        };
        let registry = ModuleRegistry::collect(["lib/util.lua"], &HashMap::from([(
            "lib/util.lua".to_string(),
            String::new(),
        )]))
        .unwrap();
        assert!(Hierarchy::from_registry(&layout, &registry).siblings().is_none());
    }
}
