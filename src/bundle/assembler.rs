use crate::{manifest::BundleInfo, runtime::HostGlobals};

use super::{
    delimiter::{quote_string, EmbeddedText, LongBracket},
    hierarchy::Hierarchy,
    registry::{ModuleRegistry, SourceModule},
};

const RUNTIME_SOURCE: &str = include_str!("runtime.luau");

/**
    Writes the single-file artifact for a bundle.

    The layout is, in order: the usage header, bundle metadata, module
    storage, the hierarchy and allow-list tables, the loader runtime,
    every module with its lookup keys, and finally the bootstrap that
    requires the entry module and returns its result.
*/
pub struct Assembler<'a> {
    info: &'a BundleInfo,
    globals: &'a HostGlobals,
    hierarchy: &'a Hierarchy,
    out: String,
}

impl<'a> Assembler<'a> {
    pub fn new(info: &'a BundleInfo, globals: &'a HostGlobals, hierarchy: &'a Hierarchy) -> Self {
        Self {
            info,
            globals,
            hierarchy,
            out: String::new(),
        }
    }

    pub fn assemble(mut self, registry: &ModuleRegistry) -> String {
        self.write_header(registry);
        self.write_storage();
        self.write_runtime();
        self.line("");
        if self.info.verbose {
            self.line("print(\"Loading \" .. Bundle.name .. \"...\")");
            self.line("");
        }
        for module in registry.modules() {
            self.write_module(module);
        }
        self.write_bootstrap();
        self.out
    }

    fn line(&mut self, line: impl AsRef<str>) {
        self.out.push_str(line.as_ref());
        self.out.push('\n');
    }

    fn write_header(&mut self, registry: &ModuleRegistry) {
        let mut header = vec![
            format!("    {} - Bundled", self.info.name),
            format!(
                "    Auto-generated single-file build of {} modules, do not edit by hand",
                registry.len()
            ),
        ];
        if let Some(url) = &self.info.url {
            header.push(String::new());
            header.push("    Usage:".to_string());
            header.push(format!(
                "    local {} = loadstring(game:HttpGet({}))()",
                usage_identifier(&self.info.name),
                quote_string(url)
            ));
        }
        let header = header.join("\n");
        let bracket = LongBracket::select(&header);
        self.line(format!("--{}", bracket.open()));
        self.line(header);
        self.line(bracket.close());
        self.line("");
    }

    fn write_storage(&mut self) {
        self.line("local Bundle = {");
        self.line(format!("\tname = {},", quote_string(&self.info.name)));
        self.line(format!("\tversion = {},", quote_string(&self.info.version)));
        self.line(format!("\tentry = {},", quote_string(&self.info.entry)));
        self.line(format!("\tverbose = {},", self.info.verbose));
        self.line("}");
        self.line("");

        self.line("-- Module storage and cache");
        self.line("local Modules = {}");
        self.line("local Cache = {}");
        self.line("");

        let globals = self
            .globals
            .names()
            .map(quote_string)
            .collect::<Vec<_>>()
            .join(", ");
        self.line("-- Host globals copied into every module environment");
        self.line(format!("local HostGlobals = {{ {globals} }}"));
        self.line("");

        let hierarchy = self.hierarchy;
        self.line("-- Folders of the emulated module hierarchy");
        self.line("local Hierarchy = {");
        match hierarchy.siblings() {
            Some(siblings) => self.line(format!("\tsiblings = {},", quote_string(siblings.name()))),
            None => self.line("\tsiblings = nil,"),
        }
        self.line("\tcategories = {");
        for category in hierarchy.categories() {
            self.line("\t\t{");
            self.line(format!("\t\t\tname = {},", quote_string(category.name())));
            self.line("\t\t\tmodules = {");
            for node in category.nodes() {
                self.line(format!(
                    "\t\t\t\t[{}] = {},",
                    quote_string(node.name()),
                    quote_string(node.canonical_path())
                ));
            }
            self.line("\t\t\t},");
            self.line("\t\t},");
        }
        self.line("\t},");
        self.line("}");
        self.line("");
    }

    fn write_runtime(&mut self) {
        self.out.push_str(RUNTIME_SOURCE);
        if !RUNTIME_SOURCE.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn write_module(&mut self, module: &SourceModule) {
        let path = quote_string(module.path());
        self.line(format!("-- Module: {}", module.path().replace('\n', " ")));
        self.line(format!(
            "Modules[{path}] = {{ path = {path}, source = {} }}",
            EmbeddedText::encode(module.source())
        ));
        for key in module.keys().into_iter().skip(1) {
            self.line(format!("Modules[{}] = Modules[{path}]", quote_string(key)));
        }
        self.line("");
    }

    fn write_bootstrap(&mut self) {
        if self.info.verbose {
            self.line("print(\"All modules loaded\")");
            self.line("");
        }
        self.line("-- Set up require and execute the entry module");
        self.line("local require = createRequire()");
        self.line("local result = require(Bundle.entry)");
        self.line("");
        if self.info.verbose {
            self.line("print(Bundle.name .. \" ready!\")");
            self.line(
                "print(\"Version:\", type(result) == \"table\" and result.Version or Bundle.version)",
            );
            self.line("");
        }
        self.line("return result");
    }
}

/**
    Turns a bundle name into something usable as a local variable name.
*/
fn usage_identifier(name: &str) -> String {
    let ident = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect::<String>();
    match ident.chars().next() {
        Some(c) if !c.is_ascii_digit() => ident,
        _ => "Bundle".to_string(),
    }
}
