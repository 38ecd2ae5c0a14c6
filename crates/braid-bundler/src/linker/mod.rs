//! Graph linking.
//!
//! The linker turns a compiled module graph into one self-contained
//! script. Every module becomes a factory function keyed by its id in
//! a registry object; a small runtime drives instantiation through a
//! cache so each factory runs once, lazily, which is what lets plain
//! import cycles work. Production builds are minified as a whole after
//! assembly.

mod exports;
mod rewrite;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_minifier::{CompressOptions, MangleOptions, Minifier, MinifierOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use braid_config::BuildConfig;
use braid_graph::{Module, ModuleGraph, ModuleId};

use crate::error::{BuildError, Result};
use crate::scanner::{self, LinkScan};

use self::rewrite::js_string;

/// Parameter names every factory is called with.
pub(crate) const EXPORTS_PARAM: &str = "__braid_exports__";
pub(crate) const REQUIRE_FN: &str = "__braid_require__";

/// JavaScript helpers shared by every bundle.
const RUNTIME: &str = include_str!("../../assets/runtime.js");

pub struct Linker<'a> {
    config: &'a BuildConfig,
}

impl<'a> Linker<'a> {
    pub fn new(config: &'a BuildConfig) -> Self {
        Self { config }
    }

    /// Link the compiled graph into a single executable bundle.
    pub fn link(&self, graph: &ModuleGraph) -> Result<String> {
        for cycle in graph.find_cycles() {
            debug!(cycle = %cycle.format(), "import cycle, modules bind lazily");
        }

        let mut scans: FxHashMap<ModuleId, LinkScan> = FxHashMap::default();
        for module in graph.modules() {
            if module.is_binary() {
                continue;
            }
            let compiled = module.compiled().ok_or_else(|| missing_state(module, "compilation result"))?;
            scans.insert(
                module.id.clone(),
                scanner::scan_for_linking(&module.path, compiled)?,
            );
        }

        let export_maps = exports::compute_export_maps(graph, &scans)?;

        let mut registry = String::new();
        for id in &graph.execution_order() {
            let Some(module) = graph.get(id) else {
                continue;
            };
            let body = if module.is_binary() {
                wasm_factory(module)
            } else {
                let scan = scans
                    .get(id)
                    .ok_or_else(|| missing_state(module, "link scan"))?;
                let map = export_maps
                    .get(id)
                    .ok_or_else(|| missing_state(module, "export map"))?;
                rewrite::factory_body(module, scan, map)?
            };
            trace!(module = %id, "factory emitted");

            if self.config.mode.debug_info() {
                registry.push_str(&format!("// {id}\n"));
            }
            registry.push_str(&js_string(id.as_str()));
            registry.push_str(&format!(": function ({EXPORTS_PARAM}, {REQUIRE_FN}) {{\n"));
            registry.push_str(&body);
            if !body.ends_with('\n') {
                registry.push('\n');
            }
            registry.push_str("},\n");
        }

        let bundle = format!(
            "(function () {{\n\"use strict\";\n{RUNTIME}var __braid_modules__ = {{\n{registry}}};\n{REQUIRE_FN}({});\n}})();\n",
            js_string(graph.entry().as_str())
        );

        if self.config.mode.minify() {
            let minified = self.minify(&bundle)?;
            debug!(
                raw = bundle.len(),
                minified = minified.len(),
                "bundle minified"
            );
            Ok(minified)
        } else {
            debug!(size = bundle.len(), "bundle assembled");
            Ok(bundle)
        }
    }

    /// Minify the assembled bundle as one script.
    ///
    /// The IIFE wrapper keeps every module-level name function-scoped,
    /// so mangling is safe across the whole output.
    fn minify(&self, bundle: &str) -> Result<String> {
        let allocator = Allocator::default();
        let parsed = Parser::new(&allocator, bundle, SourceType::cjs()).parse();
        if !parsed.errors.is_empty() {
            return Err(BuildError::Compile {
                path: std::path::PathBuf::from(&self.config.out_file),
                diagnostic: format!(
                    "the assembled bundle did not parse: {}",
                    parsed
                        .errors
                        .iter()
                        .map(|error| error.to_string())
                        .collect::<Vec<_>>()
                        .join("\n")
                ),
            });
        }
        let mut program = parsed.program;

        let options = MinifierOptions {
            mangle: Some(MangleOptions::default()),
            compress: Some(CompressOptions::default()),
        };
        let minified = Minifier::new(options).minify(&allocator, &mut program);

        Ok(Codegen::new()
            .with_options(CodegenOptions {
                minify: true,
                ..CodegenOptions::default()
            })
            .with_scoping(minified.scoping)
            .build(&program)
            .code)
    }
}

/// Factory for a WebAssembly module: decode, instantiate synchronously
/// with an empty import object and copy the instance exports.
fn wasm_factory(module: &Module) -> String {
    let encoded = BASE64.encode(module.bytes().unwrap_or_default());
    format!(
        "var __braid_instance__ = __braid_instantiate__({});\nfor (var __braid_key__ in __braid_instance__.exports) {EXPORTS_PARAM}[__braid_key__] = __braid_instance__.exports[__braid_key__];\n",
        js_string(&encoded)
    )
}

fn missing_state(module: &Module, what: &str) -> BuildError {
    BuildError::Compile {
        path: module.path.clone(),
        diagnostic: format!("module reached the linker without a {what}"),
    }
}

pub(crate) fn target_of<'g>(module: &'g Module, source: &str) -> Result<&'g ModuleId> {
    module
        .resolve_import(source)
        .ok_or_else(|| BuildError::Resolve {
            specifier: source.to_string(),
            importer: module.path.clone(),
            hint: "The import appeared after compilation but was never resolved. A transform most likely injected it.".to_string(),
        })
}
