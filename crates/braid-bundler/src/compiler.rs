//! Compilation.
//!
//! Each text module is matched against the configured rules in order;
//! the first matching rule decides the loader. TypeScript sources are
//! lowered to plain JavaScript through the Oxc transformer, JavaScript
//! sources are syntax-checked and passed through unchanged. Modules no
//! rule matches pass through untouched.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_transformer::{JsxRuntime, TransformOptions, Transformer};
use tracing::{debug, trace};

use braid_config::{BuildConfig, Loader};
use braid_graph::{ModuleGraph, ModuleId, ModulePayload, SourceKind};

use crate::error::{BuildError, Result};
use crate::scanner::{compile_failure, source_type_for};

/// Compile every text module in the graph in place.
///
/// Binary modules bypass this stage when wasm support is enabled and
/// fail the build when it is not.
pub fn compile_graph(config: &BuildConfig, graph: &mut ModuleGraph) -> Result<()> {
    let ids: Vec<ModuleId> = graph.ids().cloned().collect();
    for id in ids {
        let Some(module) = graph.get_mut(&id) else {
            continue;
        };
        let output = match &module.payload {
            ModulePayload::Binary { .. } => {
                if !config.wasm {
                    return Err(BuildError::UnsupportedModule {
                        path: module.path.clone(),
                        hint: "WebAssembly support is disabled. Enable `wasm` in braid.toml or remove the import.".to_string(),
                    });
                }
                trace!(module = %id, "binary module bypasses compilation");
                None
            }
            ModulePayload::Text { kind, source, .. } => {
                Some(compile_text(config, &id, &module.path, *kind, source)?)
            }
        };
        if let Some(output) = output {
            module.set_compiled(output);
        }
    }
    debug!(modules = graph.len(), "compilation complete");
    Ok(())
}

fn compile_text(
    config: &BuildConfig,
    id: &ModuleId,
    path: &Path,
    kind: SourceKind,
    source: &str,
) -> Result<String> {
    let relative = Path::new(id.as_str());
    match config.rule_for(relative) {
        Some(rule) => {
            trace!(module = %id, loader = rule.loader.as_str(), "loader matched");
            match rule.loader {
                Loader::TypeScript => lower_typescript(path, kind, source),
                Loader::JavaScript => {
                    check_syntax(path, kind, source)?;
                    Ok(source.to_string())
                }
            }
        }
        None => {
            trace!(module = %id, "no rule matched, passing through");
            Ok(source.to_string())
        }
    }
}

/// Strip types and lower TS-only constructs, emitting plain JavaScript.
///
/// JSX is lowered with the classic runtime so no imports are injected
/// behind the resolver's back.
fn lower_typescript(path: &Path, kind: SourceKind, source: &str) -> Result<String> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, source_type_for(kind)).parse();
    if !parsed.errors.is_empty() {
        return Err(compile_failure(path, &parsed.errors));
    }
    let mut program = parsed.program;

    let scoping = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_scoping();

    let mut options = TransformOptions::default();
    options.jsx.runtime = JsxRuntime::Classic;
    let transformed =
        Transformer::new(&allocator, path, &options).build_with_scoping(scoping, &mut program);
    if !transformed.errors.is_empty() {
        return Err(compile_failure(path, &transformed.errors));
    }

    Ok(Codegen::new().build(&program).code)
}

fn check_syntax(path: &Path, kind: SourceKind, source: &str) -> Result<()> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, source_type_for(kind)).parse();
    if parsed.errors.is_empty() {
        Ok(())
    } else {
        Err(compile_failure(path, &parsed.errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use braid_graph::Module;

    fn single_module_graph(name: &str, kind: SourceKind, source: &str) -> ModuleGraph {
        let mut graph = ModuleGraph::new(ModuleId::from(name));
        graph.insert(Module::text(
            ModuleId::from(name),
            PathBuf::from(format!("/project/{name}")),
            kind,
            source.to_string(),
        ));
        graph
    }

    #[test]
    fn typescript_types_are_stripped() {
        let config = BuildConfig::for_mode(false);
        let mut graph = single_module_graph(
            "index.ts",
            SourceKind::TypeScript,
            "interface Point { x: number }\nexport const origin: Point = { x: 0 };\n",
        );
        compile_graph(&config, &mut graph).unwrap();

        let compiled = graph
            .get(&ModuleId::from("index.ts"))
            .unwrap()
            .compiled()
            .unwrap();
        assert!(compiled.contains("const origin = { x: 0 }"));
        assert!(!compiled.contains("interface"));
        assert!(!compiled.contains(": Point"));
    }

    #[test]
    fn enums_are_lowered_to_javascript() {
        let config = BuildConfig::for_mode(false);
        let mut graph = single_module_graph(
            "state.ts",
            SourceKind::TypeScript,
            "export enum Phase { Idle, Running }\n",
        );
        compile_graph(&config, &mut graph).unwrap();

        let compiled = graph
            .get(&ModuleId::from("state.ts"))
            .unwrap()
            .compiled()
            .unwrap();
        assert!(compiled.contains("Phase"));
        assert!(!compiled.contains("enum "));
    }

    #[test]
    fn syntax_error_reports_the_module_path() {
        let config = BuildConfig::for_mode(false);
        let mut graph =
            single_module_graph("broken.ts", SourceKind::TypeScript, "const = nothing here");
        let err = compile_graph(&config, &mut graph).unwrap_err();
        match err {
            BuildError::Compile { path, .. } => {
                assert!(path.ends_with("broken.ts"));
            }
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn unmatched_modules_pass_through() {
        let config = BuildConfig::for_mode(false);
        let source = "export const plain = true;\n";
        let mut graph = single_module_graph("legacy.js", SourceKind::JavaScript, source);
        compile_graph(&config, &mut graph).unwrap();

        let compiled = graph
            .get(&ModuleId::from("legacy.js"))
            .unwrap()
            .compiled()
            .unwrap();
        assert_eq!(compiled, source);
    }

    #[test]
    fn excluded_modules_skip_their_loader() {
        let config = BuildConfig::for_mode(false);
        let source = "export const untouched: any = 1;\n";
        let mut graph = single_module_graph(
            "node_modules/vendored/index.ts",
            SourceKind::TypeScript,
            source,
        );
        compile_graph(&config, &mut graph).unwrap();

        let compiled = graph
            .get(&ModuleId::from("node_modules/vendored/index.ts"))
            .unwrap()
            .compiled()
            .unwrap();
        assert_eq!(compiled, source);
    }

    #[test]
    fn wasm_disabled_fails_the_build() {
        let mut config = BuildConfig::for_mode(false);
        config.wasm = false;
        let mut graph = ModuleGraph::new(ModuleId::from("index.ts"));
        graph.insert(Module::text(
            ModuleId::from("index.ts"),
            PathBuf::from("/project/index.ts"),
            SourceKind::TypeScript,
            "import \"./lib.wasm\";\n".to_string(),
        ));
        graph.insert(Module::binary(
            ModuleId::from("lib.wasm"),
            PathBuf::from("/project/lib.wasm"),
            b"\0asm\x01\0\0\0".to_vec(),
        ));

        let err = compile_graph(&config, &mut graph).unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedModule { .. }));
    }

    #[test]
    fn wasm_enabled_bypasses_compilation() {
        let config = BuildConfig::for_mode(false);
        let mut graph = ModuleGraph::new(ModuleId::from("lib.wasm"));
        graph.insert(Module::binary(
            ModuleId::from("lib.wasm"),
            PathBuf::from("/project/lib.wasm"),
            b"\0asm\x01\0\0\0".to_vec(),
        ));

        compile_graph(&config, &mut graph).unwrap();
        let module = graph.get(&ModuleId::from("lib.wasm")).unwrap();
        assert!(module.is_binary());
        assert!(module.compiled().is_none());
    }
}
