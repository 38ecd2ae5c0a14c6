//! Export set computation.
//!
//! Before any module body is rewritten the linker works out, for every
//! module, which names it exports and where each value lives. Explicit
//! exports are read straight off the scan; `export *` needs the target
//! module's full set, so stars are expanded recursively. That
//! recursion is the one place an import cycle is fatal: a star
//! re-export inside a cycle has no computable export set.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use braid_graph::{ModuleGraph, ModuleId};

use super::target_of;
use crate::error::{BuildError, Result};
use crate::scanner::{LinkScan, LinkStatementKind};

/// Name the runtime gives a module's default export inside its factory.
pub(crate) const DEFAULT_BINDING: &str = "__braid_default__";

/// Where an exported name gets its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ExportBinding {
    /// An expression over bindings local to the module's factory scope.
    Local { expr: String },
    /// A single name re-exported from another module, bound lazily.
    Reexport { from: ModuleId, name: String },
    /// The whole exports object of another module.
    Namespace { from: ModuleId },
}

/// Exported name to value source, in deterministic definition order.
pub(crate) type ExportMap = IndexMap<String, ExportBinding>;

/// Compute the export map of every module in the graph.
pub(crate) fn compute_export_maps(
    graph: &ModuleGraph,
    scans: &FxHashMap<ModuleId, LinkScan>,
) -> Result<FxHashMap<ModuleId, ExportMap>> {
    let mut maps = FxHashMap::default();
    let mut stack = Vec::new();
    for id in graph.ids() {
        expand(graph, scans, id, &mut maps, &mut stack)?;
    }
    Ok(maps)
}

fn expand(
    graph: &ModuleGraph,
    scans: &FxHashMap<ModuleId, LinkScan>,
    id: &ModuleId,
    maps: &mut FxHashMap<ModuleId, ExportMap>,
    stack: &mut Vec<ModuleId>,
) -> Result<()> {
    if maps.contains_key(id) {
        return Ok(());
    }
    if let Some(position) = stack.iter().position(|entry| entry == id) {
        let mut cycle: Vec<String> = stack[position..]
            .iter()
            .map(ModuleId::to_string)
            .collect();
        cycle.push(id.to_string());
        return Err(BuildError::DependencyCycle {
            cycle: cycle.join(" -> "),
            hint: "A star re-export inside an import cycle has no computable export set. Replace `export *` with named re-exports.".to_string(),
        });
    }

    let Some(module) = graph.get(id) else {
        return Ok(());
    };
    // wasm export names are opaque until instantiation; the factory
    // copies them onto the exports object at runtime instead.
    if module.is_binary() {
        maps.insert(id.clone(), ExportMap::new());
        return Ok(());
    }
    let Some(scan) = scans.get(id) else {
        maps.insert(id.clone(), ExportMap::new());
        return Ok(());
    };

    stack.push(id.clone());

    let mut map = ExportMap::new();
    let mut stars = Vec::new();
    for statement in &scan.statements {
        match &statement.kind {
            LinkStatementKind::ExportDecl { names, .. } => {
                for name in names {
                    map.insert(name.clone(), ExportBinding::Local { expr: name.clone() });
                }
            }
            LinkStatementKind::ExportDefault { .. } => {
                map.insert(
                    "default".to_string(),
                    ExportBinding::Local {
                        expr: DEFAULT_BINDING.to_string(),
                    },
                );
            }
            LinkStatementKind::ExportLocal { items } => {
                for (local, exported) in items {
                    map.insert(exported.clone(), ExportBinding::Local { expr: local.clone() });
                }
            }
            LinkStatementKind::ExportNamedFrom { source, items } => {
                let target = target_of(module, source)?.clone();
                for (imported, exported) in items {
                    map.insert(
                        exported.clone(),
                        ExportBinding::Reexport {
                            from: target.clone(),
                            name: imported.clone(),
                        },
                    );
                }
            }
            LinkStatementKind::ExportNamespace { source, alias } => {
                let target = target_of(module, source)?.clone();
                map.insert(alias.clone(), ExportBinding::Namespace { from: target });
            }
            LinkStatementKind::ExportStar { source } => {
                stars.push(target_of(module, source)?.clone());
            }
            LinkStatementKind::Import { .. } => {}
        }
    }

    // Star names land after all explicit exports. A name exported
    // explicitly shadows any star; a name reached through two stars
    // with different origins is ambiguous and dropped, matching ESM
    // resolution.
    let mut star_names: ExportMap = ExportMap::new();
    let mut ambiguous = Vec::new();
    for target in stars {
        if let Some(target_module) = graph.get(&target) {
            if target_module.is_binary() {
                return Err(BuildError::UnsupportedModule {
                    path: target_module.path.clone(),
                    hint: "`export *` from a WebAssembly module is not supported; its export names are unknown before instantiation. Import the module and re-export names explicitly.".to_string(),
                });
            }
        }
        expand(graph, scans, &target, maps, stack)?;
        let Some(target_map) = maps.get(&target) else {
            continue;
        };
        for (name, binding) in target_map {
            if name == "default" || map.contains_key(name) {
                continue;
            }
            // A local binding in the target is only reachable through
            // the target's own exports object.
            let reached = match binding {
                ExportBinding::Local { .. } => ExportBinding::Reexport {
                    from: target.clone(),
                    name: name.clone(),
                },
                other => other.clone(),
            };
            match star_names.get(name) {
                None => {
                    star_names.insert(name.clone(), reached);
                }
                Some(existing) if *existing == reached => {}
                Some(_) => ambiguous.push(name.clone()),
            }
        }
    }
    for name in &ambiguous {
        star_names.shift_remove(name);
    }
    map.extend(star_names);

    stack.pop();
    maps.insert(id.clone(), map);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use braid_graph::{ImportRecord, Module, SourceKind};

    use crate::scanner::scan_for_linking;

    struct Fixture {
        graph: ModuleGraph,
        scans: FxHashMap<ModuleId, LinkScan>,
    }

    impl Fixture {
        fn new(entry: &str) -> Self {
            Self {
                graph: ModuleGraph::new(ModuleId::from(entry)),
                scans: FxHashMap::default(),
            }
        }

        fn module(mut self, id: &str, compiled: &str, imports: &[(&str, &str)]) -> Self {
            let mut module = Module::text(
                ModuleId::from(id),
                PathBuf::from(format!("/project/{id}")),
                SourceKind::JavaScript,
                compiled.to_string(),
            );
            for (specifier, target) in imports {
                module
                    .imports
                    .push(ImportRecord::new(*specifier, ModuleId::from(*target)));
            }
            let scan = scan_for_linking(&module.path, compiled).unwrap();
            self.scans.insert(module.id.clone(), scan);
            self.graph.insert(module);
            self
        }

        fn binary(mut self, id: &str) -> Self {
            self.graph.insert(Module::binary(
                ModuleId::from(id),
                PathBuf::from(format!("/project/{id}")),
                b"\0asm".to_vec(),
            ));
            self
        }

        fn compute(&self) -> Result<FxHashMap<ModuleId, ExportMap>> {
            compute_export_maps(&self.graph, &self.scans)
        }
    }

    fn names(map: &ExportMap) -> Vec<&str> {
        map.keys().map(String::as_str).collect()
    }

    #[test]
    fn local_exports_in_statement_order() {
        let fixture = Fixture::new("a.js").module(
            "a.js",
            "export const a = 1;\nexport default a;\nexport { a as alias };\n",
            &[],
        );
        let maps = fixture.compute().unwrap();
        let map = &maps[&ModuleId::from("a.js")];
        assert_eq!(names(map), vec!["a", "default", "alias"]);
        assert_eq!(
            map["default"],
            ExportBinding::Local {
                expr: DEFAULT_BINDING.to_string()
            }
        );
    }

    #[test]
    fn named_reexport_points_at_the_target() {
        let fixture = Fixture::new("b.js")
            .module("a.js", "export const x = 1;\n", &[])
            .module(
                "b.js",
                "export { x as y } from \"./a\";\n",
                &[("./a", "a.js")],
            );
        let maps = fixture.compute().unwrap();
        let map = &maps[&ModuleId::from("b.js")];
        assert_eq!(
            map["y"],
            ExportBinding::Reexport {
                from: ModuleId::from("a.js"),
                name: "x".to_string(),
            }
        );
    }

    #[test]
    fn star_expands_without_default() {
        let fixture = Fixture::new("b.js")
            .module(
                "a.js",
                "export const x = 1;\nexport const y = 2;\nexport default 3;\n",
                &[],
            )
            .module(
                "b.js",
                "export const z = 0;\nexport * from \"./a\";\n",
                &[("./a", "a.js")],
            );
        let maps = fixture.compute().unwrap();
        let map = &maps[&ModuleId::from("b.js")];
        assert_eq!(names(map), vec!["z", "x", "y"]);
    }

    #[test]
    fn explicit_export_shadows_star() {
        let fixture = Fixture::new("b.js")
            .module("a.js", "export const x = 1;\n", &[])
            .module(
                "b.js",
                "export const x = 2;\nexport * from \"./a\";\n",
                &[("./a", "a.js")],
            );
        let maps = fixture.compute().unwrap();
        let map = &maps[&ModuleId::from("b.js")];
        assert_eq!(
            map["x"],
            ExportBinding::Local {
                expr: "x".to_string()
            }
        );
    }

    #[test]
    fn ambiguous_star_names_are_dropped() {
        let fixture = Fixture::new("c.js")
            .module("a.js", "export const x = 1;\nexport const only_a = 1;\n", &[])
            .module("b.js", "export const x = 2;\nexport const only_b = 2;\n", &[])
            .module(
                "c.js",
                "export * from \"./a\";\nexport * from \"./b\";\n",
                &[("./a", "a.js"), ("./b", "b.js")],
            );
        let maps = fixture.compute().unwrap();
        let map = &maps[&ModuleId::from("c.js")];
        assert_eq!(names(map), vec!["only_a", "only_b"]);
    }

    #[test]
    fn shared_origin_through_two_stars_is_not_ambiguous() {
        let fixture = Fixture::new("d.js")
            .module("a.js", "export const x = 1;\n", &[])
            .module("b.js", "export * from \"./a\";\n", &[("./a", "a.js")])
            .module("c.js", "export * from \"./a\";\n", &[("./a", "a.js")])
            .module(
                "d.js",
                "export * from \"./b\";\nexport * from \"./c\";\n",
                &[("./b", "b.js"), ("./c", "c.js")],
            );
        let maps = fixture.compute().unwrap();
        let map = &maps[&ModuleId::from("d.js")];
        assert_eq!(
            map["x"],
            ExportBinding::Reexport {
                from: ModuleId::from("a.js"),
                name: "x".to_string(),
            }
        );
    }

    #[test]
    fn star_cycle_is_fatal() {
        let fixture = Fixture::new("a.js")
            .module("a.js", "export * from \"./b\";\n", &[("./b", "b.js")])
            .module("b.js", "export * from \"./a\";\n", &[("./a", "a.js")]);
        let err = fixture.compute().unwrap_err();
        match err {
            BuildError::DependencyCycle { cycle, .. } => {
                assert!(cycle.contains(" -> "));
                assert!(cycle.contains("a.js"));
                assert!(cycle.contains("b.js"));
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn plain_import_cycle_is_allowed() {
        let fixture = Fixture::new("a.js")
            .module(
                "a.js",
                "import { b } from \"./b\";\nexport const a = 1;\n",
                &[("./b", "b.js")],
            )
            .module(
                "b.js",
                "import { a } from \"./a\";\nexport const b = 2;\n",
                &[("./a", "a.js")],
            );
        assert!(fixture.compute().is_ok());
    }

    #[test]
    fn star_from_wasm_is_unsupported() {
        let fixture = Fixture::new("a.js").binary("lib.wasm").module(
            "a.js",
            "export * from \"./lib.wasm\";\n",
            &[("./lib.wasm", "lib.wasm")],
        );
        let err = fixture.compute().unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedModule { .. }));
    }
}
