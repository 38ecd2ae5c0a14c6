//! Entry resolution.
//!
//! Starting from the configured entry the resolver walks every static
//! import, maps specifiers to files on disk and produces the module
//! graph the later stages consume. Relative specifiers resolve against
//! the importing module, root-absolute ones against the project root.
//! Resolution is purely lexical: a specifier is tried as written, then
//! with the configured extensions appended in order, then as a
//! directory with an index file.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use tracing::{debug, trace};

use braid_config::BuildConfig;
use braid_graph::{ImportRecord, Module, ModuleGraph, ModuleId, SourceKind};

use crate::error::{BuildError, Result};
use crate::scanner;

pub struct Resolver<'a> {
    config: &'a BuildConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(config: &'a BuildConfig) -> Self {
        Self { config }
    }

    /// Walk the import graph breadth-first from the configured entry.
    ///
    /// Every module is loaded exactly once; revisiting an already
    /// inserted id just records the edge, which keeps import cycles
    /// from looping the walk.
    pub fn resolve_graph(&self) -> Result<ModuleGraph> {
        let entry = self.resolve_entry()?;
        let entry_id = self.module_id(&entry)?;
        debug!(entry = %entry_id, "entry resolved");

        let mut graph = ModuleGraph::new(entry_id);
        let mut queue = VecDeque::new();
        queue.push_back(entry);
        while let Some(path) = queue.pop_front() {
            let id = self.module_id(&path)?;
            if graph.contains(&id) {
                continue;
            }
            let module = self.load_module(id, &path, &mut queue)?;
            graph.insert(module);
        }

        debug!(
            modules = graph.len(),
            binaries = graph.binary_count(),
            "module graph complete"
        );
        Ok(graph)
    }

    fn resolve_entry(&self) -> Result<PathBuf> {
        let base = self.config.entry_path();
        if !base.starts_with(&self.config.root) {
            return Err(BuildError::Resolve {
                specifier: self.config.entry.clone(),
                importer: self.config.root.clone(),
                hint: format!(
                    "The entry path escapes the project root {}",
                    self.config.root.display()
                ),
            });
        }
        let Some(path) = self.probe(&base) else {
            return Err(BuildError::Resolve {
                specifier: self.config.entry.clone(),
                importer: self.config.root.clone(),
                hint: format!(
                    "The entry module was not found under {}. Checked the path as written, the extensions [{}] and index files.",
                    self.config.root.display(),
                    self.config.extensions.join(", ")
                ),
            });
        };
        if is_wasm(&path) {
            return Err(BuildError::UnsupportedModule {
                path,
                hint: "A .wasm module cannot be the entry. Wrap it in a JavaScript or TypeScript entry that imports it.".to_string(),
            });
        }
        Ok(path)
    }

    fn load_module(
        &self,
        id: ModuleId,
        path: &Path,
        queue: &mut VecDeque<PathBuf>,
    ) -> Result<Module> {
        if is_wasm(path) {
            let bytes = fs::read(path).map_err(|error| BuildError::io(path, error))?;
            trace!(module = %id, size = bytes.len(), "loaded binary module");
            return Ok(Module::binary(id, path.to_path_buf(), bytes));
        }

        let Some(kind) = SourceKind::from_path(path) else {
            return Err(BuildError::UnsupportedModule {
                path: path.to_path_buf(),
                hint: "Only JavaScript, TypeScript and .wasm modules can be bundled. Other files must be staged through the copy list.".to_string(),
            });
        };

        let source = fs::read_to_string(path).map_err(|error| BuildError::io(path, error))?;
        let specifiers = scanner::collect_import_specifiers(path, kind, &source)?;

        let mut module = Module::text(id, path.to_path_buf(), kind, source);
        for specifier in specifiers {
            let resolved = self.resolve_specifier(&specifier, path)?;
            let resolved_id = self.module_id(&resolved)?;
            trace!(from = %module.id, specifier = %specifier, to = %resolved_id, "import edge");
            module.imports.push(ImportRecord::new(specifier, resolved_id));
            queue.push_back(resolved);
        }
        Ok(module)
    }

    fn resolve_specifier(&self, specifier: &str, importer: &Path) -> Result<PathBuf> {
        let base = if let Some(rooted) = specifier.strip_prefix('/') {
            self.config.root.join(rooted).clean()
        } else if specifier.starts_with("./") || specifier.starts_with("../") {
            let parent = importer.parent().unwrap_or(&self.config.root);
            parent.join(specifier).clean()
        } else {
            return Err(BuildError::Resolve {
                specifier: specifier.to_string(),
                importer: importer.to_path_buf(),
                hint: "Bare specifiers are not supported. Braid does not resolve packages; use a relative or root-absolute path.".to_string(),
            });
        };

        if !base.starts_with(&self.config.root) {
            return Err(BuildError::Resolve {
                specifier: specifier.to_string(),
                importer: importer.to_path_buf(),
                hint: format!(
                    "The path escapes the project root {}",
                    self.config.root.display()
                ),
            });
        }

        match self.probe(&base) {
            Some(path) => Ok(path),
            None => Err(BuildError::Resolve {
                specifier: specifier.to_string(),
                importer: importer.to_path_buf(),
                hint: format!(
                    "Checked {} as written, with the extensions [{}] and as a directory with an index file.",
                    base.display(),
                    self.config.extensions.join(", ")
                ),
            }),
        }
    }

    /// Literal path first, then extensions in configured order, then
    /// index files inside a directory.
    fn probe(&self, base: &Path) -> Option<PathBuf> {
        if base.is_file() {
            return Some(base.to_path_buf());
        }
        for ext in &self.config.extensions {
            let mut candidate = base.as_os_str().to_os_string();
            candidate.push(ext);
            let candidate = PathBuf::from(candidate);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        if base.is_dir() {
            for ext in &self.config.extensions {
                let candidate = base.join(format!("index{ext}"));
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
        None
    }

    fn module_id(&self, path: &Path) -> Result<ModuleId> {
        let relative = path
            .strip_prefix(&self.config.root)
            .map_err(|_| BuildError::Resolve {
                specifier: path.display().to_string(),
                importer: self.config.root.clone(),
                hint: "The resolved file lies outside the project root.".to_string(),
            })?;
        Ok(ModuleId::from_relative(relative))
    }
}

fn is_wasm(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == "wasm")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_at(root: &Path) -> BuildConfig {
        let mut config = BuildConfig::for_mode(false);
        config.root = root.canonicalize().unwrap();
        config
    }

    fn write(root: &Path, name: &str, contents: &str) {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn walks_imports_from_the_entry() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.ts", "import { x } from \"./util\";\nconsole.log(x);\n");
        write(dir.path(), "util.ts", "export const x = 1;\n");

        let config = config_at(dir.path());
        let graph = Resolver::new(&config).resolve_graph().unwrap();

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.entry().as_str(), "index.ts");
        let entry = graph.get(graph.entry()).unwrap();
        assert_eq!(entry.imports.len(), 1);
        assert_eq!(entry.imports[0].specifier, "./util");
        assert_eq!(entry.imports[0].resolved.as_str(), "util.ts");
    }

    #[test]
    fn extension_order_is_respected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.ts", "import \"./widget\";\n");
        write(dir.path(), "widget.tsx", "export {};\n");
        write(dir.path(), "widget.ts", "export {};\n");

        let config = config_at(dir.path());
        let graph = Resolver::new(&config).resolve_graph().unwrap();
        assert!(graph.contains(&ModuleId::from("widget.tsx")));
        assert!(!graph.contains(&ModuleId::from("widget.ts")));
    }

    #[test]
    fn literal_path_wins_over_extension_probing() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.ts", "import \"./data.ts\";\n");
        write(dir.path(), "data.ts", "export {};\n");
        write(dir.path(), "data.ts.ts", "export {};\n");

        let config = config_at(dir.path());
        let graph = Resolver::new(&config).resolve_graph().unwrap();
        assert!(graph.contains(&ModuleId::from("data.ts")));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn directory_import_falls_back_to_index() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.ts", "import \"./lib\";\n");
        write(dir.path(), "lib/index.ts", "export {};\n");

        let config = config_at(dir.path());
        let graph = Resolver::new(&config).resolve_graph().unwrap();
        assert!(graph.contains(&ModuleId::from("lib/index.ts")));
    }

    #[test]
    fn root_absolute_specifier_resolves_from_the_project_root() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.ts", "import \"./deep/nested\";\n");
        write(dir.path(), "deep/nested.ts", "import \"/shared/util\";\n");
        write(dir.path(), "shared/util.ts", "export {};\n");

        let config = config_at(dir.path());
        let graph = Resolver::new(&config).resolve_graph().unwrap();
        assert!(graph.contains(&ModuleId::from("shared/util.ts")));
    }

    #[test]
    fn bare_specifier_is_rejected_with_a_hint() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.ts", "import React from \"react\";\n");

        let config = config_at(dir.path());
        let err = Resolver::new(&config).resolve_graph().unwrap_err();
        match err {
            BuildError::Resolve { specifier, hint, .. } => {
                assert_eq!(specifier, "react");
                assert!(hint.contains("Bare specifiers"));
            }
            other => panic!("expected resolve error, got {other:?}"),
        }
    }

    #[test]
    fn escaping_the_root_is_rejected() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("project");
        fs::create_dir_all(&root).unwrap();
        write(&root, "index.ts", "import \"../outside\";\n");
        write(dir.path(), "outside.ts", "export {};\n");

        let config = config_at(&root);
        let err = Resolver::new(&config).resolve_graph().unwrap_err();
        match err {
            BuildError::Resolve { hint, .. } => assert!(hint.contains("escapes the project root")),
            other => panic!("expected resolve error, got {other:?}"),
        }
    }

    #[test]
    fn missing_module_reports_what_was_probed() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.ts", "import \"./nothing\";\n");

        let config = config_at(dir.path());
        let err = Resolver::new(&config).resolve_graph().unwrap_err();
        match err {
            BuildError::Resolve { specifier, hint, .. } => {
                assert_eq!(specifier, "./nothing");
                assert!(hint.contains(".tsx, .ts, .js"));
            }
            other => panic!("expected resolve error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_file_type_is_unsupported() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.ts", "import \"./theme.css\";\n");
        write(dir.path(), "theme.css", "body {}\n");

        let config = config_at(dir.path());
        let err = Resolver::new(&config).resolve_graph().unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedModule { .. }));
    }

    #[test]
    fn wasm_module_is_loaded_as_binary() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.ts", "import \"./pkg/lib.wasm\";\n");
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("pkg/lib.wasm"), b"\0asm\x01\0\0\0").unwrap();

        let config = config_at(dir.path());
        let graph = Resolver::new(&config).resolve_graph().unwrap();
        assert_eq!(graph.binary_count(), 1);
        let module = graph.get(&ModuleId::from("pkg/lib.wasm")).unwrap();
        assert!(module.is_binary());
    }

    #[test]
    fn wasm_entry_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.wasm"), b"\0asm\x01\0\0\0").unwrap();

        let mut config = config_at(dir.path());
        config.entry = "main.wasm".to_string();
        let err = Resolver::new(&config).resolve_graph().unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedModule { .. }));
    }

    #[test]
    fn cycles_terminate_the_walk() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.ts", "import \"./a\";\n");
        write(dir.path(), "a.ts", "import \"./b\";\nexport const a = 1;\n");
        write(dir.path(), "b.ts", "import \"./a\";\nexport const b = 2;\n");

        let config = config_at(dir.path());
        let graph = Resolver::new(&config).resolve_graph().unwrap();
        assert_eq!(graph.len(), 3);
    }
}
