//! The module graph.

use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{Module, ModuleId};

/// All modules reachable from the entry, keyed by [`ModuleId`].
///
/// Iteration is deterministic: `modules()` yields discovery order,
/// `execution_order()` yields dependencies before dependents. Both are
/// stable for a given source tree, which is what makes the emitted bundle
/// reproducible.
#[derive(Debug, Clone)]
pub struct ModuleGraph {
    modules: FxHashMap<ModuleId, Module>,
    /// Ids in discovery order; the source of iteration stability.
    order: Vec<ModuleId>,
    entry: ModuleId,
}

impl ModuleGraph {
    pub fn new(entry: ModuleId) -> Self {
        Self {
            modules: FxHashMap::default(),
            order: Vec::new(),
            entry,
        }
    }

    pub fn entry(&self) -> &ModuleId {
        &self.entry
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.modules.contains_key(id)
    }

    /// Insert a module; replaces on id collision (the resolver never
    /// discovers the same id twice, so collisions only occur in tests).
    pub fn insert(&mut self, module: Module) {
        if !self.modules.contains_key(&module.id) {
            self.order.push(module.id.clone());
        }
        self.modules.insert(module.id.clone(), module);
    }

    pub fn get(&self, id: &ModuleId) -> Option<&Module> {
        self.modules.get(id)
    }

    pub fn get_mut(&mut self, id: &ModuleId) -> Option<&mut Module> {
        self.modules.get_mut(id)
    }

    /// Modules in discovery order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.order.iter().filter_map(|id| self.modules.get(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = &ModuleId> {
        self.order.iter()
    }

    /// Number of binary modules in the graph.
    pub fn binary_count(&self) -> usize {
        self.modules().filter(|m| m.is_binary()).count()
    }

    /// Find a module by its absolute filesystem path.
    pub fn by_path(&self, path: &Path) -> Option<&Module> {
        self.modules().find(|m| m.path == path)
    }

    /// Ids in execution order: depth-first from the entry, edges in
    /// declaration order, dependencies before dependents, entry last.
    /// Cycles are tolerated (a module already on the stack is skipped).
    pub fn execution_order(&self) -> Vec<ModuleId> {
        let mut order = Vec::with_capacity(self.len());
        let mut visited = FxHashSet::default();
        let mut stack: Vec<(ModuleId, bool)> = vec![(self.entry.clone(), false)];

        while let Some((id, exiting)) = stack.pop() {
            if exiting {
                order.push(id);
                continue;
            }
            if !visited.insert(id.clone()) {
                continue;
            }
            stack.push((id.clone(), true));
            if let Some(module) = self.modules.get(&id) {
                // Reverse so edges pop in declaration order.
                for record in module.imports.iter().rev() {
                    if !visited.contains(&record.resolved) {
                        stack.push((record.resolved.clone(), false));
                    }
                }
            }
        }

        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ImportRecord, SourceKind};
    use std::path::PathBuf;

    fn text_module(id: &str, imports: &[&str]) -> Module {
        let mut module = Module::text(
            ModuleId::from(id),
            PathBuf::from(format!("/p/{id}")),
            SourceKind::TypeScript,
            String::new(),
        );
        module.imports = imports
            .iter()
            .map(|dep| ImportRecord::new(format!("./{dep}"), ModuleId::from(*dep)))
            .collect();
        module
    }

    fn graph(entry: &str, modules: Vec<Module>) -> ModuleGraph {
        let mut graph = ModuleGraph::new(ModuleId::from(entry));
        for module in modules {
            graph.insert(module);
        }
        graph
    }

    #[test]
    fn insert_and_lookup() {
        let g = graph("index.ts", vec![text_module("index.ts", &[])]);
        assert_eq!(g.len(), 1);
        assert!(g.contains(&ModuleId::from("index.ts")));
        assert!(g.get(&ModuleId::from("index.ts")).is_some());
        assert!(g.get(&ModuleId::from("other.ts")).is_none());
    }

    #[test]
    fn discovery_order_is_insertion_order() {
        let g = graph(
            "index.ts",
            vec![
                text_module("index.ts", &["a.ts", "b.ts"]),
                text_module("a.ts", &[]),
                text_module("b.ts", &[]),
            ],
        );
        let ids: Vec<&str> = g.ids().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["index.ts", "a.ts", "b.ts"]);
    }

    #[test]
    fn execution_order_puts_dependencies_first() {
        let g = graph(
            "index.ts",
            vec![
                text_module("index.ts", &["a.ts", "b.ts"]),
                text_module("a.ts", &["shared.ts"]),
                text_module("b.ts", &["shared.ts"]),
                text_module("shared.ts", &[]),
            ],
        );
        let order = g.execution_order();
        let order: Vec<&str> = order.iter().map(|id| id.as_str()).collect();
        assert_eq!(order, vec!["shared.ts", "a.ts", "b.ts", "index.ts"]);
    }

    #[test]
    fn execution_order_tolerates_cycles() {
        let g = graph(
            "index.ts",
            vec![
                text_module("index.ts", &["a.ts"]),
                text_module("a.ts", &["b.ts"]),
                text_module("b.ts", &["a.ts"]),
            ],
        );
        let order = g.execution_order();
        assert_eq!(order.len(), 3);
        assert_eq!(order.last().map(|id| id.as_str()), Some("index.ts"));
    }

    #[test]
    fn execution_order_is_stable() {
        let build = || {
            graph(
                "index.ts",
                vec![
                    text_module("index.ts", &["b.ts", "a.ts"]),
                    text_module("b.ts", &[]),
                    text_module("a.ts", &[]),
                ],
            )
            .execution_order()
        };
        assert_eq!(build(), build());
    }
}
