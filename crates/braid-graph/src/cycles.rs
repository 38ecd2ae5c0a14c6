//! Cycle detection over the module graph.
//!
//! Extends [`ModuleGraph`] with the queries the linker needs to decide
//! whether a cycle is runtime-supportable, and to render chains in errors
//! and logs.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::{ModuleGraph, ModuleId};

/// One import cycle, as the path that closes it.
///
/// The first and last ids are the same module, so a two-module cycle renders
/// as `a.ts -> b.ts -> a.ts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    pub path: Vec<ModuleId>,
}

impl Cycle {
    /// Human-readable chain, e.g. `a.ts -> b.ts -> a.ts`.
    pub fn format(&self) -> String {
        self.path
            .iter()
            .map(|id| id.as_str().to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    InProgress,
    Done,
}

impl ModuleGraph {
    /// Find every import cycle reachable from the entry.
    ///
    /// Depth-first with an explicit stack; each back edge yields one cycle,
    /// recorded from the first occurrence of the target on the current path.
    pub fn find_cycles(&self) -> Vec<Cycle> {
        let mut cycles = Vec::new();
        let mut state: FxHashMap<ModuleId, Visit> = FxHashMap::default();
        let mut path: Vec<ModuleId> = Vec::new();
        let mut stack: Vec<(ModuleId, bool)> = vec![(self.entry().clone(), false)];

        while let Some((id, exiting)) = stack.pop() {
            if exiting {
                state.insert(id, Visit::Done);
                path.pop();
                continue;
            }
            if state.contains_key(&id) {
                continue;
            }
            state.insert(id.clone(), Visit::InProgress);
            path.push(id.clone());
            stack.push((id.clone(), true));

            let Some(module) = self.get(&id) else {
                continue;
            };
            for record in module.imports.iter().rev() {
                match state.get(&record.resolved) {
                    None => stack.push((record.resolved.clone(), false)),
                    Some(Visit::InProgress) => {
                        if let Some(pos) = path.iter().position(|p| p == &record.resolved) {
                            let mut cycle_path = path[pos..].to_vec();
                            cycle_path.push(record.resolved.clone());
                            debug!(cycle = %Cycle { path: cycle_path.clone() }.format(), "import cycle detected");
                            cycles.push(Cycle { path: cycle_path });
                        }
                    }
                    Some(Visit::Done) => {}
                }
            }
        }

        cycles
    }
}
