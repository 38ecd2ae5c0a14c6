//! # braid-graph
//!
//! Pure data structures for the braid module graph. No parsing, no I/O:
//! the bundler discovers modules and records them here; linking consumes
//! the graph through the deterministic ordering and cycle queries.
//!
//! ```text
//!   ┌────────────┐   insert    ┌─────────────┐   execution_order
//!   │  resolver  │ ──────────► │ ModuleGraph │ ──────────────────► linker
//!   └────────────┘             │  (by id)    │   find_cycles
//!                              └─────────────┘
//! ```
//!
//! Identity is the [`ModuleId`]: the module's root-relative path with
//! forward slashes, stable across platforms and runs.

mod cycles;
mod graph;
mod import;
mod module;

pub use cycles::Cycle;
pub use graph::ModuleGraph;
pub use import::ImportRecord;
pub use module::{Module, ModuleId, ModuleKind, ModulePayload, SourceKind};
