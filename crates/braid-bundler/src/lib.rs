//! Braid's build pipeline.
//!
//! A build flows through five stages, each feeding the next:
//!
//! ```text
//!   resolver ──> compiler ──> linker ──> plugins ──> output
//!   (graph)      (lower TS)   (bundle)   (stage)     (write)
//! ```
//!
//! The resolver walks static imports from the entry and produces a
//! [`braid_graph::ModuleGraph`]. The compiler lowers each module
//! according to the first matching rule. The linker rewrites module
//! bodies into registry factories and assembles one script, minified
//! in production. Plugins stage assets next to the bundle, and the
//! output writer commits everything atomically.
//!
//! The first error anywhere aborts the build; nothing is written
//! unless every stage succeeded.

pub mod compiler;
pub mod error;
pub mod linker;
pub mod output;
pub mod pipeline;
pub mod plugins;
pub mod resolver;

mod scanner;

pub use compiler::compile_graph;
pub use error::{BuildError, Result};
pub use linker::Linker;
pub use output::{OutputArtifact, OutputFile, OutputKind};
pub use pipeline::{BuildReport, build, build_in_memory};
pub use plugins::{BuildPlugin, PluginContext};
pub use resolver::Resolver;
