//! The build pipeline.
//!
//! Stages run in a fixed order: resolve, compile, link, stage, write.
//! Everything through staging happens in memory and the first error
//! aborts the build, so a failed build never touches the output
//! directory.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use braid_config::{BuildConfig, Mode};
use braid_graph::ModuleGraph;

use crate::compiler;
use crate::error::Result;
use crate::linker::Linker;
use crate::output::OutputArtifact;
use crate::plugins::{BuildPlugin, PluginContext};
use crate::resolver::Resolver;

/// Summary of one finished build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub mode: Mode,
    /// Modules linked into the bundle.
    pub module_count: usize,
    /// How many of them are WebAssembly.
    pub binary_count: usize,
    /// Size of the bundle alone, before assets.
    pub bundle_bytes: usize,
    /// Absolute paths of everything written.
    pub written: Vec<PathBuf>,
    pub out_dir: PathBuf,
    pub duration: Duration,
}

/// Run a complete build and commit it to the output directory.
pub fn build(config: &BuildConfig) -> Result<BuildReport> {
    let started = Instant::now();
    let (graph, artifact) = build_in_memory(config)?;
    let written = artifact.write_to(&config.out_dir)?;

    let report = BuildReport {
        mode: config.mode,
        module_count: graph.len(),
        binary_count: graph.binary_count(),
        bundle_bytes: artifact.bundle().contents.len(),
        written,
        out_dir: config.out_dir.clone(),
        duration: started.elapsed(),
    };
    info!(
        mode = %report.mode,
        modules = report.module_count,
        bundle_bytes = report.bundle_bytes,
        elapsed_ms = report.duration.as_millis() as u64,
        "build finished"
    );
    Ok(report)
}

/// Run every stage except the final write.
///
/// The dev server builds through this too; it only commits to disk
/// when the whole artifact staged cleanly.
pub fn build_in_memory(config: &BuildConfig) -> Result<(ModuleGraph, OutputArtifact)> {
    info!(mode = %config.mode, entry = %config.entry, "build started");
    if config.mode.debug_info() {
        debug!(
            root = %config.root.display(),
            out_dir = %config.out_dir.display(),
            "resolved configuration"
        );
    }

    let mut graph = Resolver::new(config).resolve_graph()?;
    compiler::compile_graph(config, &mut graph)?;
    let bundle = Linker::new(config).link(&graph)?;

    let mut artifact = OutputArtifact::new(config.out_file.clone(), bundle.into_bytes());
    let ctx = PluginContext {
        config,
        graph: &graph,
    };
    for plugin in BuildPlugin::for_config(config) {
        plugin.apply(&ctx, &mut artifact)?;
    }
    Ok((graph, artifact))
}
