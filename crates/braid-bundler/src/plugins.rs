//! Build plugins.
//!
//! The closed set of post-link steps. Each plugin sees the finished
//! graph and the staged artifact; none of them touch the filesystem
//! output directly, they only adjust what the writer will commit.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use braid_config::BuildConfig;
use braid_graph::ModuleGraph;

use crate::error::{BuildError, Result};
use crate::output::OutputArtifact;

/// Everything a plugin may inspect while it runs.
pub struct PluginContext<'a> {
    pub config: &'a BuildConfig,
    pub graph: &'a ModuleGraph,
}

/// Post-link build steps, applied in order.
#[derive(Debug, Clone)]
pub enum BuildPlugin {
    /// Empty the output directory before the write.
    CleanOutput,
    /// Copy configured files from the project root next to the bundle.
    CopyAssets { targets: Vec<String> },
}

impl BuildPlugin {
    /// The plugins a build of `config` runs, in execution order.
    pub fn for_config(config: &BuildConfig) -> Vec<BuildPlugin> {
        let mut plugins = Vec::new();
        if config.clean {
            plugins.push(BuildPlugin::CleanOutput);
        }
        if !config.copy.is_empty() {
            plugins.push(BuildPlugin::CopyAssets {
                targets: config.copy.clone(),
            });
        }
        plugins
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CleanOutput => "clean-output",
            Self::CopyAssets { .. } => "copy-assets",
        }
    }

    pub fn apply(&self, ctx: &PluginContext<'_>, artifact: &mut OutputArtifact) -> Result<()> {
        debug!(plugin = self.name(), "applying plugin");
        match self {
            Self::CleanOutput => {
                artifact.set_clean();
                Ok(())
            }
            Self::CopyAssets { targets } => copy_assets(ctx.config, targets, artifact),
        }
    }
}

/// Read every copy target into the artifact.
///
/// A missing target fails the build here, while the output is still
/// entirely in memory, so nothing has been written yet.
fn copy_assets(
    config: &BuildConfig,
    targets: &[String],
    artifact: &mut OutputArtifact,
) -> Result<()> {
    for target in targets {
        let path = config.root.join(target);
        let contents = match fs::read(&path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Err(BuildError::MissingAsset { path });
            }
            Err(error) => return Err(BuildError::io(&path, error)),
        };
        artifact.stage_asset(file_name_of(target, &path)?, contents)?;
    }
    Ok(())
}

fn file_name_of(target: &str, path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            BuildError::InvalidOutputPath(format!("copy target '{target}' has no file name"))
        })
}
