//! The `braid build` command.
//!
//! Loads the layered configuration, runs the pipeline once, and prints a
//! summary of the written files. Any stage failure propagates out before
//! the output directory is touched.

use braid_config::{loading, ConfigOverrides, Mode};

use crate::cli::BuildArgs;
use crate::error::Result;
use crate::ui;

/// Execute the build command.
pub async fn execute(args: BuildArgs) -> Result<()> {
    let config = loading::load(&overrides_from(&args), args.config.as_deref())?;

    ui::info(&format!("Building {} ({} mode)", config.entry, config.mode));
    let report = braid_bundler::build(&config)?;

    let files: Vec<(String, u64)> = report
        .written
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let size = std::fs::metadata(path).map(|meta| meta.len()).unwrap_or(0);
            (name, size)
        })
        .collect();
    ui::print_build_summary(&files, report.duration);

    ui::success(&format!(
        "Built {} modules into {}",
        report.module_count,
        report.out_dir.display()
    ));
    Ok(())
}

/// Map command-line flags onto configuration overrides.
///
/// Absent flags stay `None` so `braid.toml` and `BRAID_*` variables keep
/// their say; `--production` is the explicit mode override that beats
/// both.
fn overrides_from(args: &BuildArgs) -> ConfigOverrides {
    ConfigOverrides {
        root: args.root.clone(),
        mode: args.production.then_some(Mode::Production),
        entry: args.entry.clone(),
        out_dir: args.out_dir.clone(),
        out_file: None,
        wasm: None,
        clean: args.clean.then_some(true),
    }
}
