//! Output staging.
//!
//! A build assembles its complete output in memory before anything
//! touches the output directory. Writes go through a temp-then-rename
//! pass with rollback, so a failed build leaves either the previous
//! output or nothing, never a half-written bundle.

use std::fs;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use tracing::{debug, trace};

use crate::error::{BuildError, Result};

/// What a staged file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// The linked bundle.
    Bundle,
    /// A copied asset.
    Asset,
}

/// One file destined for the output directory.
#[derive(Debug, Clone)]
pub struct OutputFile {
    /// File name inside the output directory, no path components.
    pub name: String,
    pub contents: Vec<u8>,
    pub kind: OutputKind,
}

/// The complete in-memory result of a build.
///
/// Always holds the bundle; assets are staged next to it by plugins.
#[derive(Debug, Clone)]
pub struct OutputArtifact {
    bundle: OutputFile,
    assets: Vec<OutputFile>,
    clean: bool,
}

impl OutputArtifact {
    pub fn new(bundle_name: impl Into<String>, bundle: Vec<u8>) -> Self {
        Self {
            bundle: OutputFile {
                name: bundle_name.into(),
                contents: bundle,
                kind: OutputKind::Bundle,
            },
            assets: Vec::new(),
            clean: false,
        }
    }

    /// Stage one asset next to the bundle.
    pub fn stage_asset(&mut self, name: impl Into<String>, contents: Vec<u8>) -> Result<()> {
        let name = name.into();
        if name == self.bundle.name || self.assets.iter().any(|file| file.name == name) {
            return Err(BuildError::InvalidOutputPath(format!(
                "'{name}' is staged twice"
            )));
        }
        trace!(name = %name, bytes = contents.len(), "asset staged");
        self.assets.push(OutputFile {
            name,
            contents,
            kind: OutputKind::Asset,
        });
        Ok(())
    }

    /// Ask for the output directory to be emptied before the write.
    pub fn set_clean(&mut self) {
        self.clean = true;
    }

    pub fn is_clean(&self) -> bool {
        self.clean
    }

    pub fn bundle(&self) -> &OutputFile {
        &self.bundle
    }

    pub fn files(&self) -> impl Iterator<Item = &OutputFile> {
        std::iter::once(&self.bundle).chain(self.assets.iter())
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.files().map(|file| file.name.as_str()).collect()
    }

    /// Write every staged file into `out_dir`.
    ///
    /// All names are validated before the first byte is written. Files
    /// land under temporary names and are renamed into place in a
    /// second pass; any failure removes the temporaries.
    pub fn write_to(&self, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let dir = normalize_output_dir(out_dir)?;

        let mut planned = Vec::new();
        for file in self.files() {
            planned.push((validate_output_path(&dir, &file.name)?, &file.contents));
        }

        if self.clean && dir.exists() {
            debug!(dir = %dir.display(), "cleaning output directory");
            fs::remove_dir_all(&dir).map_err(|error| BuildError::io(&dir, error))?;
        }
        fs::create_dir_all(&dir).map_err(|error| BuildError::io(&dir, error))?;

        write_files_atomic(&planned)?;
        debug!(dir = %dir.display(), files = planned.len(), "output written");
        Ok(planned.into_iter().map(|(path, _)| path).collect())
    }
}

fn normalize_output_dir(dir: &Path) -> Result<PathBuf> {
    if dir.as_os_str().is_empty() {
        return Err(BuildError::InvalidOutputPath(
            "output directory is empty".to_string(),
        ));
    }
    Ok(dir.to_path_buf().clean())
}

fn validate_output_path(dir: &Path, name: &str) -> Result<PathBuf> {
    if name.is_empty() {
        return Err(BuildError::InvalidOutputPath(
            "file name is empty".to_string(),
        ));
    }
    if name.contains('\0') {
        return Err(BuildError::InvalidOutputPath(format!(
            "'{}' contains a null byte",
            name.escape_default()
        )));
    }
    let candidate = dir.join(name).clean();
    if !candidate.starts_with(dir) {
        return Err(BuildError::InvalidOutputPath(format!(
            "'{name}' escapes the output directory"
        )));
    }
    Ok(candidate)
}

fn write_files_atomic(planned: &[(PathBuf, &Vec<u8>)]) -> Result<()> {
    let mut temps = Vec::with_capacity(planned.len());
    for (target, contents) in planned {
        let temp = temp_path(target);
        if let Err(error) = fs::write(&temp, contents) {
            let _ = fs::remove_file(&temp);
            cleanup_temp_files(&temps);
            return Err(BuildError::WriteFailure(format!(
                "{}: {error}",
                temp.display()
            )));
        }
        temps.push(temp);
    }

    for (index, (target, _)) in planned.iter().enumerate() {
        if let Err(error) = fs::rename(&temps[index], target) {
            cleanup_temp_files(&temps[index..]);
            return Err(BuildError::WriteFailure(format!(
                "{}: {error}",
                target.display()
            )));
        }
    }
    Ok(())
}

fn temp_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".braid-tmp");
    PathBuf::from(name)
}

fn cleanup_temp_files(temps: &[PathBuf]) {
    for temp in temps {
        let _ = fs::remove_file(temp);
    }
}
