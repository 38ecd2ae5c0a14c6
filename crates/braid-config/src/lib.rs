//! # braid-config
//!
//! Build configuration for the braid bundler: the [`BuildConfig`] value, the
//! [`Mode`] profile, ordered [`ModuleRule`]s, layered loading and validation.
//!
//! A configuration is constructed once per invocation, either directly from
//! the `production` flag via [`BuildConfig::for_mode`] or through the layered
//! loader in [`loading`] (defaults, `braid.toml`, `BRAID_*` environment,
//! explicit overrides). After [`BuildConfig::resolve`] it is immutable for
//! the duration of the build.

mod error;
pub mod loading;
mod mode;
mod rules;

use std::path::{Path, PathBuf};

use path_clean::PathClean;
use serde::{Deserialize, Serialize};

pub use error::{ConfigError, Result};
pub use loading::ConfigOverrides;
pub use mode::Mode;
pub use rules::{rule_for, Loader, ModuleRule};

/// Default configuration file name, looked up in the project root.
pub const CONFIG_FILE: &str = "braid.toml";

/// Root configuration value for a single build invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Project root all relative paths resolve against.
    pub root: PathBuf,
    /// Entry module, relative to `root`.
    pub entry: String,
    /// Output directory; absolutized against `root` by [`resolve`](Self::resolve).
    pub out_dir: PathBuf,
    /// Filename of the linked bundle inside `out_dir`.
    pub out_file: String,
    /// Optimization profile.
    pub mode: Mode,
    /// Ordered transformation rules; first match wins per file.
    pub rules: Vec<ModuleRule>,
    /// Extension suffixes tried, in order, for extension-less imports.
    pub extensions: Vec<String>,
    /// Static files copied byte-for-byte from `root` into `out_dir`.
    pub copy: Vec<String>,
    /// Whether binary WebAssembly modules may be linked.
    pub wasm: bool,
    /// Whether stale `out_dir` contents are removed before writing.
    pub clean: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::for_mode(false)
    }
}

impl BuildConfig {
    /// The configuration factory: a pure function from the `production`
    /// flag to a full config with the stock web-app defaults.
    pub fn for_mode(production: bool) -> Self {
        Self {
            root: PathBuf::from("."),
            entry: "index.ts".to_string(),
            out_dir: PathBuf::from("dist"),
            out_file: "index.js".to_string(),
            mode: Mode::from_production(production),
            rules: vec![ModuleRule::typescript()],
            extensions: vec![".tsx".into(), ".ts".into(), ".js".into()],
            copy: vec!["index.html".into(), "monokai.css".into()],
            wasm: true,
            clean: false,
        }
    }

    /// Absolute path of the entry module.
    pub fn entry_path(&self) -> PathBuf {
        self.root.join(self.entry.trim_start_matches("./")).clean()
    }

    /// Absolute path of the linked bundle.
    pub fn out_path(&self) -> PathBuf {
        self.out_dir.join(&self.out_file)
    }

    /// First rule matching a root-relative path, honoring exclusions.
    pub fn rule_for(&self, relative: &Path) -> Option<&ModuleRule> {
        rules::rule_for(&self.rules, relative)
    }

    /// Canonicalize `root` and absolutize `out_dir` against it.
    ///
    /// Must run after loading and before the config is handed to a build;
    /// the pipeline assumes absolute paths.
    pub fn resolve(mut self) -> Result<Self> {
        self.root = self
            .root
            .canonicalize()
            .map_err(|_| ConfigError::RootNotFound {
                path: self.root.clone(),
            })?;
        if self.out_dir.is_relative() {
            self.out_dir = self.root.join(&self.out_dir).clean();
        }
        Ok(self)
    }

    /// Check field-level invariants, with hints naming the offending value.
    pub fn validate(&self) -> Result<()> {
        if self.entry.is_empty() {
            return Err(ConfigError::invalid(
                "entry",
                "<empty>",
                "Set the entry module, e.g. entry = \"index.ts\"",
            ));
        }
        if Path::new(&self.entry).is_absolute() {
            return Err(ConfigError::invalid(
                "entry",
                &self.entry,
                "The entry must be relative to the project root",
            ));
        }

        if self.out_file.is_empty() {
            return Err(ConfigError::invalid(
                "out_file",
                "<empty>",
                "Set a non-empty bundle filename, e.g. out_file = \"index.js\"",
            ));
        }
        if self.out_file.contains('/') || self.out_file.contains('\\') {
            return Err(ConfigError::invalid(
                "out_file",
                &self.out_file,
                "The bundle filename must not contain path separators",
            ));
        }

        for ext in &self.extensions {
            if !ext.starts_with('.') || ext.len() < 2 {
                return Err(ConfigError::invalid(
                    "extensions",
                    ext.clone(),
                    "Extensions are dotted suffixes, e.g. \".ts\"",
                ));
            }
        }

        for rule in &self.rules {
            if rule.test.is_empty() {
                return Err(ConfigError::invalid(
                    "rules.test",
                    "[]",
                    "Each rule needs at least one extension to match",
                ));
            }
            if let Some(dotted) = rule.test.iter().find(|t| t.starts_with('.')) {
                return Err(ConfigError::invalid(
                    "rules.test",
                    dotted.clone(),
                    "Rule extensions are written without the leading dot",
                ));
            }
        }

        let mut staged_names: Vec<&str> = Vec::with_capacity(self.copy.len());
        for target in &self.copy {
            let path = Path::new(target);
            if target.is_empty() || path.is_absolute() {
                return Err(ConfigError::invalid(
                    "copy",
                    target.clone(),
                    "Copy targets are non-empty paths relative to the project root",
                ));
            }
            if path.components().any(|c| c.as_os_str() == "..") {
                return Err(ConfigError::invalid(
                    "copy",
                    target.clone(),
                    "Copy targets must not leave the project root",
                ));
            }
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name,
                None => {
                    return Err(ConfigError::invalid(
                        "copy",
                        target.clone(),
                        "Copy targets must name a file",
                    ));
                }
            };
            if name == self.out_file {
                return Err(ConfigError::invalid(
                    "copy",
                    target.clone(),
                    "A copy target may not overwrite the generated bundle",
                ));
            }
            if staged_names.contains(&name) {
                return Err(ConfigError::invalid(
                    "copy",
                    target.clone(),
                    "Two copy targets would land on the same output filename",
                ));
            }
            staged_names.push(name);
        }

        Ok(())
    }
}
