//! Module rules: which loader runs for which file.
//!
//! Rules are evaluated in declared order and the first match wins. A rule
//! matches on the file extension and can opt out for files whose path
//! contains an excluded component (the classic case: `node_modules`).

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Transformation applied to a matched source file.
///
/// This is a closed set: braid knows how to lower TypeScript and how to
/// syntax-check plain JavaScript, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Loader {
    /// Strip and lower TypeScript/TSX syntax to plain JavaScript.
    TypeScript,
    /// Parse for syntax errors, pass the source through unchanged.
    JavaScript,
}

impl Loader {
    pub fn as_str(self) -> &'static str {
        match self {
            Loader::TypeScript => "typescript",
            Loader::JavaScript => "javascript",
        }
    }
}

/// One entry in the ordered rule list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRule {
    /// Extensions this rule applies to, without the leading dot.
    pub test: Vec<String>,
    /// Loader to run on matched files.
    pub loader: Loader,
    /// Path components that exempt a file from this rule.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl ModuleRule {
    /// Rule for lowering TypeScript sources outside dependency directories.
    pub fn typescript() -> Self {
        Self {
            test: vec!["ts".into(), "tsx".into()],
            loader: Loader::TypeScript,
            exclude: vec!["node_modules".into()],
        }
    }

    /// Whether this rule's extension pattern matches `ext` (no dot).
    pub fn matches_extension(&self, ext: &str) -> bool {
        self.test.iter().any(|t| t == ext)
    }

    /// Whether `relative` (a root-relative path) is exempted from this rule.
    ///
    /// A path is excluded when any of its components equals an `exclude`
    /// entry, so `node_modules` covers `node_modules/x.ts` as well as
    /// `vendor/node_modules/y.ts`.
    pub fn is_excluded(&self, relative: &Path) -> bool {
        if self.exclude.is_empty() {
            return false;
        }
        relative.components().any(|component| {
            component
                .as_os_str()
                .to_str()
                .is_some_and(|name| self.exclude.iter().any(|e| e == name))
        })
    }
}

/// Find the first rule matching a root-relative path, honoring exclusions.
pub fn rule_for<'a>(rules: &'a [ModuleRule], relative: &Path) -> Option<&'a ModuleRule> {
    let ext = relative.extension()?.to_str()?;
    rules
        .iter()
        .find(|rule| rule.matches_extension(ext) && !rule.is_excluded(relative))
}
