//! Build mode selection.
//!
//! `Mode` is a pure function of the `production` input. It controls exactly
//! two downstream behaviors: whether the linked bundle is minified and
//! whether debug instrumentation (module banners, mode logging) is emitted.
//! Nothing else is allowed to branch on it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Optimization profile for a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Readable output, module banners, verbose diagnostics.
    #[default]
    Development,
    /// Minified output, no debug instrumentation.
    Production,
}

impl Mode {
    /// Map the boolean `production` input to a mode.
    pub fn from_production(production: bool) -> Self {
        if production {
            Mode::Production
        } else {
            Mode::Development
        }
    }

    /// Whether the linked bundle should be minified.
    pub fn minify(self) -> bool {
        matches!(self, Mode::Production)
    }

    /// Whether debug instrumentation (module banners, resolved-mode logging)
    /// should be included in the build.
    pub fn debug_info(self) -> bool {
        matches!(self, Mode::Development)
    }

    /// Stable lowercase name, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Production => "production",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
