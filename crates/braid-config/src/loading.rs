//! Layered configuration loading.
//!
//! Priority, lowest to highest: factory defaults, `braid.toml`, `BRAID_*`
//! environment variables, explicit overrides from the command line. The
//! `BRAID_PRODUCTION` variable is the environment spelling of the
//! `production` factory input; an explicit `--production` flag still wins.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format as _, Serialized, Toml},
    Figment,
};
use tracing::debug;

use crate::{BuildConfig, ConfigError, Mode, Result, CONFIG_FILE};

/// Explicit values from the command line, merged over every other source.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root: Option<PathBuf>,
    pub mode: Option<Mode>,
    pub entry: Option<String>,
    pub out_dir: Option<PathBuf>,
    pub out_file: Option<String>,
    pub wasm: Option<bool>,
    pub clean: Option<bool>,
}

impl ConfigOverrides {
    /// Overrides carrying only the mode derived from a `production` flag.
    pub fn production(production: bool) -> Self {
        Self {
            mode: Some(Mode::from_production(production)),
            ..Self::default()
        }
    }
}

/// Load, validate and resolve a [`BuildConfig`].
///
/// `config_path` forces a specific file; otherwise `braid.toml` under the
/// (possibly overridden) project root is used when present.
pub fn load(overrides: &ConfigOverrides, config_path: Option<&Path>) -> Result<BuildConfig> {
    let root = overrides
        .root
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    let mut figment = Figment::new().merge(Serialized::defaults(BuildConfig::for_mode(false)));

    let config_file = match config_path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::invalid(
                    "config",
                    path.display().to_string(),
                    "The configuration file passed with --config does not exist",
                ));
            }
            Some(path.to_path_buf())
        }
        None => {
            let default_path = root.join(CONFIG_FILE);
            default_path.exists().then_some(default_path)
        }
    };
    if let Some(path) = config_file {
        debug!(file = %path.display(), "loading configuration file");
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("BRAID_"));
    if let Some(production) = production_from_env() {
        figment = figment.merge(("mode", Mode::from_production(production)));
    }

    figment = figment.merge(("root", &root));
    if let Some(mode) = overrides.mode {
        figment = figment.merge(("mode", mode));
    }
    if let Some(entry) = &overrides.entry {
        figment = figment.merge(("entry", entry));
    }
    if let Some(out_dir) = &overrides.out_dir {
        figment = figment.merge(("out_dir", out_dir));
    }
    if let Some(out_file) = &overrides.out_file {
        figment = figment.merge(("out_file", out_file));
    }
    if let Some(wasm) = overrides.wasm {
        figment = figment.merge(("wasm", wasm));
    }
    if let Some(clean) = overrides.clean {
        figment = figment.merge(("clean", clean));
    }

    let config: BuildConfig = figment.extract().map_err(|e| ConfigError::Extract {
        reason: e.to_string(),
    })?;
    config.validate()?;
    config.resolve()
}

/// Read `BRAID_PRODUCTION` as a boolean, `None` when unset or unparsable.
fn production_from_env() -> Option<bool> {
    let value = std::env::var("BRAID_PRODUCTION").ok()?;
    parse_bool(&value)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Loader;

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("banana"), None);
    }

    #[test]
    fn defaults_load_without_any_file() {
        figment::Jail::expect_with(|_jail| {
            let config = load(&ConfigOverrides::default(), None).unwrap();
            assert_eq!(config.mode, Mode::Development);
            assert_eq!(config.entry, "index.ts");
            assert!(config.out_dir.ends_with("dist"));
            Ok(())
        });
    }

    #[test]
    fn config_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "braid.toml",
                r#"
                entry = "main.ts"
                out_file = "app.js"
                wasm = false

                [[rules]]
                test = ["ts"]
                loader = "javascript"
                "#,
            )?;
            let config = load(&ConfigOverrides::default(), None).unwrap();
            assert_eq!(config.entry, "main.ts");
            assert_eq!(config.out_file, "app.js");
            assert!(!config.wasm);
            assert_eq!(config.rules.len(), 1);
            assert_eq!(config.rules[0].loader, Loader::JavaScript);
            Ok(())
        });
    }

    #[test]
    fn environment_beats_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("braid.toml", "entry = \"main.ts\"")?;
            jail.set_env("BRAID_ENTRY", "other.ts");
            let config = load(&ConfigOverrides::default(), None).unwrap();
            assert_eq!(config.entry, "other.ts");
            Ok(())
        });
    }

    #[test]
    fn braid_production_env_selects_mode() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("BRAID_PRODUCTION", "true");
            let config = load(&ConfigOverrides::default(), None).unwrap();
            assert_eq!(config.mode, Mode::Production);
            Ok(())
        });
    }

    #[test]
    fn explicit_flag_beats_environment() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("BRAID_PRODUCTION", "true");
            let overrides = ConfigOverrides::production(false);
            let config = load(&overrides, None).unwrap();
            assert_eq!(config.mode, Mode::Development);
            Ok(())
        });
    }

    #[test]
    fn missing_explicit_config_file_errors() {
        figment::Jail::expect_with(|_jail| {
            let err = load(
                &ConfigOverrides::default(),
                Some(Path::new("nope/braid.toml")),
            )
            .unwrap_err();
            assert!(err.to_string().contains("does not exist"));
            Ok(())
        });
    }

    #[test]
    fn invalid_field_type_reports_extract_error() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("braid.toml", "wasm = \"maybe\"")?;
            let err = load(&ConfigOverrides::default(), None).unwrap_err();
            assert!(matches!(err, ConfigError::Extract { .. }));
            Ok(())
        });
    }
}
