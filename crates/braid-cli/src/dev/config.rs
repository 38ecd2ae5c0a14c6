//! Configuration for the development server.

use std::net::{IpAddr, SocketAddr, TcpListener};

use braid_config::{BuildConfig, ConfigOverrides, Mode};

use crate::cli::ServeArgs;
use crate::error::Result;
use crate::ui;

/// Everything `braid serve` needs beyond the build configuration.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    /// Resolved build configuration the rebuild loop runs with.
    pub base: BuildConfig,

    /// Address the HTTP endpoint binds to.
    pub addr: SocketAddr,

    /// Launch a browser once the server is up.
    pub open: bool,

    /// Path names the watcher skips.
    pub watch_ignore: Vec<String>,

    /// Quiet window between change events for the same path.
    pub debounce_ms: u64,
}

impl ServeConfig {
    /// Resolve serve settings from CLI arguments, config file, and environment.
    pub fn from_args(args: &ServeArgs) -> Result<Self> {
        let overrides = ConfigOverrides {
            root: args.root.clone(),
            mode: args.production.then_some(Mode::Production),
            ..ConfigOverrides::default()
        };
        let base = braid_config::loading::load(&overrides, args.config.as_deref())?;

        let addr = find_available_port(args.host, args.port)?;
        let watch_ignore = default_ignore_patterns(&base);

        tracing::debug!(
            addr = %addr,
            root = %base.root.display(),
            "serve configuration resolved"
        );

        Ok(Self {
            base,
            addr,
            open: args.open,
            watch_ignore,
            debounce_ms: 100,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Bind to the requested port, or walk a small range above it.
fn find_available_port(host: IpAddr, requested: u16) -> Result<SocketAddr> {
    if requested < 1024 {
        ui::warning(&format!(
            "Port {requested} usually requires elevated privileges"
        ));
    }

    let addr = SocketAddr::new(host, requested);
    if TcpListener::bind(addr).is_ok() {
        return Ok(addr);
    }

    for offset in 1..=10 {
        let port = requested.saturating_add(offset);
        let addr = SocketAddr::new(host, port);
        if TcpListener::bind(addr).is_ok() {
            ui::warning(&format!("Port {requested} is busy, using {port} instead"));
            return Ok(addr);
        }
    }

    Err(braid_config::ConfigError::InvalidValue {
        field: "port".to_string(),
        value: requested.to_string(),
        hint: format!(
            "Ports {}-{} are all busy. Pick a different --port.",
            requested,
            requested.saturating_add(10)
        ),
    }
    .into())
}

/// Paths the watcher should never trigger a rebuild for.
///
/// Includes the output directory so the build's own writes do not loop.
fn default_ignore_patterns(config: &BuildConfig) -> Vec<String> {
    let mut patterns = vec![
        "node_modules".to_string(),
        ".git".to_string(),
        "target".to_string(),
        "*.log".to_string(),
        ".DS_Store".to_string(),
    ];
    let out_dir = config
        .out_dir
        .strip_prefix(&config.root)
        .ok()
        .and_then(|relative| relative.to_str())
        .filter(|name| !name.is_empty());
    if let Some(name) = out_dir {
        patterns.push(name.to_string());
    }
    patterns
}
