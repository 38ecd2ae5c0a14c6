//! The `braid serve` command.
//!
//! Runs an initial build, then rebuilds on file changes while an HTTP
//! endpoint serves the output. A failed build never takes the server
//! down or replaces its output; the last good build stays served until
//! the next success.

use std::sync::Arc;
use std::time::Instant;

use braid_config::BuildConfig;
use tokio::signal;

use crate::cli::ServeArgs;
use crate::dev::{
    BundleCache, DevEvent, DevServer, FileChange, FileWatcher, ServeConfig, ServeState,
    SharedState,
};
use crate::error::Result;
use crate::ui;

pub async fn execute(args: ServeArgs) -> Result<()> {
    let config = ServeConfig::from_args(&args)?;
    ui::info(&format!(
        "Serving {} from {}",
        config.base.entry,
        config.base.root.display()
    ));

    let state: SharedState = Arc::new(ServeState::new(
        config.base.out_dir.clone(),
        bundle_url(&config.base.out_file),
    ));

    if !run_build(&config.base, &state).await {
        ui::warning("Initial build failed; the server starts anyway and rebuilds on changes");
    }

    let (watcher, mut change_rx) = FileWatcher::new(
        config.base.root.clone(),
        config.watch_ignore.clone(),
        config.debounce_ms,
    )?;
    ui::info(&format!("Watching {}", watcher.root().display()));

    let server = DevServer::new(config.clone(), state.clone());
    let mut server_handle = tokio::spawn(async move {
        if let Err(error) = server.start().await {
            ui::error(&format!("Server error: {error}"));
        }
    });

    if config.open {
        open_browser(&config.server_url());
    }
    ui::info("Press Ctrl+C to stop");

    loop {
        tokio::select! {
            Some(change) = change_rx.recv() => {
                handle_file_change(change, &config.base, &state).await;
            }
            _ = signal::ctrl_c() => {
                ui::info("Shutting down the development server...");
                server_handle.abort();
                break;
            }
            _ = &mut server_handle => {
                ui::warning("Server task ended unexpectedly");
                break;
            }
        }
    }

    ui::success("Development server stopped");
    Ok(())
}

async fn handle_file_change(change: FileChange, config: &BuildConfig, state: &SharedState) {
    ui::info(&format!("File changed: {}", change.path().display()));
    run_build(config, state).await;
}

/// Run one build, refresh the shared state, and notify clients.
///
/// Builds in memory first and only touch the output directory on
/// success, so the served files are never half-written.
async fn run_build(config: &BuildConfig, state: &SharedState) -> bool {
    let started = Instant::now();
    state.mark_building();
    state.broadcast(&DevEvent::BuildStarted).await;

    let build_config = config.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        braid_bundler::build_in_memory(&build_config).and_then(|(_, artifact)| {
            artifact.write_to(&build_config.out_dir)?;
            Ok(artifact)
        })
    })
    .await;

    match outcome {
        Ok(Ok(artifact)) => {
            let duration_ms = started.elapsed().as_millis() as u64;
            state.update_cache(BundleCache::from_artifact(&artifact));
            state.mark_ready(duration_ms);
            ui::success(&format!(
                "Build finished in {}",
                ui::format_duration(started.elapsed())
            ));
            state
                .broadcast(&DevEvent::BuildCompleted { duration_ms })
                .await;
            true
        }
        Ok(Err(error)) => {
            let kind = error.kind().to_string();
            let message = error.to_string();
            tracing::warn!(kind = %kind, "build failed; previous output stays served");
            ui::error(&format!("Build failed: {message}"));
            state.mark_stale(kind.clone(), message.clone());
            state
                .broadcast(&DevEvent::BuildFailed {
                    kind,
                    error: message,
                })
                .await;
            false
        }
        Err(join_error) => {
            let message = format!("Build task failed: {join_error}");
            ui::error(&message);
            state.mark_stale("internal".to_string(), message.clone());
            state
                .broadcast(&DevEvent::BuildFailed {
                    kind: "internal".to_string(),
                    error: message,
                })
                .await;
            false
        }
    }
}

/// URL path the bundle is served under.
fn bundle_url(out_file: &str) -> String {
    format!("/{out_file}")
}

fn open_browser(url: &str) {
    let result = if cfg!(target_os = "macos") {
        std::process::Command::new("open").arg(url).spawn()
    } else if cfg!(target_os = "windows") {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
    } else {
        std::process::Command::new("xdg-open").arg(url).spawn()
    };

    match result {
        Ok(_) => ui::info(&format!("Opened {url} in your browser")),
        Err(error) => ui::warning(&format!("Could not open a browser: {error}")),
    }
}
