//! HTTP endpoint of the development server.
//!
//! Serves the latest successful build output, from the in-memory cache
//! first and the output directory second, and never replaces it with an
//! error page when a rebuild fails. Failures reach the browser through
//! the event stream; the reload client renders them as an overlay.

use std::convert::Infallible;
use std::path::Component;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tower_http::cors::{Any, CorsLayer};

use super::DevEvent;
use super::config::ServeConfig;
use super::state::SharedState;
use crate::error::{CliError, Result};
use crate::ui;

/// Script injected into every served HTML page.
const SCRIPT_TAG: &str = r#"<script src="/__braid/reload.js"></script>"#;

const RELOAD_SCRIPT: &str = include_str!("../../assets/reload-client.js");

/// The development HTTP server.
pub struct DevServer {
    config: ServeConfig,
    state: SharedState,
}

impl DevServer {
    pub fn new(config: ServeConfig, state: SharedState) -> Self {
        Self { config, state }
    }

    /// Bind and serve until the task is aborted.
    pub async fn start(self) -> Result<()> {
        let addr = self.config.addr;
        let url = self.config.server_url();
        let app = self.build_router();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|error| CliError::Server(format!("Failed to bind to {addr}: {error}")))?;
        ui::success(&format!("Development server running at {url}"));

        axum::serve(listener, app)
            .await
            .map_err(|error| CliError::Server(format!("Server error: {error}")))
    }

    fn build_router(self) -> Router {
        Router::new()
            .route("/__braid/events", get(handle_events))
            .route("/__braid/reload.js", get(handle_reload_script))
            .route("/__braid/status", get(handle_status))
            .route("/favicon.ico", get(handle_favicon))
            .fallback(handle_request)
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .with_state(self.state.clone())
    }
}

/// Server-Sent Events stream the reload client subscribes to.
async fn handle_events(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (id, rx) = state.register_client();
    ui::info(&format!("Client {id} connected"));
    state.broadcast(&DevEvent::ClientConnected { id }).await;

    let stream = ReceiverStream::new(rx).map(|data| Ok(Event::default().data(data)));
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

async fn handle_reload_script() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/javascript"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        RELOAD_SCRIPT,
    )
}

/// Current build status as JSON.
async fn handle_status(State(state): State<SharedState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        state.status_payload().to_string(),
    )
}

async fn handle_favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Serve a page or output file for any other path.
async fn handle_request(State(state): State<SharedState>, uri: Uri) -> Response {
    let path = uri.path();
    if path == "/" {
        return serve_page(&state).await;
    }

    if let Some(contents) = state.get_cached_file(path) {
        return file_response(path, contents);
    }
    if let Some(contents) = read_from_out_dir(&state, path).await {
        return file_response(path, contents);
    }

    (StatusCode::NOT_FOUND, format!("File not found: {path}")).into_response()
}

async fn serve_page(state: &SharedState) -> Response {
    if let Some(contents) = state.get_cached_file("/index.html") {
        return file_response("/index.html", contents);
    }
    if let Some(contents) = read_from_out_dir(state, "/index.html").await {
        return file_response("/index.html", contents);
    }

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        fallback_page(state.bundle_path()),
    )
        .into_response()
}

fn file_response(path: &str, contents: Vec<u8>) -> Response {
    let content_type = content_type_for(path);
    let body = if content_type.starts_with("text/html") {
        inject_reload_script(&contents)
    } else {
        contents
    };
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response()
}

/// Strip the leading slash and refuse anything that is not a plain
/// relative path.
fn sanitize_request_path(path: &str) -> Option<&str> {
    let relative = path.trim_start_matches('/');
    if relative.is_empty() {
        return None;
    }
    let all_normal = std::path::Path::new(relative)
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    all_normal.then_some(relative)
}

async fn read_from_out_dir(state: &SharedState, path: &str) -> Option<Vec<u8>> {
    let relative = sanitize_request_path(path)?;
    let candidate = state.out_dir().join(relative);
    if !candidate.is_file() {
        return None;
    }
    tokio::fs::read(candidate).await.ok()
}

/// Splice the reload script into an HTML document.
fn inject_reload_script(contents: &[u8]) -> Vec<u8> {
    let html = String::from_utf8_lossy(contents);
    match html.rfind("</body>") {
        Some(index) => {
            let mut injected = String::with_capacity(html.len() + SCRIPT_TAG.len() + 8);
            injected.push_str(&html[..index]);
            injected.push_str("  ");
            injected.push_str(SCRIPT_TAG);
            injected.push('\n');
            injected.push_str(&html[index..]);
            injected.into_bytes()
        }
        None => {
            let mut injected = html.into_owned();
            injected.push('\n');
            injected.push_str(SCRIPT_TAG);
            injected.into_bytes()
        }
    }
}

/// Minimal page served when the project ships no index.html.
fn fallback_page(bundle_path: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>braid</title>
  </head>
  <body>
    <div id="root"></div>
    <script src="{bundle_path}"></script>
    {SCRIPT_TAG}
  </body>
</html>
"#
    )
}

fn content_type_for(path: &str) -> &'static str {
    let extension = path.rsplit('.').next().unwrap_or("");
    match extension {
        "wasm" => "application/wasm",
        "js" | "mjs" => "application/javascript",
        "json" | "map" => "application/json",
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "ico" => "image/x-icon",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_script_lands_before_the_body_closes() {
        let html = b"<html><body><h1>hi</h1></body></html>";
        let injected = String::from_utf8(inject_reload_script(html)).unwrap();

        let script = injected.find(SCRIPT_TAG).unwrap();
        let close = injected.find("</body>").unwrap();
        assert!(script < close);
    }

    #[test]
    fn reload_script_is_appended_without_a_body_tag() {
        let injected = String::from_utf8(inject_reload_script(b"<h1>bare</h1>")).unwrap();
        assert!(injected.starts_with("<h1>bare</h1>"));
        assert!(injected.ends_with(SCRIPT_TAG));
    }

    #[test]
    fn request_paths_stay_inside_the_output_directory() {
        assert_eq!(sanitize_request_path("/index.js"), Some("index.js"));
        assert_eq!(
            sanitize_request_path("/assets/logo.svg"),
            Some("assets/logo.svg")
        );
        assert_eq!(sanitize_request_path("/"), None);
        assert_eq!(sanitize_request_path("/../secret"), None);
        assert_eq!(sanitize_request_path("/a/../../secret"), None);
    }

    #[test]
    fn content_types_cover_the_output_surface() {
        assert_eq!(content_type_for("/index.js"), "application/javascript");
        assert_eq!(content_type_for("/pkg/app.wasm"), "application/wasm");
        assert_eq!(content_type_for("/index.html"), "text/html; charset=utf-8");
        assert_eq!(content_type_for("/index.js.map"), "application/json");
        assert_eq!(content_type_for("/unknown"), "application/octet-stream");
    }

    #[test]
    fn fallback_page_loads_the_bundle_and_the_reload_client() {
        let page = fallback_page("/index.js");
        assert!(page.contains(r#"<script src="/index.js"></script>"#));
        assert!(page.contains(SCRIPT_TAG));
    }
}
