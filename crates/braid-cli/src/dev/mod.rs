//! Development server internals.
//!
//! Four pieces cooperate under `braid serve`: a debounced file watcher, a
//! shared state cell tracking the serve status and the in-memory output
//! cache, an axum HTTP endpoint with a Server-Sent Events reload channel,
//! and the configuration tying them together.

pub mod config;
pub mod server;
pub mod state;
pub mod watcher;

pub use config::ServeConfig;
pub use server::DevServer;
pub use state::{BundleCache, ServeState, ServeStatus, SharedState};
pub use watcher::{FileChange, FileWatcher};

use serde::{Deserialize, Serialize};

/// Events broadcast to connected reload clients.
///
/// Serialized as JSON with a `type` tag; the reload client switches on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DevEvent {
    /// A rebuild started.
    BuildStarted,

    /// A rebuild finished and the output directory is fresh.
    BuildCompleted { duration_ms: u64 },

    /// A rebuild failed; the previous output stays served.
    BuildFailed { kind: String, error: String },

    /// A reload client connected to the event stream.
    ClientConnected { id: usize },
}
