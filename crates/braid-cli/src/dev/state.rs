//! Shared state for the development server.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::json;
use tokio::sync::mpsc;

use super::DevEvent;

/// Where the current serve session stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServeStatus {
    /// No build has run yet.
    Idle,

    /// A build is in flight.
    Building,

    /// The last build succeeded.
    Ready { duration_ms: u64 },

    /// The last build failed; the previously written output stays served.
    Stale { kind: String, error: String },
}

impl ServeStatus {
    pub fn is_building(&self) -> bool {
        matches!(self, ServeStatus::Building)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ServeStatus::Ready { .. })
    }

    /// The error message when the last build failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            ServeStatus::Stale { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// In-memory copy of the latest successful build output, keyed by URL path.
#[derive(Debug, Default, Clone)]
pub struct BundleCache {
    files: HashMap<String, Vec<u8>>,
}

impl BundleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot every file of a build artifact under its `/`-prefixed name.
    pub fn from_artifact(artifact: &braid_bundler::OutputArtifact) -> Self {
        let mut cache = Self::new();
        for file in artifact.files() {
            cache.insert(format!("/{}", file.name), file.contents.clone());
        }
        cache
    }

    pub fn insert(&mut self, path: String, contents: Vec<u8>) {
        self.files.insert(path, contents);
    }

    pub fn get(&self, path: &str) -> Option<&Vec<u8>> {
        self.files.get(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// State shared between the HTTP endpoint, the watcher loop, and rebuilds.
pub struct ServeState {
    status: RwLock<ServeStatus>,
    cache: RwLock<BundleCache>,
    clients: RwLock<HashMap<usize, mpsc::Sender<String>>>,
    next_client_id: RwLock<usize>,
    out_dir: PathBuf,
    bundle_path: String,
}

/// Handle passed to the server task and the rebuild loop.
pub type SharedState = Arc<ServeState>;

impl ServeState {
    pub fn new(out_dir: PathBuf, bundle_path: String) -> Self {
        Self {
            status: RwLock::new(ServeStatus::Idle),
            cache: RwLock::new(BundleCache::new()),
            clients: RwLock::new(HashMap::new()),
            next_client_id: RwLock::new(0),
            out_dir,
            bundle_path,
        }
    }

    pub fn mark_building(&self) {
        *self.status.write() = ServeStatus::Building;
    }

    pub fn mark_ready(&self, duration_ms: u64) {
        *self.status.write() = ServeStatus::Ready { duration_ms };
    }

    pub fn mark_stale(&self, kind: String, error: String) {
        *self.status.write() = ServeStatus::Stale { kind, error };
    }

    pub fn status(&self) -> ServeStatus {
        self.status.read().clone()
    }

    /// JSON body for the status endpoint.
    pub fn status_payload(&self) -> serde_json::Value {
        match &*self.status.read() {
            ServeStatus::Idle => json!({ "state": "idle" }),
            ServeStatus::Building => json!({ "state": "building" }),
            ServeStatus::Ready { duration_ms } => {
                json!({ "state": "ok", "duration_ms": duration_ms })
            }
            ServeStatus::Stale { kind, error } => {
                json!({ "state": "stale", "kind": kind, "error": error })
            }
        }
    }

    /// Replace the in-memory output with a fresh snapshot.
    pub fn update_cache(&self, cache: BundleCache) {
        *self.cache.write() = cache;
    }

    pub fn get_cached_file(&self, path: &str) -> Option<Vec<u8>> {
        self.cache.read().get(path).cloned()
    }

    /// Register a reload client and hand back its event receiver.
    pub fn register_client(&self) -> (usize, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(100);
        let id = {
            let mut next = self.next_client_id.write();
            let id = *next;
            *next += 1;
            id
        };
        self.clients.write().insert(id, tx);
        (id, rx)
    }

    pub fn unregister_client(&self, id: usize) {
        self.clients.write().remove(&id);
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Send an event to every connected client, dropping the ones that went away.
    pub async fn broadcast(&self, event: &DevEvent) {
        let payload = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
        let clients: Vec<(usize, mpsc::Sender<String>)> = self
            .clients
            .read()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut disconnected = Vec::new();
        for (id, tx) in clients {
            if tx.send(payload.clone()).await.is_err() {
                disconnected.push(id);
            }
        }
        for id in disconnected {
            self.unregister_client(id);
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// URL path of the bundle, for pages generated by the endpoint.
    pub fn bundle_path(&self) -> &str {
        &self.bundle_path
    }
}
