//! Remote sync (v0.3.0).
//!
//! Authentication and remote storage are external collaborators behind
//! [`AuthProvider`] and [`RemoteStore`]. Local storage stays the source of
//! truth for this device; the remote copy is written through a
//! [`DebouncedWriter`] so a burst of changes produces one upsert after the
//! quiescence window.
//!
//! Known limitation: there is no conflict resolution. The last upsert wins,
//! so two devices editing inside the same window can lose one side's changes.

use crate::persistence::SavedBlob;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

/// Default quiescence window before a remote write
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(2);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("remote store is offline")]
    Offline,

    #[error("remote store rejected credentials")]
    Unauthorized,

    #[error("remote quota exceeded")]
    Quota,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("could not decode remote blob: {0}")]
    Decode(String),
}

/// Signed-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Remote blob storage keyed by user id
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// `Ok(None)` when the user has never uploaded anything
    async fn load(&self, user_id: &str) -> Result<Option<SavedBlob>, SyncError>;

    async fn upsert(&self, user_id: &str, blob: &SavedBlob) -> Result<(), SyncError>;
}

/// Source of the current session and of sign-in/out changes
pub trait AuthProvider: Send + Sync {
    fn session(&self) -> Option<Session>;

    /// Receives the new session on every sign-in or sign-out
    fn subscribe(&self) -> watch::Receiver<Option<Session>>;
}

/// Indicator shown next to the progress header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    LocalOnly,
    Pending,
    Syncing,
    Synced,
    Failed,
}

impl SyncStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SyncStatus::LocalOnly => "local only",
            SyncStatus::Pending => "pending",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Synced => "synced",
            SyncStatus::Failed => "sync failed",
        }
    }
}

// ============================================================================
// Debounced writer
// ============================================================================

/// Coalesces remote writes: each `schedule` cancels the pending timer and
/// starts a fresh one. A write that already fired is left to finish, but
/// only the newest scheduled write may publish a [`SyncStatus`].
pub struct DebouncedWriter {
    remote: Arc<dyn RemoteStore>,
    user_id: String,
    window: Duration,
    pending: Option<JoinHandle<()>>,
    status: watch::Sender<SyncStatus>,
    /// Bumped on every cancel; a write reports only while it matches
    generation: Arc<AtomicU64>,
}

impl DebouncedWriter {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        user_id: impl Into<String>,
        window: Duration,
        status: watch::Sender<SyncStatus>,
    ) -> Self {
        Self {
            remote,
            user_id: user_id.into(),
            window,
            pending: None,
            status,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Replace any pending write with one for `blob`.
    pub fn schedule(&mut self, blob: SavedBlob) {
        if self.cancel() {
            debug!(user = %self.user_id, "pending remote write superseded");
        }
        self.status.send_replace(SyncStatus::Pending);

        let ticket = Ticket {
            status: self.status.clone(),
            generation: Arc::clone(&self.generation),
            mine: self.generation.load(Ordering::SeqCst),
        };
        let remote = Arc::clone(&self.remote);
        let user_id = self.user_id.clone();
        let window = self.window;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            // Detached so a later cancel cannot interrupt a write in flight.
            tokio::spawn(push(remote, user_id, blob, ticket));
        }));
    }

    /// Abort the pending timer and retire any write already in flight.
    /// Returns true if a timer was still waiting.
    pub fn cancel(&mut self) -> bool {
        self.generation.fetch_add(1, Ordering::SeqCst);
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the timer and write `blob` now.
    pub async fn flush(&mut self, blob: &SavedBlob) -> Result<(), SyncError> {
        self.cancel();
        self.status.send_replace(SyncStatus::Syncing);
        let result = self.remote.upsert(&self.user_id, blob).await;
        self.status.send_replace(match result {
            Ok(()) => SyncStatus::Synced,
            Err(_) => SyncStatus::Failed,
        });
        result
    }
}

impl Drop for DebouncedWriter {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Status sender tagged with the generation its write was scheduled in
struct Ticket {
    status: watch::Sender<SyncStatus>,
    generation: Arc<AtomicU64>,
    mine: u64,
}

impl Ticket {
    fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.mine
    }

    fn publish(&self, value: SyncStatus) {
        if self.is_current() {
            self.status.send_replace(value);
        } else {
            debug!(status = value.label(), "newer write owns the status, not publishing");
        }
    }
}

#[instrument(level = "debug", skip(remote, blob, ticket))]
async fn push(remote: Arc<dyn RemoteStore>, user_id: String, blob: SavedBlob, ticket: Ticket) {
    ticket.publish(SyncStatus::Syncing);
    match remote.upsert(&user_id, &blob).await {
        Ok(()) => {
            debug!("remote write complete");
            ticket.publish(SyncStatus::Synced);
        }
        Err(e) => {
            warn!(error = %e, "remote write failed, local copy kept");
            ticket.publish(SyncStatus::Failed);
        }
    }
}

// ============================================================================
// Collaborator implementations
// ============================================================================

/// In-process remote store. Used by tests and offline demos.
#[derive(Default)]
pub struct MemoryRemote {
    blobs: Mutex<HashMap<String, SavedBlob>>,
    upserts: AtomicUsize,
    offline: AtomicBool,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(user_id: &str, blob: SavedBlob) -> Self {
        let remote = Self::new();
        if let Ok(mut blobs) = remote.blobs.lock() {
            blobs.insert(user_id.to_string(), blob);
        }
        remote
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn stored(&self, user_id: &str) -> Option<SavedBlob> {
        self.blobs.lock().ok()?.get(user_id).cloned()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn load(&self, user_id: &str) -> Result<Option<SavedBlob>, SyncError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SyncError::Offline);
        }
        let blobs = self
            .blobs
            .lock()
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        Ok(blobs.get(user_id).cloned())
    }

    async fn upsert(&self, user_id: &str, blob: &SavedBlob) -> Result<(), SyncError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SyncError::Offline);
        }
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.blobs
            .lock()
            .map_err(|e| SyncError::Transport(e.to_string()))?
            .insert(user_id.to_string(), blob.clone());
        Ok(())
    }
}

/// Directory-backed remote: one `<user_id>.json` per user, e.g. a synced folder.
pub struct DirRemote {
    dir: PathBuf,
}

impl DirRemote {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, user_id: &str) -> PathBuf {
        let safe: String = user_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

#[async_trait]
impl RemoteStore for DirRemote {
    async fn load(&self, user_id: &str) -> Result<Option<SavedBlob>, SyncError> {
        let path = self.path_for(user_id);
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| SyncError::Decode(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SyncError::Transport(e.to_string())),
        }
    }

    async fn upsert(&self, user_id: &str, blob: &SavedBlob) -> Result<(), SyncError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        let data = serde_json::to_string_pretty(blob).map_err(|e| SyncError::Transport(e.to_string()))?;
        tokio::fs::write(self.path_for(user_id), data)
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))
    }
}

/// Auth provider with a fixed, manually switched session.
pub struct StaticAuth {
    tx: watch::Sender<Option<Session>>,
}

impl StaticAuth {
    pub fn new(session: Option<Session>) -> Self {
        let (tx, _rx) = watch::channel(session);
        Self { tx }
    }

    pub fn sign_in(&self, session: Session) {
        self.tx.send_replace(Some(session));
    }

    pub fn sign_out(&self) {
        self.tx.send_replace(None);
    }
}

impl AuthProvider for StaticAuth {
    fn session(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_remote_roundtrip() {
        let remote = MemoryRemote::new();
        assert_eq!(remote.load("u1").await.unwrap(), None);

        let blob = SavedBlob {
            language: Some("en".to_string()),
            ..Default::default()
        };
        remote.upsert("u1", &blob).await.unwrap();
        assert_eq!(remote.load("u1").await.unwrap(), Some(blob));
        assert_eq!(remote.upsert_count(), 1);
    }

    #[tokio::test]
    async fn test_memory_remote_offline() {
        let remote = MemoryRemote::new();
        remote.set_offline(true);
        assert_eq!(remote.load("u1").await, Err(SyncError::Offline));
        assert!(remote.upsert("u1", &SavedBlob::default()).await.is_err());
        assert_eq!(remote.upsert_count(), 0);
    }

    #[tokio::test]
    async fn test_dir_remote_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let remote = DirRemote::new(dir.path());
        assert_eq!(remote.load("a/b").await.unwrap(), None);

        let blob = SavedBlob {
            theme: Some("dark".to_string()),
            ..Default::default()
        };
        remote.upsert("a/b", &blob).await.unwrap();
        assert!(dir.path().join("a_b.json").exists());
        assert_eq!(remote.load("a/b").await.unwrap(), Some(blob));
    }

    #[tokio::test]
    async fn test_dir_remote_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("u1.json"), "{ nope").unwrap();
        let remote = DirRemote::new(dir.path());
        assert!(matches!(remote.load("u1").await, Err(SyncError::Decode(_))));
    }

    #[test]
    fn test_static_auth_notifies() {
        let auth = StaticAuth::new(None);
        let mut rx = auth.subscribe();
        assert!(auth.session().is_none());

        auth.sign_in(Session::new("u1"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().map(|s| s.user_id.as_str()), Some("u1"));

        auth.sign_out();
        assert!(auth.session().is_none());
    }
}
