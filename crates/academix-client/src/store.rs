//! Session store adapters
//!
//! Implements the `SessionStore` port twice: a JSON file store so the
//! session survives a process restart, and an in-memory store for tests and
//! ephemeral embedding. Both persist and clear the whole record atomically
//! from the caller's point of view.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use async_trait::async_trait;
use tracing::debug;

use academix_core::domain::StoredSession;
use academix_core::ports::SessionStore;

/// Persists the session as a JSON file
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write never leaves a truncated session file behind.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Creates a store backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Platform-appropriate default path for the session file.
    ///
    /// Typically `$XDG_DATA_HOME/academix/session.json` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("academix")
            .join("session.json")
    }

    /// Returns the backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> anyhow::Result<Option<StoredSession>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => {
                let session: StoredSession = serde_json::from_str(&json)
                    .context("Failed to deserialize session file")?;
                debug!(path = %self.path.display(), "Loaded persisted session");
                Ok(Some(session))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to read session file")),
        }
    }

    async fn save(&self, session: &StoredSession) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create session directory")?;
        }

        let json = serde_json::to_string_pretty(session)
            .context("Failed to serialize session")?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .context("Failed to write session file")?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .context("Failed to move session file into place")?;

        debug!(path = %self.path.display(), "Persisted session");
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Cleared persisted session");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to remove session file")),
        }
    }
}

/// Keeps the session in memory only
#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<StoredSession>>,
}

impl MemorySessionStore {
    /// Creates an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with a session
    pub fn with_session(session: StoredSession) -> Self {
        Self {
            inner: Mutex::new(Some(session)),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> anyhow::Result<Option<StoredSession>> {
        Ok(self.inner.lock().unwrap().clone())
    }

    async fn save(&self, session: &StoredSession) -> anyhow::Result<()> {
        *self.inner.lock().unwrap() = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        *self.inner.lock().unwrap() = None;
        Ok(())
    }
}
