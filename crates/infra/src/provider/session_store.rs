//! Local session mirror storage
//!
//! The provider session is mirrored to disk so an existing login survives
//! process restarts. The trait keeps the storage backend swappable; tests
//! and ephemeral deployments use the in-memory store.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uninest_domain::{Result, Session, UniNestError};

/// Trait for persisting the local session mirror
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the stored session, if any
    async fn load(&self) -> Result<Option<Session>>;

    /// Persist the session
    async fn save(&self, session: &Session) -> Result<()>;

    /// Remove the stored session
    async fn clear(&self) -> Result<()>;
}

/// JSON-file-backed session store
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<Session>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(UniNestError::Storage(format!(
                    "failed to read session mirror {}: {err}",
                    self.path.display()
                )))
            }
        };

        match serde_json::from_slice::<Session>(&bytes) {
            Ok(session) => Ok(Some(session)),
            Err(err) => {
                // A corrupt mirror is not worth failing startup over; treat
                // it as signed out and let the next login rewrite it.
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "session mirror unreadable, ignoring"
                );
                Ok(None)
            }
        }
    }

    async fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|err| {
                    UniNestError::Storage(format!(
                        "failed to create session mirror directory {}: {err}",
                        parent.display()
                    ))
                })?;
            }
        }

        let json = serde_json::to_vec_pretty(session)
            .map_err(|err| UniNestError::Internal(format!("session serialization failed: {err}")))?;

        tokio::fs::write(&self.path, json).await.map_err(|err| {
            UniNestError::Storage(format!(
                "failed to write session mirror {}: {err}",
                self.path.display()
            ))
        })?;

        debug!(path = %self.path.display(), "session mirror written");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(UniNestError::Storage(format!(
                "failed to remove session mirror {}: {err}",
                self.path.display()
            ))),
        }
    }
}

/// In-memory session store for tests and ephemeral deployments
#[derive(Default)]
pub struct MemorySessionStore {
    inner: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the store with a session
    pub fn with_session(session: Session) -> Self {
        Self { inner: RwLock::new(Some(session)) }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<Session>> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, session: &Session) -> Result<()> {
        *self.inner.write().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.inner.write().await = None;
        Ok(())
    }
}
