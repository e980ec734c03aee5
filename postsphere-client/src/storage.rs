use anyhow::Result;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::session::{Session, SessionStore};

/// Where the session survives between runs
pub trait StorageAdapter: Send + Sync {
    fn store_session(&self, session: &Session) -> Result<()>;

    fn load_session(&self) -> Result<Option<Session>>;

    fn clear_session(&self) -> Result<()>;
}

/// File-based storage backed by [`SessionStore`]
#[derive(Debug, Clone)]
pub struct FileStorageAdapter {
    session_store: SessionStore,
}

impl FileStorageAdapter {
    /// Uses the default `~/.postsphere` location
    pub fn new() -> Result<Self> {
        Ok(Self {
            session_store: SessionStore::new()?,
        })
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            session_store: SessionStore::in_dir(dir),
        }
    }
}

impl StorageAdapter for FileStorageAdapter {
    fn store_session(&self, session: &Session) -> Result<()> {
        self.session_store.save(session)
    }

    fn load_session(&self) -> Result<Option<Session>> {
        self.session_store.load()
    }

    fn clear_session(&self) -> Result<()> {
        self.session_store.delete()
    }
}

/// Keeps the session in memory only; it is gone when the process exits.
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorageAdapter {
    slot: Arc<Mutex<Option<Session>>>,
}

impl MemoryStorageAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageAdapter for MemoryStorageAdapter {
    fn store_session(&self, session: &Session) -> Result<()> {
        *self.slot.lock().unwrap_or_else(|p| p.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn load_session(&self) -> Result<Option<Session>> {
        Ok(self.slot.lock().unwrap_or_else(|p| p.into_inner()).clone())
    }

    fn clear_session(&self) -> Result<()> {
        *self.slot.lock().unwrap_or_else(|p| p.into_inner()) = None;
        Ok(())
    }
}

/// Factory for creating storage adapters
pub struct StorageAdapterFactory;

impl StorageAdapterFactory {
    /// Persistent runs use the file store, everything else stays in memory
    pub fn create_adapter(persist: bool) -> Result<Box<dyn StorageAdapter>> {
        if persist {
            Ok(Box::new(FileStorageAdapter::new()?))
        } else {
            log::info!("Session persistence disabled, keeping session in memory");
            Ok(Box::new(MemoryStorageAdapter::new()))
        }
    }
}
