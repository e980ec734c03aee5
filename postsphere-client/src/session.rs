use anyhow::{Context, Result};
use postsphere_types::{User, UserId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

const MIN_TOKEN_LEN: usize = 8;
const MAX_TOKEN_LEN: usize = 4096;

/// The logged-in user together with the bearer token the server issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub token: String,
    pub user_id: UserId,
}

impl Session {
    pub fn new(user: User, token: impl Into<String>) -> Self {
        let user_id = user.id;
        Self {
            user,
            token: token.into(),
            user_id,
        }
    }

    pub fn username(&self) -> &str {
        &self.user.username
    }
}

/// Process-wide view of the current session.
///
/// Clones share the same slot, so the HTTP client and every controller observe
/// a login or logout as soon as it happens. Anyone can read; only the auth
/// flow writes.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handle that starts out authenticated.
    pub fn restored(session: Session) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(session))),
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    pub fn token(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.token.clone())
    }

    pub fn username(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.user.username.clone())
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.read().as_ref().map(|s| s.user_id)
    }

    pub(crate) fn set(&self, session: Session) {
        *self.write() = Some(session);
    }

    pub(crate) fn clear(&self) {
        *self.write() = None;
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<Session>> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<Session>> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Persists the session in the user's home directory.
///
/// The session is stored as JSON in `~/.postsphere/session.json` with 0600
/// permissions so only the owner can read the bearer token.
#[derive(Debug, Clone)]
pub struct SessionStore {
    file_path: PathBuf,
}

impl SessionStore {
    /// Creates a new SessionStore with the default path `~/.postsphere/session.json`.
    ///
    /// # Returns
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(Self::in_dir(home_dir.join(".postsphere")))
    }

    /// Creates a store that keeps `session.json` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            file_path: dir.as_ref().join("session.json"),
        }
    }

    /// Loads the persisted session.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(session))` if the file exists and holds a plausible session
    /// - `Ok(None)` if the file doesn't exist or is corrupted
    /// - `Err(_)` if the file cannot be read
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.file_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.file_path).context("Failed to read session file")?;

        if content.trim().is_empty() {
            log::warn!("Session file is empty, treating as no session");
            return Ok(None);
        }

        let session: Session = match serde_json::from_str(&content) {
            Ok(session) => session,
            Err(e) => {
                log::warn!("Session file is not valid JSON ({}), treating as corrupted", e);
                return Ok(None);
            }
        };

        let token = session.token.trim();
        if token.len() < MIN_TOKEN_LEN || token.len() > MAX_TOKEN_LEN {
            log::warn!("Session token has invalid length: {}, treating as corrupted", token.len());
            return Ok(None);
        }

        if token.chars().any(|c| c.is_control()) {
            log::warn!("Session token contains control characters, treating as corrupted");
            return Ok(None);
        }

        if session.user_id != session.user.id {
            log::warn!("Session user id does not match stored user, treating as corrupted");
            return Ok(None);
        }

        log::debug!("Loaded session for {} from {}", session.user.username, self.file_path.display());
        Ok(Some(session))
    }

    /// Saves the session with 0600 permissions.
    ///
    /// This method:
    /// - Creates the parent directory if it doesn't exist
    /// - Removes any old/stale session files
    /// - Writes to a temporary file and renames it into place
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).context("Failed to create session directory")?;
        }

        self.cleanup_old_files()?;

        let json = serde_json::to_string_pretty(session).context("Failed to serialize session")?;
        let temp_path = self.file_path.with_extension("tmp");

        let mut file = fs::File::create(&temp_path).context("Failed to create temporary session file")?;
        file.write_all(json.as_bytes()).context("Failed to write session")?;
        file.sync_all().context("Failed to sync session file to disk")?;
        drop(file);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&temp_path, permissions)
                .context("Failed to set session file permissions")?;
        }

        fs::rename(&temp_path, &self.file_path).context("Failed to rename temporary session file")?;

        log::info!("Saved session to {}", self.file_path.display());
        Ok(())
    }

    /// Deletes the session file. Succeeds even if the file doesn't exist.
    pub fn delete(&self) -> Result<()> {
        if self.file_path.exists() {
            fs::remove_file(&self.file_path).context("Failed to delete session file")?;
            log::info!("Deleted session file at {}", self.file_path.display());
        } else {
            log::debug!("Session file does not exist, nothing to delete");
        }
        Ok(())
    }

    /// Removes leftover `session*` files (temporary writes, backups) so only
    /// one session file exists per user.
    fn cleanup_old_files(&self) -> Result<()> {
        let Some(parent) = self.file_path.parent() else {
            return Ok(());
        };
        if !parent.exists() {
            return Ok(());
        }

        let entries = fs::read_dir(parent).context("Failed to read session directory")?;

        for entry in entries {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path == self.file_path {
                continue;
            }

            if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
                if file_name.starts_with("session") {
                    log::debug!("Removing stale session file: {}", path.display());
                    if let Err(e) = fs::remove_file(&path) {
                        log::warn!("Failed to remove old session file {}: {}", path.display(), e);
                    }
                }
            }
        }

        Ok(())
    }

    pub fn path(&self) -> &PathBuf {
        &self.file_path
    }
}
