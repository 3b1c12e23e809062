//! Durable session storage with token-budget rotation.
//!
//! [`SessionStore`] owns the single current session and every persisted
//! session file under its directory. Sessions are stored as
//! `{dir}/{session_id}.json` with atomic writes (temp file + fsync +
//! rename) so a failed write never corrupts the previously durable
//! state. A `current` pointer file names the active session; startup
//! falls back to the most recently modified session file when the
//! pointer is missing or dangling.
//!
//! All mutating access is serialized through one internal async mutex.
//! No other component reads or writes session files directly.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{info, warn};

use super::types::{Message, Role, Session, SessionId, estimate_tokens};
use crate::error::{Result, SirisError};

/// Name of the pointer file recording the current session id.
const POINTER_FILE: &str = "current";

/// Durable store for conversation sessions.
///
/// Exactly one session is current at any time after [`open`](Self::open)
/// succeeds. Appending past the token budget rotates: the overflowing
/// message is persisted to the retiring session first, then a fresh
/// empty session becomes current. Retired sessions stay on disk and are
/// never deleted here.
pub struct SessionStore {
    dir: PathBuf,
    budget: u64,
    current: Mutex<Option<Session>>,
}

impl SessionStore {
    /// Open a store rooted at `dir` with the given token budget.
    ///
    /// Creates the directory if needed, then makes the most recent
    /// persisted session current, or creates a fresh one if none exists.
    /// Unreadable or corrupt session files are logged and treated as
    /// absent; `open` never yields a store without a current session.
    ///
    /// # Errors
    ///
    /// Returns an error only if the directory cannot be created or the
    /// initial session cannot be written.
    pub async fn open(dir: impl Into<PathBuf>, budget: u64) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            SirisError::Session(format!(
                "failed to create session directory {}: {e}",
                dir.display()
            ))
        })?;

        let store = Self {
            dir,
            budget,
            current: Mutex::new(None),
        };

        let mut slot = store.current.lock().await;
        match store.discover_latest() {
            Some(session) => {
                info!(id = %session.id, name = %session.name, "loaded session");
                store.write_pointer(&session.id)?;
                *slot = Some(session);
            }
            None => {
                store.create_locked(&mut slot, None)?;
            }
        }
        drop(slot);

        Ok(store)
    }

    /// Create a fresh session and make it current.
    ///
    /// The session gets a new id, the timestamp default name unless one
    /// is given, no messages, and a zero token counter. It is persisted
    /// before this call returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be written.
    pub async fn create_session(&self, name: Option<&str>) -> Result<SessionId> {
        let mut slot = self.current.lock().await;
        self.create_locked(&mut slot, name)
    }

    /// Make the session persisted under `id` current.
    ///
    /// Any read or parse failure is logged and degrades to
    /// [`create_session`](Self::create_session): the store always ends
    /// up with a usable current session. Returns the id that ended up
    /// current (the requested one, or the fresh fallback).
    ///
    /// # Errors
    ///
    /// Returns an error only if the fallback session cannot be written.
    pub async fn load_session(&self, id: &str) -> Result<SessionId> {
        let mut slot = self.current.lock().await;
        match self.read_session_file(&self.session_path(id)) {
            Ok(session) => {
                info!(id = %session.id, name = %session.name, "loaded session");
                self.write_pointer(&session.id)?;
                let loaded_id = session.id.clone();
                *slot = Some(session);
                Ok(loaded_id)
            }
            Err(e) => {
                warn!("failed to load session {id}: {e}; creating a new one");
                self.create_locked(&mut slot, None)
            }
        }
    }

    /// Append a message to the current session and persist it.
    ///
    /// When `approx_tokens` is absent or zero the cost is estimated from
    /// the content (character count / 4). If the updated counter meets
    /// the budget the store rotates to a fresh session; the overflowing
    /// message is already durable in the retiring session's file before
    /// rotation happens, so no message is lost at the boundary.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub async fn append_message(
        &self,
        role: Role,
        content: &str,
        approx_tokens: Option<u64>,
    ) -> Result<()> {
        let mut slot = self.current.lock().await;
        if slot.is_none() {
            self.create_locked(&mut slot, None)?;
        }
        let Some(session) = slot.as_mut() else {
            return Err(SirisError::Session("no current session".into()));
        };

        let tokens = match approx_tokens {
            Some(t) if t > 0 => t,
            _ => estimate_tokens(content),
        };
        session.push_message(Message::new(role, content, tokens));
        self.write_session_atomic(session)?;

        if session.token_count >= self.budget {
            info!(
                tokens = session.token_count,
                budget = self.budget,
                "token budget reached, rotating to a new session"
            );
            self.create_locked(&mut slot, None)?;
        }
        Ok(())
    }

    /// The last `limit` messages of the current session, in original
    /// order. Empty when there is no current session. Never fails.
    pub async fn recent_context(&self, limit: usize) -> Vec<Message> {
        let slot = self.current.lock().await;
        slot.as_ref()
            .map(|s| {
                let start = s.messages.len().saturating_sub(limit);
                s.messages[start..].to_vec()
            })
            .unwrap_or_default()
    }

    /// Overwrite the current session's name and persist. No-op when
    /// there is no current session.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub async fn rename(&self, name: &str) -> Result<()> {
        let mut slot = self.current.lock().await;
        if let Some(session) = slot.as_mut() {
            session.name = name.to_owned();
            self.write_session_atomic(session)?;
            info!(id = %session.id, name = %session.name, "session renamed");
        }
        Ok(())
    }

    /// Snapshot of the current session, if any.
    pub async fn current(&self) -> Option<Session> {
        self.current.lock().await.clone()
    }

    /// Id of the current session, if any.
    pub async fn current_id(&self) -> Option<SessionId> {
        self.current.lock().await.as_ref().map(|s| s.id.clone())
    }

    /// Returns the store's directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // ── Internals ───────────────────────────────────────────

    /// Create a fresh session while already holding the state lock.
    /// Used by `open`, rotation, and the public `create_session`.
    fn create_locked(
        &self,
        slot: &mut Option<Session>,
        name: Option<&str>,
    ) -> Result<SessionId> {
        let session = Session::new(name);
        self.write_session_atomic(&session)?;
        self.write_pointer(&session.id)?;
        info!(id = %session.id, name = %session.name, "created new session");
        let id = session.id.clone();
        *slot = Some(session);
        Ok(id)
    }

    fn session_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn pointer_path(&self) -> PathBuf {
        self.dir.join(POINTER_FILE)
    }

    /// Find the session to resume at startup: the one named by the
    /// pointer file, else the most recently modified session file.
    fn discover_latest(&self) -> Option<Session> {
        if let Some(id) = self.read_pointer() {
            match self.read_session_file(&self.session_path(&id)) {
                Ok(session) => return Some(session),
                Err(e) => warn!("session pointer is dangling ({e}); scanning directory"),
            }
        }
        self.latest_on_disk()
    }

    fn read_pointer(&self) -> Option<String> {
        let raw = std::fs::read_to_string(self.pointer_path()).ok()?;
        let id = raw.trim();
        if id.is_empty() {
            None
        } else {
            Some(id.to_owned())
        }
    }

    fn write_pointer(&self, id: &str) -> Result<()> {
        let tmp = self.dir.join(format!(".{POINTER_FILE}.tmp"));
        std::fs::write(&tmp, id)
            .map_err(|e| SirisError::Session(format!("failed to write session pointer: {e}")))?;
        std::fs::rename(&tmp, self.pointer_path())
            .map_err(|e| SirisError::Session(format!("failed to commit session pointer: {e}")))?;
        Ok(())
    }

    /// Most recently modified parseable session file, if any.
    fn latest_on_disk(&self) -> Option<Session> {
        let entries = std::fs::read_dir(&self.dir).ok()?;
        let mut candidates: Vec<(std::time::SystemTime, PathBuf)> = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with('.'))
            {
                continue;
            }
            let Ok(meta) = entry.metadata() else { continue };
            let Ok(modified) = meta.modified() else { continue };
            candidates.push((modified, path));
        }
        candidates.sort_by(|a, b| b.0.cmp(&a.0));

        for (_, path) in candidates {
            match self.read_session_file(&path) {
                Ok(session) => return Some(session),
                Err(e) => warn!("skipping unreadable session file {}: {e}", path.display()),
            }
        }
        None
    }

    fn read_session_file(&self, path: &Path) -> Result<Session> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SirisError::Session(format!("failed to read session file {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            SirisError::Session(format!(
                "failed to parse session file {}: {e}",
                path.display()
            ))
        })
    }

    /// Atomically write a session to disk: temp file, fsync, rename.
    fn write_session_atomic(&self, session: &Session) -> Result<()> {
        let path = self.session_path(&session.id);
        let json = serde_json::to_string_pretty(session)
            .map_err(|e| SirisError::Session(format!("failed to serialize session: {e}")))?;

        let tmp_path = self.dir.join(format!(".{}.tmp", session.id));
        std::fs::write(&tmp_path, json.as_bytes()).map_err(|e| {
            SirisError::Session(format!(
                "failed to write temp file {}: {e}",
                tmp_path.display()
            ))
        })?;

        if let Ok(file) = std::fs::File::open(&tmp_path) {
            let _ = file.sync_all();
        }

        std::fs::rename(&tmp_path, &path).map_err(|e| {
            SirisError::Session(format!(
                "failed to rename temp file to {}: {e}",
                path.display()
            ))
        })?;

        Ok(())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("dir", &self.dir)
            .field("budget", &self.budget)
            .finish_non_exhaustive()
    }
}
