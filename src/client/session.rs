//! Session token storage.
//!
//! The bearer token is the only persisted client state. Every read and
//! write goes through [`Session`], which also broadcasts a
//! [`SessionEvent`] whenever the token appears or disappears.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use crate::auth::models::AuthUser;

/// Fixed key the token is stored under.
pub const TOKEN_KEY: &str = "clinica_auth_token";

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("falha ao acessar o armazenamento da sessão: {0}")]
    Io(#[from] io::Error),

    #[error("armazenamento da sessão corrompido: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("armazenamento da sessão não é um objeto JSON")]
    NotAnObject,
}

/// Synchronous key-value slot holding the bearer token.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, token: &str) -> Result<(), SessionError>;
    fn remove(&self) -> Result<(), SessionError>;
}

#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token.lock().clone()
    }

    fn set(&self, token: &str) -> Result<(), SessionError> {
        *self.token.lock() = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), SessionError> {
        self.token.lock().take();
        Ok(())
    }
}

/// JSON object on disk; the token lives under [`TOKEN_KEY`] and any other
/// keys in the file are preserved.
pub struct FileTokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Any JSON object is accepted; values other than the token are left as they are.
    fn read_entries(&self) -> Result<Map<String, Value>, SessionError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&raw)? {
            Value::Object(entries) => Ok(entries),
            _ => Err(SessionError::NotAnObject),
        }
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        let _guard = self.lock.lock();
        match self.read_entries() {
            Ok(mut entries) => match entries.remove(TOKEN_KEY) {
                Some(Value::String(token)) => Some(token),
                _ => None,
            },
            Err(e) => {
                tracing::warn!("unable to read session file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn set(&self, token: &str) -> Result<(), SessionError> {
        let _guard = self.lock.lock();
        // only a file that is not a JSON object is replaced rather than blocking sign-in
        let mut entries = self.read_entries().unwrap_or_else(|e| {
            tracing::warn!("replacing unreadable session file {}: {}", self.path.display(), e);
            Map::new()
        });
        entries.insert(TOKEN_KEY.to_string(), Value::String(token.to_string()));
        self.write_entries(&entries)
    }

    fn remove(&self) -> Result<(), SessionError> {
        let _guard = self.lock.lock();
        let mut entries = self.read_entries().unwrap_or_default();
        if entries.remove(TOKEN_KEY).is_none() {
            return Ok(());
        }
        self.write_entries(&entries)
    }
}

/// Why the session changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(AuthUser),
    SignedOut,
    /// The server rejected the token and it was dropped locally.
    Evicted,
}

/// Process-wide session handle. Clones share the store and the channel.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn TokenStore>,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    pub fn new(store: impl TokenStore + 'static) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store: Arc::new(store),
            events,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryTokenStore::new())
    }

    pub fn token(&self) -> Option<String> {
        self.store.get()
    }

    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Persist `token` and announce `user`.
    pub fn sign_in(&self, token: &str, user: &AuthUser) -> Result<(), SessionError> {
        self.store.set(token)?;
        tracing::debug!("session started for user {}", user.id);
        self.publish(SessionEvent::SignedIn(user.clone()));
        Ok(())
    }

    /// Drop the token after an explicit logout.
    pub fn sign_out(&self) -> Result<(), SessionError> {
        self.store.remove()?;
        tracing::debug!("session ended");
        self.publish(SessionEvent::SignedOut);
        Ok(())
    }

    /// Drop a token the server refused. Silent when there was no token.
    pub fn evict(&self) {
        if !self.has_token() {
            return;
        }
        match self.store.remove() {
            Ok(()) => {
                tracing::info!("stored token evicted after an authentication failure");
                self.publish(SessionEvent::Evicted);
            }
            Err(e) => tracing::warn!("failed to evict stored token: {}", e),
        }
    }

    fn publish(&self, event: SessionEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}
