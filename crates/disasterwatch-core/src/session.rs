//! Application-level session context.
//!
//! The signed-in user's bearer token and profile are persisted through a
//! [`SessionStore`] and published through a [`tokio::sync::watch`] channel.
//! Components take a [`SessionContext`] handle instead of reading shared
//! storage, and [`SessionContext::subscribe`] replaces ambient
//! "auth changed" broadcasts with an explicit subscribe/notify contract.
//!
//! A persisted profile that fails to parse is logged and treated as absent,
//! which leaves the user at least privilege.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use disasterwatch_types::{AuthResponse, Role, UserProfile};
use tokio::sync::watch;
use tracing::{info, warn};

/// File holding the bearer token inside a [`FileSessionStore`] directory.
pub const TOKEN_FILE: &str = "token";

/// File holding the JSON profile inside a [`FileSessionStore`] directory.
pub const PROFILE_FILE: &str = "user.json";

/// Errors raised by session persistence.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Reading or writing the backing storage failed.
    #[error("session storage error at {path}: {source}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The profile could not be serialized.
    #[error("session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// What a store holds, before the profile is parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredSession {
    /// Bearer token, if any.
    pub token: Option<String>,
    /// Profile JSON exactly as persisted.
    pub profile_json: Option<String>,
}

/// Persistent storage for the session.
pub trait SessionStore: Send + Sync {
    /// Read whatever is persisted.
    fn load(&self) -> Result<StoredSession, SessionError>;

    /// Persist a token and profile, replacing what was there.
    fn save(&self, token: &str, profile_json: &str) -> Result<(), SessionError>;

    /// Remove the persisted session.
    fn clear(&self) -> Result<(), SessionError>;
}

/// A store keeping `token` and `user.json` files in a directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Create a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The backing directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_optional(path: &Path) -> Result<Option<String>, SessionError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                Ok((!trimmed.is_empty()).then(|| trimmed.to_owned()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SessionError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn remove_optional(path: &Path) -> Result<(), SessionError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<StoredSession, SessionError> {
        Ok(StoredSession {
            token: Self::read_optional(&self.dir.join(TOKEN_FILE))?,
            profile_json: Self::read_optional(&self.dir.join(PROFILE_FILE))?,
        })
    }

    fn save(&self, token: &str, profile_json: &str) -> Result<(), SessionError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| SessionError::Io { path, source }
        };
        std::fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;
        let token_path = self.dir.join(TOKEN_FILE);
        std::fs::write(&token_path, token).map_err(io_err(&token_path))?;
        let profile_path = self.dir.join(PROFILE_FILE);
        std::fs::write(&profile_path, profile_json).map_err(io_err(&profile_path))?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        Self::remove_optional(&self.dir.join(TOKEN_FILE))?;
        Self::remove_optional(&self.dir.join(PROFILE_FILE))
    }
}

/// A volatile store, for tests and one-off runs.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<StoredSession>,
}

impl MemorySessionStore {
    /// Create a store pre-filled with raw contents.
    pub const fn with_contents(stored: StoredSession) -> Self {
        Self {
            inner: Mutex::new(stored),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<StoredSession, SessionError> {
        Ok(self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, token: &str, profile_json: &str) -> Result<(), SessionError> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = StoredSession {
            token: Some(token.to_owned()),
            profile_json: Some(profile_json.to_owned()),
        };
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = StoredSession::default();
        Ok(())
    }
}

/// The current authentication state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Bearer token for authenticated calls.
    pub token: Option<String>,
    /// Signed-in user's profile.
    pub profile: Option<UserProfile>,
}

impl Session {
    /// Whether a token is present.
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The user's role; `user` when signed out or the profile is unreadable.
    pub fn role(&self) -> Role {
        self.profile.as_ref().map_or(Role::User, |p| p.role)
    }

    /// Whether the admin affordances are unlocked.
    pub fn is_admin(&self) -> bool {
        self.is_authenticated() && self.role().is_admin()
    }

    fn from_stored(stored: StoredSession) -> Self {
        let profile = stored
            .profile_json
            .as_deref()
            .and_then(|json| match serde_json::from_str::<UserProfile>(json) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    warn!(error = %e, "stored user profile is malformed, treating as no role");
                    None
                }
            });
        Self {
            token: stored.token,
            profile,
        }
    }
}

struct Inner {
    store: Arc<dyn SessionStore>,
    tx: watch::Sender<Session>,
}

/// Shared handle to the session. Cheap to clone.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("session", &*self.inner.tx.borrow())
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    /// Load the persisted session from `store`.
    ///
    /// Storage read failures are logged and yield a signed-out session.
    pub fn load(store: Arc<dyn SessionStore>) -> Self {
        let session = read_session(store.as_ref());
        let (tx, _) = watch::channel(session);
        Self {
            inner: Arc::new(Inner { store, tx }),
        }
    }

    /// A signed-out session backed by memory only.
    pub fn in_memory() -> Self {
        Self::load(Arc::new(MemorySessionStore::default()))
    }

    /// Snapshot of the current session.
    pub fn current(&self) -> Session {
        self.inner.tx.borrow().clone()
    }

    /// Subscribe to session changes.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.tx.subscribe()
    }

    /// Persist a successful login and notify subscribers.
    pub fn sign_in(&self, auth: AuthResponse) -> Result<(), SessionError> {
        let profile_json = serde_json::to_string(&auth.user)?;
        self.inner.store.save(&auth.token, &profile_json)?;
        info!(role = %auth.user.role, "signed in");
        self.publish(Session {
            token: Some(auth.token),
            profile: Some(auth.user),
        });
        Ok(())
    }

    /// Forget the session and notify subscribers.
    pub fn sign_out(&self) -> Result<(), SessionError> {
        self.inner.store.clear()?;
        info!("signed out");
        self.publish(Session::default());
        Ok(())
    }

    /// Re-read the store, picking up changes made by another process.
    /// Subscribers are notified only if something changed.
    pub fn reload(&self) {
        let session = read_session(self.inner.store.as_ref());
        self.publish(session);
    }

    fn publish(&self, session: Session) {
        self.inner.tx.send_if_modified(|current| {
            if *current == session {
                false
            } else {
                *current = session;
                true
            }
        });
    }
}

fn read_session(store: &dyn SessionStore) -> Session {
    match store.load() {
        Ok(stored) => Session::from_stored(stored),
        Err(e) => {
            warn!(error = %e, "failed to read persisted session, starting signed out");
            Session::default()
        }
    }
}
