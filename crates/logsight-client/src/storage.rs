//! Persisted copies of the session credential and user record.
//!
//! Two documents are kept under fixed names, [`TOKEN_KEY`] and [`USER_KEY`].
//! They are written on every successful login/register and erased on logout.

use std::path::Path;

use logsight_persist::JsonStore;
use parking_lot::Mutex;

use crate::error::ClientResult;
use crate::types::User;

/// Storage name of the persisted token.
pub const TOKEN_KEY: &str = "token";

/// Storage name of the persisted user record.
pub const USER_KEY: &str = "user";

/// What survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedSession {
    /// Bearer credential.
    pub token: Option<String>,
    /// User record.
    pub user: Option<User>,
}

/// Backing store for [`PersistedSession`].
pub trait SessionStorage: Send + Sync {
    /// Read whatever is persisted.
    fn load(&self) -> ClientResult<PersistedSession>;

    /// Persist token and user together.
    fn save(&self, token: &str, user: &User) -> ClientResult<()>;

    /// Erase both documents.
    fn clear(&self) -> ClientResult<()>;
}

/// File-backed storage: `<dir>/token.json` and `<dir>/user.json`.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    token: JsonStore,
    user: JsonStore,
}

impl FileSessionStorage {
    /// Keep session documents in `dir`.
    pub fn new(dir: &Path) -> Self {
        Self {
            token: JsonStore::new(dir, TOKEN_KEY),
            user: JsonStore::new(dir, USER_KEY),
        }
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> ClientResult<PersistedSession> {
        Ok(PersistedSession {
            token: self.token.try_load()?,
            user: self.user.try_load()?,
        })
    }

    fn save(&self, token: &str, user: &User) -> ClientResult<()> {
        self.token.save(token)?;
        self.user.save(user)?;
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        self.token.remove()?;
        self.user.remove()?;
        Ok(())
    }
}

/// Process-local storage. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    inner: Mutex<PersistedSession>,
}

impl MemorySessionStorage {
    /// Empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with a persisted session.
    #[must_use]
    pub fn with_session(session: PersistedSession) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    /// Current contents.
    #[must_use]
    pub fn snapshot(&self) -> PersistedSession {
        self.inner.lock().clone()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> ClientResult<PersistedSession> {
        Ok(self.snapshot())
    }

    fn save(&self, token: &str, user: &User) -> ClientResult<()> {
        *self.inner.lock() = PersistedSession {
            token: Some(token.to_string()),
            user: Some(user.clone()),
        };
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        *self.inner.lock() = PersistedSession::default();
        Ok(())
    }
}
