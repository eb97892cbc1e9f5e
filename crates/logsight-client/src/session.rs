//! Session state container.
//!
//! [`SessionState`] is the single owned home of the session, the loaded log
//! file list, the current file, the last analysis result and the loading
//! indicator. Readers get clones through accessor methods; every mutation is
//! a named crate-private operation invoked by the
//! [`SessionStore`](crate::SessionStore) or by the unauthorized listener.
//!
//! The loading indicator counts in-flight operations instead of holding a
//! single flag, so overlapping operations keep it raised until the last one
//! settles.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::client::{ClientEvent, ClientListener};
use crate::error::ClientResult;
use crate::interceptor::CredentialSource;
use crate::storage::SessionStorage;
use crate::types::{AnalysisResults, LogFile, User};

/// Capacity of the change notification channel.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Authentication state. Token, user and the authenticated flag only ever
/// change together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    authenticated: bool,
    token: Option<String>,
    user: Option<User>,
}

impl Session {
    /// The signed-out session.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub(crate) fn signed_in(token: String, user: User) -> Self {
        Self {
            authenticated: true,
            token: Some(token),
            user: Some(user),
        }
    }

    /// Whether a credential is held.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// The bearer credential.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The signed-in user.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }
}

/// What changed in a [`SessionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreChange {
    /// Session signed in or out.
    Session,
    /// Log file list replaced.
    LogFiles,
    /// Current file replaced.
    CurrentFile,
    /// Analysis result replaced.
    AnalysisResults,
    /// Loading indicator toggled.
    Loading,
}

#[derive(Debug, Default)]
struct StoreData {
    session: Session,
    log_files: Vec<LogFile>,
    current_file: Option<LogFile>,
    analysis_results: Option<AnalysisResults>,
}

/// Shared console state.
pub struct SessionState {
    data: RwLock<StoreData>,
    in_flight: AtomicUsize,
    storage: Arc<dyn SessionStorage>,
    changes: broadcast::Sender<StoreChange>,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.data.read();
        f.debug_struct("SessionState")
            .field("authenticated", &data.session.authenticated)
            .field("log_files", &data.log_files.len())
            .field("in_flight", &self.in_flight.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl SessionState {
    /// Empty state; nothing is read from `storage`.
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            data: RwLock::new(StoreData::default()),
            in_flight: AtomicUsize::new(0),
            storage,
            changes,
        }
    }

    /// State restored from `storage`.
    ///
    /// The session comes back authenticated only when both a non-empty token
    /// and a user record were persisted. A half-written or unreadable store
    /// starts signed out.
    pub fn rehydrate(storage: Arc<dyn SessionStorage>) -> Self {
        let persisted = match storage.load() {
            Ok(persisted) => persisted,
            Err(e) => {
                warn!(error = %e, "cannot read persisted session, starting signed out");
                Default::default()
            }
        };

        let state = Self::new(storage);
        match (persisted.token, persisted.user) {
            (Some(token), Some(user)) if !token.is_empty() => {
                info!(user = %user.username, "restored persisted session");
                state.data.write().session = Session::signed_in(token, user);
            }
            _ => debug!("no persisted session"),
        }
        state
    }

    /// Subscribe to change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    /// Snapshot of the session.
    #[must_use]
    pub fn session(&self) -> Session {
        self.data.read().session.clone()
    }

    /// Whether a credential is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.data.read().session.authenticated
    }

    /// The signed-in user.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.data.read().session.user.clone()
    }

    /// The bearer credential.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.data.read().session.token.clone()
    }

    /// The most recently fetched file list.
    #[must_use]
    pub fn log_files(&self) -> Vec<LogFile> {
        self.data.read().log_files.clone()
    }

    /// The most recently fetched file detail.
    #[must_use]
    pub fn current_file(&self) -> Option<LogFile> {
        self.data.read().current_file.clone()
    }

    /// The most recently fetched analysis result.
    #[must_use]
    pub fn analysis_results(&self) -> Option<AnalysisResults> {
        self.data.read().analysis_results.clone()
    }

    /// Whether any operation is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) > 0
    }

    /// Number of operations in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub(crate) fn begin_loading(&self) -> LoadingGuard<'_> {
        if self.in_flight.fetch_add(1, Ordering::AcqRel) == 0 {
            self.notify(StoreChange::Loading);
        }
        LoadingGuard { state: self }
    }

    /// Persist and adopt a fresh credential. A session that cannot be
    /// persisted is not adopted.
    pub(crate) fn commit_sign_in(&self, token: String, user: User) -> ClientResult<Session> {
        if let Err(e) = self.storage.save(&token, &user) {
            warn!(error = %e, "failed to persist session");
            if let Err(e) = self.storage.clear() {
                warn!(error = %e, "failed to purge partially persisted session");
            }
            return Err(e);
        }
        let session = Session::signed_in(token, user);
        self.data.write().session = session.clone();
        self.notify(StoreChange::Session);
        Ok(session)
    }

    pub(crate) fn clear_session(&self) {
        {
            let mut data = self.data.write();
            data.session = Session::anonymous();
        }
        if let Err(e) = self.storage.clear() {
            warn!(error = %e, "failed to purge persisted session");
        }
        self.notify(StoreChange::Session);
    }

    pub(crate) fn set_log_files(&self, files: Vec<LogFile>) {
        self.data.write().log_files = files;
        self.notify(StoreChange::LogFiles);
    }

    pub(crate) fn set_current_file(&self, file: LogFile) {
        self.data.write().current_file = Some(file);
        self.notify(StoreChange::CurrentFile);
    }

    pub(crate) fn set_analysis_results(&self, results: AnalysisResults) {
        self.data.write().analysis_results = Some(results);
        self.notify(StoreChange::AnalysisResults);
    }

    fn notify(&self, change: StoreChange) {
        // No subscribers is fine.
        let _ = self.changes.send(change);
    }
}

impl CredentialSource for SessionState {
    fn bearer_token(&self) -> Option<String> {
        self.token()
    }
}

impl ClientListener for SessionState {
    fn on_event(&self, event: &ClientEvent) {
        match event {
            ClientEvent::Unauthorized { path } => {
                info!(path = %path, "signing out after unauthorized response");
                self.clear_session();
            }
        }
    }
}

/// Keeps the loading indicator raised until dropped.
#[derive(Debug)]
pub(crate) struct LoadingGuard<'a> {
    state: &'a SessionState,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.state.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.state.notify(StoreChange::Loading);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemorySessionStorage, PersistedSession};

    fn analyst() -> User {
        User {
            id: 1,
            username: "analyst".into(),
            email: None,
        }
    }

    #[test]
    fn test_new_state_is_signed_out() {
        let state = SessionState::new(Arc::new(MemorySessionStorage::new()));

        assert!(!state.is_authenticated());
        assert!(state.token().is_none());
        assert!(state.current_user().is_none());
        assert!(state.log_files().is_empty());
        assert!(!state.is_loading());
    }

    #[test]
    fn test_rehydrate_restores_complete_session() {
        let storage = Arc::new(MemorySessionStorage::with_session(PersistedSession {
            token: Some("t1".into()),
            user: Some(analyst()),
        }));
        let state = SessionState::rehydrate(storage);

        assert!(state.is_authenticated());
        assert_eq!(state.token().as_deref(), Some("t1"));
        assert_eq!(state.current_user(), Some(analyst()));
    }

    #[test]
    fn test_rehydrate_ignores_partial_session() {
        let storage = Arc::new(MemorySessionStorage::with_session(PersistedSession {
            token: Some("t1".into()),
            user: None,
        }));
        assert!(!SessionState::rehydrate(storage).is_authenticated());

        let storage = Arc::new(MemorySessionStorage::with_session(PersistedSession {
            token: Some(String::new()),
            user: Some(analyst()),
        }));
        assert!(!SessionState::rehydrate(storage).is_authenticated());
    }

    #[test]
    fn test_sign_in_then_clear() {
        let storage = Arc::new(MemorySessionStorage::new());
        let state = SessionState::new(storage.clone());

        let session = state.commit_sign_in("t1".into(), analyst()).expect("sign in");
        assert!(session.is_authenticated());
        assert_eq!(storage.snapshot().token.as_deref(), Some("t1"));

        state.clear_session();
        assert_eq!(state.session(), Session::anonymous());
        assert_eq!(storage.snapshot(), PersistedSession::default());
    }

    #[test]
    fn test_unauthorized_event_clears_session() {
        let state = SessionState::new(Arc::new(MemorySessionStorage::new()));
        state.commit_sign_in("t1".into(), analyst()).expect("sign in");

        state.on_event(&ClientEvent::Unauthorized {
            path: "/logs/list".into(),
        });
        assert!(!state.is_authenticated());
        assert!(state.bearer_token().is_none());
    }

    #[test]
    fn test_loading_counts_overlapping_operations() {
        let state = SessionState::new(Arc::new(MemorySessionStorage::new()));
        let mut rx = state.subscribe();

        let first = state.begin_loading();
        let second = state.begin_loading();
        assert_eq!(state.in_flight(), 2);

        drop(first);
        assert!(state.is_loading(), "one operation still in flight");

        drop(second);
        assert!(!state.is_loading());

        assert_eq!(rx.try_recv().expect("raised"), StoreChange::Loading);
        assert_eq!(rx.try_recv().expect("lowered"), StoreChange::Loading);
        assert!(rx.try_recv().is_err());
    }
}
