//! Wiring of the client core.
//!
//! The pieces depend on each other in a loop: the client needs the session
//! token, and the session needs to hear about 401s from the client. The loop
//! is closed here. State comes first, the client reads its token through a
//! [`BearerAuth`] interceptor, then the state and the navigator are registered
//! as listeners, in that order, so the session is already cleared when the
//! navigator re-runs the guard.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::guard::{Navigator, RouteTable};
use crate::interceptor::BearerAuth;
use crate::session::SessionState;
use crate::storage::{FileSessionStorage, SessionStorage};
use crate::store::SessionStore;
use crate::transport::{ReqwestTransport, Transport};

/// A fully wired client core.
pub struct Console<T> {
    store: SessionStore<T>,
    navigator: Arc<Navigator>,
}

impl<T> std::fmt::Debug for Console<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("store", &self.store)
            .field("navigator", &self.navigator)
            .finish()
    }
}

impl<T: Transport> Console<T> {
    /// Wire a console over `transport`, restoring any session persisted in
    /// `storage`.
    pub fn new(
        transport: T,
        config: ClientConfig,
        storage: Arc<dyn SessionStorage>,
    ) -> ClientResult<Self> {
        Self::with_routes(transport, config, storage, RouteTable::console())
    }

    /// Like [`new`](Self::new) with a custom route table.
    pub fn with_routes(
        transport: T,
        config: ClientConfig,
        storage: Arc<dyn SessionStorage>,
        routes: RouteTable,
    ) -> ClientResult<Self> {
        let state = Arc::new(SessionState::rehydrate(storage));
        let client = ApiClient::builder(transport, config)
            .interceptor(BearerAuth::new(Arc::clone(&state)))
            .build()?;

        let navigator = Arc::new(Navigator::new(routes, Arc::clone(&state)));
        client.add_listener(state.clone());
        client.add_listener(navigator.clone());

        debug!(
            base_url = %client.config().base_url,
            authenticated = state.is_authenticated(),
            "console wired"
        );

        Ok(Self {
            store: SessionStore::new(client, state),
            navigator,
        })
    }

    /// Orchestration operations.
    #[must_use]
    pub fn store(&self) -> &SessionStore<T> {
        &self.store
    }

    /// Shared state.
    #[must_use]
    pub fn state(&self) -> &Arc<SessionState> {
        self.store.state()
    }

    /// The HTTP client adapter.
    #[must_use]
    pub fn client(&self) -> &ApiClient<T> {
        self.store.client()
    }

    /// Guarded navigation.
    #[must_use]
    pub fn navigator(&self) -> &Arc<Navigator> {
        &self.navigator
    }
}

impl Console<ReqwestTransport> {
    /// Production wiring: `reqwest` transport, session files in `state_dir`.
    pub fn connect(config: ClientConfig, state_dir: &Path) -> ClientResult<Self> {
        let transport = ReqwestTransport::new();
        let storage: Arc<dyn SessionStorage> = Arc::new(FileSessionStorage::new(state_dir));
        Self::new(transport, config, storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::LOGIN_PATH;
    use crate::mock::MockTransport;
    use crate::storage::{MemorySessionStorage, PersistedSession};
    use crate::transport::Method;
    use crate::types::User;
    use serde_json::json;

    fn persisted() -> Arc<MemorySessionStorage> {
        Arc::new(MemorySessionStorage::with_session(PersistedSession {
            token: Some("t1".into()),
            user: Some(User {
                id: 1,
                username: "a".into(),
                email: None,
            }),
        }))
    }

    #[tokio::test]
    async fn test_rehydrated_token_is_sent() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(Method::GET, "/logs/list", 200, json!({ "files": [] }));
        let console = Console::new(Arc::clone(&transport), ClientConfig::default(), persisted())
            .expect("console");

        assert!(console.state().is_authenticated());
        console.store().fetch_log_files().await.expect("list");
        assert_eq!(
            transport.last_request().expect("request").header("Authorization"),
            Some("Bearer t1")
        );
    }

    #[tokio::test]
    async fn test_unauthorized_signs_out_and_redirects() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(Method::GET, "/logs/list", 401, json!({ "message": "expired" }));
        let storage = persisted();
        let console =
            Console::new(Arc::clone(&transport), ClientConfig::default(), storage.clone())
                .expect("console");
        console.navigator().navigate("/files").expect("navigate");

        let err = console.store().fetch_log_files().await.expect_err("401");

        assert!(err.is_unauthorized());
        assert!(!console.state().is_authenticated());
        assert_eq!(storage.snapshot(), PersistedSession::default());
        assert_eq!(console.navigator().current().location.path, LOGIN_PATH);
    }

    #[test]
    fn test_connect_with_empty_state_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let console = Console::connect(ClientConfig::default(), dir.path()).expect("console");
        assert!(!console.state().is_authenticated());
    }
}
