//! Session store orchestration operations.
//!
//! Every operation has the same shape: raise the loading indicator, make one
//! call through the [`ApiClient`], commit the result on success, lower the
//! indicator and hand the outcome back. Nothing is retried and no error is
//! swallowed; the only side effect on failure is the sign-out that follows a
//! 401, and that happens in the client's listener, not here.

use std::sync::Arc;

use tracing::{debug, info, warn};
use url::form_urlencoded;

use crate::client::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::session::{Session, SessionState};
use crate::transport::{MultipartForm, Transport};
use crate::types::{
    Ack, AnalysisEntry, AnalysisHandle, AnalysisResults, AnalysisResultsResponse, AuthResponse,
    Credentials, LogFile, LogFilePage, Registration, UploadReceipt, UserProfile,
};

/// Orchestrates server operations and owns their results.
pub struct SessionStore<T> {
    client: ApiClient<T>,
    state: Arc<SessionState>,
}

impl<T> Clone for SessionStore<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> std::fmt::Debug for SessionStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> SessionStore<T> {
    /// Create a store over `state`, issuing requests through `client`.
    ///
    /// The client should carry a bearer interceptor reading from `state` and
    /// have `state` registered as a listener; [`Console`](crate::Console)
    /// wires both.
    pub fn new(client: ApiClient<T>, state: Arc<SessionState>) -> Self {
        Self { client, state }
    }

    /// The shared state read model.
    #[must_use]
    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    /// The underlying client.
    #[must_use]
    pub fn client(&self) -> &ApiClient<T> {
        &self.client
    }

    /// Whether a credential is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    /// Whether any operation is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    /// Sign in. The response must carry a non-empty token and a user record;
    /// anything less is rejected without touching the session.
    pub async fn login(&self, credentials: &Credentials) -> ClientResult<Session> {
        debug!(username = %credentials.username, "logging in");
        self.authenticate("/auth/login", credentials).await
    }

    /// Create an account and sign in with it. Same contract as
    /// [`login`](Self::login).
    pub async fn register(&self, registration: &Registration) -> ClientResult<Session> {
        debug!(username = %registration.username, "registering");
        self.authenticate("/auth/register", registration).await
    }

    /// Sign out locally. No request is made.
    pub fn logout(&self) {
        info!("logging out");
        self.state.clear_session();
    }

    /// Fetch the file list and replace the stored one.
    pub async fn fetch_log_files(&self) -> ClientResult<Vec<LogFile>> {
        let _loading = self.state.begin_loading();
        let page: LogFilePage = self
            .client
            .get("/logs/list")
            .await
            .inspect_err(|e| warn!(error = %e, "fetching log files failed"))?;
        self.state.set_log_files(page.files.clone());
        Ok(page.files)
    }

    /// Fetch one page of the file list and replace the stored list with it.
    pub async fn fetch_log_files_page(&self, page: u32, per_page: u32) -> ClientResult<LogFilePage> {
        let _loading = self.state.begin_loading();
        let query = vec![
            ("page".to_string(), page.to_string()),
            ("per_page".to_string(), per_page.to_string()),
        ];
        let page: LogFilePage = self
            .client
            .get_with_query("/logs/list", query)
            .await
            .inspect_err(|e| warn!(error = %e, "fetching log file page failed"))?;
        self.state.set_log_files(page.files.clone());
        Ok(page)
    }

    /// Fetch one file and make it the current file.
    pub async fn fetch_log_file(&self, id: u64) -> ClientResult<LogFile> {
        let _loading = self.state.begin_loading();
        let file: LogFile = self
            .client
            .get(&format!("/logs/{id}"))
            .await
            .inspect_err(|e| warn!(file_id = id, error = %e, "fetching log file failed"))?;
        self.state.set_current_file(file.clone());
        Ok(file)
    }

    /// Upload a log file. The stored list is left alone; re-fetch it to see
    /// the new file.
    pub async fn upload_log_file(&self, form: MultipartForm) -> ClientResult<UploadReceipt> {
        let _loading = self.state.begin_loading();
        debug!(files = form.files.len(), "uploading log file");
        self.client
            .post_multipart("/logs/upload", form)
            .await
            .inspect_err(|e| warn!(error = %e, "upload failed"))
    }

    /// Delete a file on the server. The stored list is left alone.
    pub async fn delete_log_file(&self, id: u64) -> ClientResult<Ack> {
        let _loading = self.state.begin_loading();
        self.client
            .delete(&format!("/logs/{id}"))
            .await
            .inspect_err(|e| warn!(file_id = id, error = %e, "delete failed"))
    }

    /// Ask the server to analyze a file. Results are fetched separately.
    pub async fn analyze_log_file(&self, id: u64) -> ClientResult<AnalysisHandle> {
        let _loading = self.state.begin_loading();
        self.client
            .post_empty(&format!("/analysis/analyze/{id}"))
            .await
            .inspect_err(|e| warn!(file_id = id, error = %e, "analysis request failed"))
    }

    /// Fetch all analysis results for a file and replace the stored result.
    pub async fn fetch_analysis_results(&self, id: u64) -> ClientResult<AnalysisResults> {
        let _loading = self.state.begin_loading();
        let response: AnalysisResultsResponse = self
            .client
            .get(&format!("/analysis/results/{id}"))
            .await
            .inspect_err(|e| warn!(file_id = id, error = %e, "fetching analysis results failed"))?;
        let results = AnalysisResults {
            file_id: id,
            results: response.results.unwrap_or_default(),
        };
        self.state.set_analysis_results(results.clone());
        Ok(results)
    }

    /// Fetch a single analysis kind for a file. Stored state is untouched.
    ///
    /// `kind` is sent as one percent-encoded path segment.
    pub async fn fetch_analysis_result(&self, id: u64, kind: &str) -> ClientResult<AnalysisEntry> {
        let _loading = self.state.begin_loading();
        let segment = path_segment(kind);
        self.client
            .get(&format!("/analysis/results/{id}/{segment}"))
            .await
            .inspect_err(|e| warn!(file_id = id, kind, error = %e, "fetching analysis result failed"))
    }

    /// Fetch the signed-in user's profile. Stored state is untouched.
    pub async fn fetch_profile(&self) -> ClientResult<UserProfile> {
        let _loading = self.state.begin_loading();
        self.client
            .get("/auth/profile")
            .await
            .inspect_err(|e| warn!(error = %e, "fetching profile failed"))
    }

    async fn authenticate<B>(&self, path: &str, body: &B) -> ClientResult<Session>
    where
        B: serde::Serialize + ?Sized,
    {
        let _loading = self.state.begin_loading();
        let response: AuthResponse = self
            .client
            .post_json(path, body)
            .await
            .inspect_err(|e| warn!(path, error = %e, "authentication failed"))?;

        let token = match response.access_token {
            Some(token) if !token.is_empty() => token,
            _ => {
                warn!(path, "authentication response carried no access token");
                return Err(ClientError::MalformedResponse(
                    "authentication succeeded without an access token".into(),
                ));
            }
        };
        let Some(user) = response.user else {
            warn!(path, "authentication response carried no user");
            return Err(ClientError::MalformedResponse(
                "authentication succeeded without a user record".into(),
            ));
        };

        let username = user.username.clone();
        let session = self.state.commit_sign_in(token, user)?;
        info!(user = %username, "signed in");
        Ok(session)
    }
}

/// Percent-encode `raw` for use as a single path segment.
fn path_segment(raw: &str) -> String {
    // Only spaces come out as `+`; a literal `+` is already `%2B`.
    form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::interceptor::BearerAuth;
    use crate::mock::MockTransport;
    use crate::storage::{MemorySessionStorage, PersistedSession, SessionStorage};
    use crate::transport::Method;
    use crate::types::User;
    use serde_json::json;
    use std::time::Duration;
    use test_case::test_case;

    struct Fixture {
        transport: Arc<MockTransport>,
        storage: Arc<MemorySessionStorage>,
        store: SessionStore<Arc<MockTransport>>,
    }

    fn fixture() -> Fixture {
        let transport = Arc::new(MockTransport::new());
        let storage = Arc::new(MemorySessionStorage::new());
        let state = Arc::new(SessionState::new(storage.clone()));
        let client = ApiClient::builder(Arc::clone(&transport), ClientConfig::default())
            .interceptor(BearerAuth::new(Arc::clone(&state)))
            .build()
            .expect("client");
        client.add_listener(state.clone());
        Fixture {
            transport,
            storage,
            store: SessionStore::new(client, state),
        }
    }

    fn login_ok(transport: &MockTransport) {
        transport.respond(
            Method::POST,
            "/auth/login",
            200,
            json!({ "access_token": "t1", "user": { "id": 1, "name": "a" } }),
        );
    }

    #[tokio::test]
    async fn test_login_commits_session() {
        let fx = fixture();
        login_ok(&fx.transport);

        let session = fx.store.login(&Credentials::new("a", "b")).await.expect("login");

        assert!(session.is_authenticated());
        assert_eq!(session.token(), Some("t1"));
        assert_eq!(
            session.user(),
            Some(&User {
                id: 1,
                username: "a".into(),
                email: None
            })
        );
        assert!(fx.store.is_authenticated());
        assert!(!fx.store.is_loading());

        let sent = fx.transport.last_request().expect("request");
        match sent.body {
            crate::transport::RequestBody::Json(body) => {
                assert_eq!(body, json!({ "username": "a", "password": "b" }));
            }
            other => panic!("expected json body, got {other:?}"),
        }
        assert_eq!(fx.storage.snapshot().token.as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn test_login_without_token_is_rejected() {
        let fx = fixture();
        fx.transport.respond(
            Method::POST,
            "/auth/login",
            200,
            json!({ "user": { "id": 1, "name": "a" } }),
        );

        let err = fx.store.login(&Credentials::new("a", "b")).await.expect_err("no token");

        assert!(matches!(err, ClientError::MalformedResponse(_)));
        assert!(!fx.store.is_authenticated());
        assert!(!fx.store.is_loading());
        assert_eq!(fx.storage.snapshot(), PersistedSession::default());
    }

    #[tokio::test]
    async fn test_login_with_empty_token_is_rejected() {
        let fx = fixture();
        fx.transport.respond(
            Method::POST,
            "/auth/login",
            200,
            json!({ "access_token": "", "user": { "id": 1, "name": "a" } }),
        );

        assert!(fx.store.login(&Credentials::new("a", "b")).await.is_err());
        assert!(!fx.store.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_without_user_is_rejected() {
        let fx = fixture();
        fx.transport
            .respond(Method::POST, "/auth/login", 200, json!({ "access_token": "t1" }));

        let err = fx.store.login(&Credentials::new("a", "b")).await.expect_err("no user");
        assert!(matches!(err, ClientError::MalformedResponse(_)));
        assert!(!fx.store.is_authenticated());
    }

    struct ReadOnlyStorage;

    impl SessionStorage for ReadOnlyStorage {
        fn load(&self) -> ClientResult<PersistedSession> {
            Ok(PersistedSession::default())
        }

        fn save(&self, _token: &str, _user: &User) -> ClientResult<()> {
            Err(ClientError::Storage("read-only file system".into()))
        }

        fn clear(&self) -> ClientResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_login_fails_when_session_cannot_be_persisted() {
        let transport = Arc::new(MockTransport::new());
        login_ok(&transport);
        let state = Arc::new(SessionState::new(Arc::new(ReadOnlyStorage)));
        let client = ApiClient::new(Arc::clone(&transport), ClientConfig::default()).expect("client");
        let store = SessionStore::new(client, Arc::clone(&state));

        let err = store.login(&Credentials::new("a", "b")).await.expect_err("not persisted");

        assert!(matches!(err, ClientError::Storage(_)));
        assert!(!store.is_authenticated());
        assert!(state.token().is_none());
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn test_register_uses_register_endpoint() {
        let fx = fixture();
        fx.transport.respond(
            Method::POST,
            "/auth/register",
            201,
            json!({ "access_token": "t9", "user": { "id": 9, "username": "new", "email": "n@x" } }),
        );

        let registration = Registration {
            username: "new".into(),
            email: "n@x".into(),
            password: "pw".into(),
        };
        let session = fx.store.register(&registration).await.expect("register");

        assert_eq!(session.token(), Some("t9"));
        assert_eq!(fx.transport.count(&Method::POST, "/auth/login"), 0);
    }

    #[tokio::test]
    async fn test_login_then_logout_clears_everything() {
        let fx = fixture();
        login_ok(&fx.transport);
        fx.store.login(&Credentials::new("a", "b")).await.expect("login");

        fx.store.logout();

        let session = fx.store.state().session();
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
        assert!(session.user().is_none());
        assert_eq!(fx.storage.snapshot(), PersistedSession::default());
    }

    #[tokio::test]
    async fn test_unauthorized_response_signs_out() {
        let fx = fixture();
        login_ok(&fx.transport);
        fx.store.login(&Credentials::new("a", "b")).await.expect("login");
        fx.transport
            .respond(Method::GET, "/logs/list", 401, json!({ "message": "token expired" }));

        let err = fx.store.fetch_log_files().await.expect_err("401");

        assert!(err.is_unauthorized());
        assert!(!fx.store.is_authenticated());
        assert!(!fx.store.is_loading());
        assert_eq!(fx.storage.snapshot(), PersistedSession::default());
    }

    #[tokio::test]
    async fn test_requests_carry_bearer_after_login() {
        let fx = fixture();
        login_ok(&fx.transport);
        fx.transport.respond(Method::GET, "/logs/list", 200, json!({ "files": [] }));

        fx.store.fetch_log_files().await.expect("anonymous list");
        assert!(fx.transport.last_request().expect("req").header("authorization").is_none());

        fx.store.login(&Credentials::new("a", "b")).await.expect("login");
        fx.store.fetch_log_files().await.expect("list");
        assert_eq!(
            fx.transport.last_request().expect("req").header("authorization"),
            Some("Bearer t1")
        );
    }

    #[tokio::test]
    async fn test_fetch_log_files_replaces_list() {
        let fx = fixture();
        fx.transport.respond(
            Method::GET,
            "/logs/list",
            200,
            json!({ "files": [{ "id": 1, "filename": "a.log" }, { "id": 2, "filename": "b.log" }] }),
        );
        assert_eq!(fx.store.fetch_log_files().await.expect("list").len(), 2);

        fx.transport.respond(
            Method::GET,
            "/logs/list",
            200,
            json!({ "files": [{ "id": 3, "filename": "c.log" }] }),
        );
        fx.store.fetch_log_files().await.expect("list");

        let files = fx.store.state().log_files();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id, 3);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_list() {
        let fx = fixture();
        fx.transport.respond(
            Method::GET,
            "/logs/list",
            200,
            json!({ "files": [{ "id": 1, "filename": "a.log" }] }),
        );
        fx.store.fetch_log_files().await.expect("list");
        fx.transport.respond(Method::GET, "/logs/list", 500, json!({ "message": "db down" }));

        let err = fx.store.fetch_log_files().await.expect_err("500");

        assert_eq!(err.status(), Some(500));
        assert_eq!(fx.store.state().log_files().len(), 1);
        assert!(!fx.store.is_loading());
    }

    #[tokio::test]
    async fn test_fetch_log_files_page_sends_pagination() {
        let fx = fixture();
        fx.transport.respond(
            Method::GET,
            "/logs/list",
            200,
            json!({ "files": [{ "id": 4, "filename": "d.log" }], "total": 11, "pages": 2, "current_page": 2, "per_page": 10 }),
        );

        let page = fx.store.fetch_log_files_page(2, 10).await.expect("page");

        assert_eq!(page.total, 11);
        assert_eq!(page.current_page, 2);
        let sent = fx.transport.last_request().expect("request");
        assert!(sent.query.contains(&("page".to_string(), "2".to_string())));
        assert!(sent.query.contains(&("per_page".to_string(), "10".to_string())));
        assert_eq!(fx.store.state().log_files()[0].id, 4);
    }

    #[tokio::test]
    async fn test_fetch_log_file_sets_current() {
        let fx = fixture();
        fx.transport.respond(
            Method::GET,
            "/logs/5",
            200,
            json!({ "id": 5, "filename": "e.log", "status": "completed" }),
        );

        let file = fx.store.fetch_log_file(5).await.expect("file");

        assert_eq!(file.id, 5);
        assert_eq!(fx.store.state().current_file(), Some(file));
    }

    #[tokio::test]
    async fn test_upload_does_not_touch_list() {
        let fx = fixture();
        fx.transport.respond(
            Method::POST,
            "/logs/upload",
            201,
            json!({ "message": "ok", "file_id": 8, "file": { "id": 8, "filename": "h.log" } }),
        );

        let form = MultipartForm::new().file("file", "h.log", b"line".to_vec());
        let receipt = fx.store.upload_log_file(form).await.expect("upload");

        assert_eq!(receipt.file_id, Some(8));
        assert!(fx.store.state().log_files().is_empty());
        assert!(matches!(
            fx.transport.last_request().expect("request").body,
            crate::transport::RequestBody::Multipart(_)
        ));
    }

    #[tokio::test]
    async fn test_analyze_does_not_store_results() {
        let fx = fixture();
        fx.transport.respond(
            Method::POST,
            "/analysis/analyze/5",
            202,
            json!({ "message": "started", "file": { "id": 5, "filename": "e.log", "status": "processing" } }),
        );

        let handle = fx.store.analyze_log_file(5).await.expect("analyze");

        assert_eq!(handle.message.as_deref(), Some("started"));
        assert!(fx.store.state().analysis_results().is_none());
    }

    #[tokio::test]
    async fn test_fetch_analysis_results_replaces_result() {
        let fx = fixture();
        fx.transport.respond(
            Method::GET,
            "/analysis/results/5",
            200,
            json!({ "file": { "id": 5, "filename": "e.log" }, "results": { "anomaly": { "count": 3 }, "summary": { "lines": 100 } } }),
        );

        let results = fx.store.fetch_analysis_results(5).await.expect("results");

        assert_eq!(results.file_id, 5);
        assert_eq!(results.kind("anomaly"), Some(&json!({ "count": 3 })));
        assert_eq!(fx.store.state().analysis_results(), Some(results));
    }

    #[tokio::test]
    async fn test_fetch_single_analysis_result() {
        let fx = fixture();
        fx.transport.respond(
            Method::GET,
            "/analysis/results/5/trend",
            200,
            json!({ "analysis_type": "trend", "result": { "slope": 1.5 } }),
        );

        let entry = fx.store.fetch_analysis_result(5, "trend").await.expect("entry");

        assert_eq!(entry.analysis_type, "trend");
        assert!(fx.store.state().analysis_results().is_none());
    }

    #[tokio::test]
    async fn test_analysis_kind_cannot_escape_its_segment() {
        let fx = fixture();
        fx.transport.respond(
            Method::GET,
            "/analysis/results/5/../6?x%23y",
            200,
            json!({ "analysis_type": "leak", "result": {} }),
        );

        let err = fx
            .store
            .fetch_analysis_result(5, "../6?x#y")
            .await
            .expect_err("unscripted path");

        assert!(matches!(err, ClientError::Api { status: 404, .. }));
        assert_eq!(
            fx.transport.last_request().expect("request").path,
            "/analysis/results/5/..%2F6%3Fx%23y"
        );
    }

    #[test_case("trend", "trend" ; "plain")]
    #[test_case("geo ip", "geo%20ip" ; "space")]
    #[test_case("a+b/c", "a%2Bb%2Fc" ; "reserved")]
    fn test_path_segment_encoding(raw: &str, expected: &str) {
        assert_eq!(path_segment(raw), expected);
    }

    #[tokio::test]
    async fn test_delete_and_profile() {
        let fx = fixture();
        fx.transport.respond(Method::DELETE, "/logs/5", 200, json!({ "message": "deleted" }));
        fx.transport.respond(
            Method::GET,
            "/auth/profile",
            200,
            json!({ "id": 1, "username": "a", "email": "a@x", "created_at": "2024-01-01 00:00:00" }),
        );

        let ack = fx.store.delete_log_file(5).await.expect("delete");
        assert_eq!(ack.message.as_deref(), Some("deleted"));

        let profile = fx.store.fetch_profile().await.expect("profile");
        assert_eq!(profile.username, "a");
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_stays_raised_while_any_operation_runs() {
        let fx = fixture();
        fx.transport.respond_after(
            Method::GET,
            "/logs/list",
            Duration::from_millis(100),
            200,
            json!({ "files": [] }),
        );
        fx.transport.respond_after(
            Method::GET,
            "/logs/1",
            Duration::from_millis(300),
            200,
            json!({ "id": 1, "filename": "a.log" }),
        );

        let quick = {
            let store = fx.store.clone();
            tokio::spawn(async move { store.fetch_log_files().await })
        };
        let slow = {
            let store = fx.store.clone();
            tokio::spawn(async move { store.fetch_log_file(1).await })
        };

        quick.await.expect("join").expect("list");
        assert!(fx.store.is_loading(), "slow fetch still in flight");

        slow.await.expect("join").expect("file");
        assert!(!fx.store.is_loading());
    }
}
