//! Scriptable in-memory [`Transport`] for tests.
//!
//! Replies are keyed by method and relative API path. A reply stays in place
//! until it is replaced, so a poller can hit the same endpoint repeatedly.
//! Unscripted requests get a 404.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::error::TransportError;
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};

#[derive(Debug, Clone)]
enum Reply {
    Response { status: u16, body: Vec<u8> },
    Failure(String),
}

#[derive(Debug, Clone)]
struct Scripted {
    reply: Reply,
    delay: Option<Duration>,
}

/// In-memory transport that records requests and replays canned replies.
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: Mutex<HashMap<(Method, String), Scripted>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    /// Create a transport with no scripted replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to `method path` with `status` and a JSON body.
    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.script(method, path, Reply::Response {
            status,
            body: body.to_string().into_bytes(),
        }, None);
    }

    /// Reply to `method path` with a raw, possibly non-JSON body.
    pub fn respond_raw(&self, method: Method, path: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.script(method, path, Reply::Response {
            status,
            body: body.into(),
        }, None);
    }

    /// Like [`respond`](Self::respond), but the reply arrives after `delay`.
    pub fn respond_after(
        &self,
        method: Method,
        path: &str,
        delay: Duration,
        status: u16,
        body: Value,
    ) {
        self.script(method, path, Reply::Response {
            status,
            body: body.to_string().into_bytes(),
        }, Some(delay));
    }

    /// Make `method path` fail without a response.
    pub fn fail(&self, method: Method, path: &str, message: &str) {
        self.script(method, path, Reply::Failure(message.to_string()), None);
    }

    /// All requests seen so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests seen for `method path`.
    #[must_use]
    pub fn count(&self, method: &Method, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| &r.method == method && r.path == path)
            .count()
    }

    /// The most recent request, if any.
    #[must_use]
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().last().cloned()
    }

    fn script(&self, method: Method, path: &str, reply: Reply, delay: Option<Duration>) {
        self.replies
            .lock()
            .insert((method, path.to_string()), Scripted { reply, delay });
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let scripted = self
            .replies
            .lock()
            .get(&(request.method.clone(), request.path.clone()))
            .cloned();
        self.requests.lock().push(request);

        let Some(scripted) = scripted else {
            return Ok(HttpResponse {
                status: 404,
                body: json!({ "message": "no scripted reply" }).to_string().into_bytes(),
            });
        };

        if let Some(delay) = scripted.delay {
            tokio::time::sleep(delay).await;
        }

        match scripted.reply {
            Reply::Response { status, body } => Ok(HttpResponse { status, body }),
            Reply::Failure(message) => Err(TransportError(message)),
        }
    }
}
