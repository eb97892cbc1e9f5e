//! HTTP client adapter.
//!
//! Every call into the remote API goes through [`ApiClient`]. It joins the
//! path onto the configured base URL, runs the interceptor chain (bearer
//! credential injection lives there), enforces the fixed timeout, strips the
//! response down to its decoded body and classifies failures.
//!
//! A 401 is the one failure with a side effect: before the error is returned,
//! [`ClientEvent::Unauthorized`] is delivered synchronously to every
//! registered [`ClientListener`] and then broadcast to async subscribers. The
//! session state and the navigator subscribe to it; the client itself knows
//! nothing about sessions or views.
//!
//! # Example
//!
//! ```rust,no_run
//! use logsight_client::{ApiClient, ClientConfig, ReqwestTransport};
//! use logsight_client::interceptor::{BearerAuth, StaticToken};
//!
//! # async fn example() -> Result<(), logsight_client::ClientError> {
//! let client = ApiClient::builder(ReqwestTransport::new(), ClientConfig::default())
//!     .interceptor(BearerAuth::new(StaticToken(Some("t1".into()))))
//!     .build()?;
//! let files: serde_json::Value = client.get("/logs/list").await?;
//! println!("{files}");
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::interceptor::RequestInterceptor;
use crate::transport::{HttpRequest, HttpResponse, Method, MultipartForm, RequestBody, Transport};

/// Capacity of the client event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Events the client emits as a side effect of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The server answered 401 for `path`.
    Unauthorized {
        /// Relative API path of the rejected request.
        path: String,
    },
}

/// Synchronous observer of [`ClientEvent`]s.
///
/// Listeners run on the task that issued the request, before the failing
/// call returns, so state they touch is already updated when the caller sees
/// the error.
pub trait ClientListener: Send + Sync {
    /// Handle one event.
    fn on_event(&self, event: &ClientEvent);
}

struct Inner<T> {
    transport: T,
    config: ClientConfig,
    interceptors: Vec<Box<dyn RequestInterceptor>>,
    listeners: RwLock<Vec<Arc<dyn ClientListener>>>,
    events: broadcast::Sender<ClientEvent>,
}

/// The HTTP client adapter. Cheap to clone; clones share transport,
/// interceptors and listeners.
pub struct ApiClient<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for ApiClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.inner.config)
            .field("interceptors", &self.inner.interceptors.len())
            .field("listeners", &self.inner.listeners.read().len())
            .finish_non_exhaustive()
    }
}

/// Builder composing a transport, configuration and interceptor chain.
pub struct ApiClientBuilder<T> {
    transport: T,
    config: ClientConfig,
    interceptors: Vec<Box<dyn RequestInterceptor>>,
}

impl<T: Transport> ApiClientBuilder<T> {
    /// Append an interceptor. Interceptors run in insertion order.
    #[must_use]
    pub fn interceptor(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.interceptors.push(Box::new(interceptor));
        self
    }

    /// Validate the configuration and build the client.
    pub fn build(self) -> ClientResult<ApiClient<T>> {
        self.config.validate()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(ApiClient {
            inner: Arc::new(Inner {
                transport: self.transport,
                config: self.config,
                interceptors: self.interceptors,
                listeners: RwLock::new(Vec::new()),
                events,
            }),
        })
    }
}

impl<T: Transport> ApiClient<T> {
    /// Start building a client.
    pub fn builder(transport: T, config: ClientConfig) -> ApiClientBuilder<T> {
        ApiClientBuilder {
            transport,
            config,
            interceptors: Vec::new(),
        }
    }

    /// Build a client with no interceptors.
    pub fn new(transport: T, config: ClientConfig) -> ClientResult<Self> {
        Self::builder(transport, config).build()
    }

    /// The fixed configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Register a synchronous event listener.
    pub fn add_listener(&self, listener: Arc<dyn ClientListener>) {
        self.inner.listeners.write().push(listener);
    }

    /// Subscribe to client events asynchronously.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.inner.events.subscribe()
    }

    /// `GET path`.
    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> ClientResult<R> {
        self.request(Method::GET, path, Vec::new(), RequestBody::Empty)
            .await
    }

    /// `GET path?query`.
    pub async fn get_with_query<R: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> ClientResult<R> {
        self.request(Method::GET, path, query, RequestBody::Empty).await
    }

    /// `POST path` with a JSON body.
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> ClientResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = serde_json::to_value(body)
            .map_err(|e| ClientError::Transport(format!("failed to encode request body: {e}")))?;
        self.request(Method::POST, path, Vec::new(), RequestBody::Json(body))
            .await
    }

    /// `POST path` with no body.
    pub async fn post_empty<R: DeserializeOwned>(&self, path: &str) -> ClientResult<R> {
        self.request(Method::POST, path, Vec::new(), RequestBody::Empty)
            .await
    }

    /// `POST path` with a multipart body.
    pub async fn post_multipart<R: DeserializeOwned>(
        &self,
        path: &str,
        form: MultipartForm,
    ) -> ClientResult<R> {
        self.request(Method::POST, path, Vec::new(), RequestBody::Multipart(form))
            .await
    }

    /// `DELETE path`.
    pub async fn delete<R: DeserializeOwned>(&self, path: &str) -> ClientResult<R> {
        self.request(Method::DELETE, path, Vec::new(), RequestBody::Empty)
            .await
    }

    /// Send a request and decode the response body into `R`.
    pub async fn request<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Vec<(String, String)>,
        body: RequestBody,
    ) -> ClientResult<R> {
        let mut request = HttpRequest::new(method, path, self.inner.config.url_for(path));
        request.query = query;
        request.body = body;

        let response = self.execute(request).await?;
        decode_body(path, &response.body)
    }

    async fn execute(&self, mut request: HttpRequest) -> ClientResult<HttpResponse> {
        for interceptor in &self.inner.interceptors {
            interceptor.intercept(&mut request);
        }

        let method = request.method.clone();
        let path = request.path.clone();
        let timeout = self.inner.config.timeout;

        let response = match tokio::time::timeout(timeout, self.inner.transport.send(request)).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(%method, path = %path, error = %e, "request failed without response");
                return Err(e.into());
            }
            Err(_) => {
                warn!(%method, path = %path, ?timeout, "request timed out");
                return Err(ClientError::Timeout(timeout));
            }
        };

        debug!(%method, path = %path, status = response.status, "response received");

        if response.is_success() {
            return Ok(response);
        }

        let message = error_message(&response);
        if response.status == 401 {
            warn!(path = %path, "credential rejected, emitting unauthorized");
            self.emit(ClientEvent::Unauthorized { path });
            return Err(ClientError::Unauthorized { message });
        }

        Err(ClientError::Api {
            status: response.status,
            message,
        })
    }

    fn emit(&self, event: ClientEvent) {
        let listeners = self.inner.listeners.read().clone();
        for listener in &listeners {
            listener.on_event(&event);
        }
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }
}

fn decode_body<R: DeserializeOwned>(path: &str, body: &[u8]) -> ClientResult<R> {
    let body = if body.is_empty() { b"null".as_slice() } else { body };
    serde_json::from_slice(body).map_err(|e| {
        ClientError::MalformedResponse(format!("cannot decode response from {path}: {e}"))
    })
}

fn error_message(response: &HttpResponse) -> String {
    serde_json::from_slice::<Value>(&response.body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .or_else(|| {
            reqwest::StatusCode::from_u16(response.status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .map(String::from)
        })
        .unwrap_or_default()
}
