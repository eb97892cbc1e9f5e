//! Wire-level request/response types and the [`Transport`] seam.
//!
//! [`ApiClient`](crate::ApiClient) builds an [`HttpRequest`], runs it through
//! its interceptors and hands it to a transport. The transport only moves
//! bytes; status classification and decoding stay in the client.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use crate::error::{ClientError, TransportError};

pub use reqwest::Method;

/// An outgoing request, fully resolved.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Relative API path, e.g. `/logs/list`.
    pub path: String,
    /// Absolute URL (base URL joined with `path`).
    pub url: String,
    /// Query string pairs.
    pub query: Vec<(String, String)>,
    /// Extra headers.
    pub headers: Vec<(String, String)>,
    /// Body.
    pub body: RequestBody,
}

impl HttpRequest {
    /// Create a request with no query, headers or body.
    pub fn new(method: Method, path: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    /// Look up a header value, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Set a header, replacing any existing value with the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }
}

/// Request body variants the console sends.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// JSON document.
    Json(Value),
    /// `multipart/form-data` payload.
    Multipart(MultipartForm),
}

/// A `multipart/form-data` payload: plain text fields plus file parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    /// Text fields.
    pub fields: Vec<(String, String)>,
    /// File parts.
    pub files: Vec<FilePart>,
}

/// One file inside a [`MultipartForm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Form field name.
    pub field: String,
    /// File name reported to the server.
    pub file_name: String,
    /// MIME type, if known.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl MultipartForm {
    /// Empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Add a file part.
    #[must_use]
    pub fn file(
        mut self,
        field: impl Into<String>,
        file_name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        self.files.push(FilePart {
            field: field.into(),
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        });
        self
    }

    /// Whether the form carries no fields and no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.files.is_empty()
    }

    fn into_reqwest(self) -> Result<reqwest::multipart::Form, TransportError> {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        for file in self.files {
            let mut part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.file_name);
            if let Some(content_type) = file.content_type {
                part = part
                    .mime_str(&content_type)
                    .map_err(|e| TransportError(format!("invalid content type: {e}")))?;
            }
            form = form.part(file.field, part);
        }
        Ok(form)
    }
}

/// A raw response: status plus undecoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Moves a request over the wire.
///
/// Implementations must not interpret status codes; every response that
/// arrives is returned as `Ok`.
pub trait Transport: Send + Sync + 'static {
    /// Send one request and collect the full response.
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        (**self).send(request)
    }
}

/// Production transport over `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a default `reqwest` client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing `reqwest` client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Create a transport whose client enforces `timeout` on its own.
    pub fn with_timeout(timeout: std::time::Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build http client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        trace!(method = %request.method, url = %request.url, "sending request");

        let mut builder = self.client.request(request.method, &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form.into_reqwest()?),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError(format!("failed to read response body: {e}")))?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut request = HttpRequest::new(Method::GET, "/logs/list", "http://x/api/logs/list");
        request.set_header("Authorization", "Bearer t1");

        assert_eq!(request.header("authorization"), Some("Bearer t1"));
        assert_eq!(request.header("AUTHORIZATION"), Some("Bearer t1"));
        assert_eq!(request.header("x-missing"), None);
    }

    #[test]
    fn test_set_header_replaces() {
        let mut request = HttpRequest::new(Method::GET, "/", "http://x/");
        request.set_header("authorization", "Bearer old");
        request.set_header("Authorization", "Bearer new");

        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header("authorization"), Some("Bearer new"));
    }

    #[test]
    fn test_multipart_builder() {
        let form = MultipartForm::new()
            .text("description", "nginx access log")
            .file("file", "access.log", b"GET / 200".to_vec());

        assert!(!form.is_empty());
        assert_eq!(form.fields.len(), 1);
        assert_eq!(form.files[0].file_name, "access.log");
        assert!(MultipartForm::new().is_empty());
    }

    #[test]
    fn test_response_success_range() {
        let ok = HttpResponse {
            status: 201,
            body: Vec::new(),
        };
        let not_ok = HttpResponse {
            status: 302,
            body: Vec::new(),
        };
        assert!(ok.is_success());
        assert!(!not_ok.is_success());
    }
}
