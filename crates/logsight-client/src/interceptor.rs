//! Request interceptors composed into the client at construction time.

use std::sync::Arc;

use crate::transport::HttpRequest;

/// Hook run on every outgoing request before it reaches the transport.
pub trait RequestInterceptor: Send + Sync {
    /// Modify the request in place.
    fn intercept(&self, request: &mut HttpRequest);
}

/// Something that can supply the current bearer credential.
pub trait CredentialSource: Send + Sync {
    /// The current token, or `None` when signed out.
    fn bearer_token(&self) -> Option<String>;
}

impl<C: CredentialSource + ?Sized> CredentialSource for Arc<C> {
    fn bearer_token(&self) -> Option<String> {
        (**self).bearer_token()
    }
}

/// Fixed credential, for scripts and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl CredentialSource for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Attaches `Authorization: Bearer <token>` whenever the source has a
/// non-empty token.
#[derive(Debug, Clone)]
pub struct BearerAuth<C> {
    source: C,
}

impl<C: CredentialSource> BearerAuth<C> {
    /// Read credentials from `source` on every request.
    pub const fn new(source: C) -> Self {
        Self { source }
    }
}

impl<C: CredentialSource> RequestInterceptor for BearerAuth<C> {
    fn intercept(&self, request: &mut HttpRequest) {
        match self.source.bearer_token() {
            Some(token) if !token.is_empty() => {
                request.set_header("Authorization", format!("Bearer {token}"));
            }
            _ => {}
        }
    }
}
