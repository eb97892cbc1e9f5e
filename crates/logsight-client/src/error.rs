//! Error types for the console client.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the HTTP adapter and the session store.
///
/// Variants follow the failure taxonomy callers branch on: no response at all
/// (`Transport`, `Timeout`), a 401 (`Unauthorized`), a 2xx whose payload is
/// missing something required (`MalformedResponse`), and any other non-2xx
/// (`Api`).
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// No response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The server rejected the credential. The session has already been
    /// cleared by the time a caller sees this.
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Server-supplied message, if any.
        message: String,
    },

    /// The transport succeeded but the payload is unusable.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Any other non-2xx response, passed through verbatim.
    #[error("server returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Server-supplied message, or the canonical reason phrase.
        message: String,
    },

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Persisted session state could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),
}

impl ClientError {
    /// Whether this failure is a 401.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// HTTP status attached to the failure, if a response was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<logsight_persist::PersistError> for ClientError {
    fn from(err: logsight_persist::PersistError) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Failure reported by a [`Transport`](crate::transport::Transport) when no
/// HTTP response could be obtained.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err.0)
    }
}
