//! Wire types exchanged with the console API.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Login request body.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    /// Account name.
    pub username: String,
    /// Plain-text password, sent over TLS.
    pub password: String,
}

impl Credentials {
    /// Create credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration request body.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Registration {
    /// Account name.
    pub username: String,
    /// Contact address.
    pub email: String,
    /// Plain-text password, sent over TLS.
    pub password: String,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The signed-in user as returned by the auth endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Numeric user id.
    pub id: u64,
    /// Account name.
    #[serde(alias = "name")]
    pub username: String,
    /// Contact address, when the server includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Response of `POST /auth/login` and `POST /auth/register`.
///
/// Both fields are optional on the wire; the session store treats a
/// response missing either as malformed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthResponse {
    /// Bearer credential.
    #[serde(default)]
    pub access_token: Option<String>,
    /// The authenticated user.
    #[serde(default)]
    pub user: Option<User>,
    /// Informational message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `GET /auth/profile`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    /// Numeric user id.
    pub id: u64,
    /// Account name.
    pub username: String,
    /// Contact address.
    #[serde(default)]
    pub email: Option<String>,
    /// Account creation time as formatted by the server.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Processing state of an uploaded log file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Uploaded, not yet analyzed.
    #[default]
    Pending,
    /// Analysis running.
    Processing,
    /// Analysis finished.
    Completed,
    /// Analysis failed.
    Failed,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// An uploaded log file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogFile {
    /// Server id.
    pub id: u64,
    /// Stored file name.
    #[serde(default)]
    pub filename: String,
    /// Name the file was uploaded under.
    #[serde(default)]
    pub original_filename: String,
    /// Size in bytes.
    #[serde(default)]
    pub file_size: u64,
    /// Declared file type.
    #[serde(default)]
    pub file_type: Option<String>,
    /// Upload time as formatted by the server.
    #[serde(default)]
    pub upload_time: Option<String>,
    /// Processing state.
    #[serde(default)]
    pub status: FileStatus,
    /// Analysis progress, 0–100.
    #[serde(default)]
    pub processing_progress: f64,
    /// Owner.
    #[serde(default)]
    pub user_id: Option<u64>,
}

impl LogFile {
    /// The name to show a user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.original_filename.is_empty() {
            &self.filename
        } else {
            &self.original_filename
        }
    }
}

/// Response of `GET /logs/list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LogFilePage {
    /// Files on this page, newest first.
    pub files: Vec<LogFile>,
    /// Total number of files across all pages.
    #[serde(default)]
    pub total: u64,
    /// Number of pages.
    #[serde(default)]
    pub pages: u64,
    /// Page index, 1-based.
    #[serde(default)]
    pub current_page: u64,
    /// Page size.
    #[serde(default)]
    pub per_page: u64,
}

/// Response of `POST /logs/upload`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadReceipt {
    /// Informational message.
    #[serde(default)]
    pub message: Option<String>,
    /// Id assigned to the new file.
    #[serde(default)]
    pub file_id: Option<u64>,
    /// The stored file record.
    #[serde(default)]
    pub file: Option<LogFile>,
}

/// Response of `POST /analysis/analyze/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisHandle {
    /// Informational message.
    #[serde(default)]
    pub message: Option<String>,
    /// File record at the time analysis was accepted.
    #[serde(default)]
    pub file: Option<LogFile>,
}

/// Analysis output for one file: one opaque document per analysis kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResults {
    /// File the results belong to.
    pub file_id: u64,
    /// Analysis kind (`anomaly`, `trend`, `summary`, ...) to result document.
    pub results: BTreeMap<String, Value>,
}

impl AnalysisResults {
    /// Result document for one analysis kind.
    #[must_use]
    pub fn kind(&self, kind: &str) -> Option<&Value> {
        self.results.get(kind)
    }
}

/// Response of `GET /analysis/results/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AnalysisResultsResponse {
    #[serde(default)]
    pub results: Option<BTreeMap<String, Value>>,
}

/// Response of `GET /analysis/results/{id}/{kind}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisEntry {
    /// Analysis kind.
    pub analysis_type: String,
    /// Result document.
    pub result: Value,
    /// File record.
    #[serde(default)]
    pub file: Option<LogFile>,
}

/// Generic `{ "message": ... }` acknowledgment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ack {
    /// Informational message.
    #[serde(default)]
    pub message: Option<String>,
}
