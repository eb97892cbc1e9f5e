//! # logsight-client
//!
//! Client core of the Logsight security log-analysis console.
//!
//! - [`ApiClient`]: the single path to the remote API. Joins paths onto the
//!   base URL, attaches the bearer credential, enforces the timeout,
//!   classifies failures and turns a 401 into a [`ClientEvent::Unauthorized`].
//! - [`SessionState`] and [`SessionStore`]: the process-wide session, the
//!   loaded log files and analysis results, and the async operations that
//!   fill them.
//! - [`guard`]: route metadata, the pre-navigation check and the
//!   [`Navigator`] that applies it.
//! - [`Console`]: wires all of the above together.
//!
//! ## Example
//!
//! ```rust,no_run
//! use logsight_client::{ClientConfig, Console, Credentials};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), logsight_client::ClientError> {
//! let console = Console::connect(ClientConfig::default(), Path::new("/tmp/logsight"))?;
//! console.store().login(&Credentials::new("analyst", "secret")).await?;
//! for file in console.store().fetch_log_files().await? {
//!     println!("{} {}", file.id, file.display_name());
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod console;
pub mod error;
pub mod guard;
pub mod interceptor;
pub mod mock;
pub mod session;
pub mod storage;
pub mod store;
pub mod transport;
pub mod types;

pub use client::{ApiClient, ApiClientBuilder, ClientEvent, ClientListener};
pub use config::ClientConfig;
pub use console::Console;
pub use error::{ClientError, ClientResult, TransportError};
pub use guard::{GuardDecision, Location, NavigationError, Navigator, RouteMeta, RouteTable};
pub use session::{Session, SessionState, StoreChange};
pub use storage::{FileSessionStorage, MemorySessionStorage, SessionStorage};
pub use store::SessionStore;
pub use transport::{HttpRequest, HttpResponse, Method, MultipartForm, ReqwestTransport, Transport};
pub use types::{
    Ack, AnalysisEntry, AnalysisHandle, AnalysisResults, AuthResponse, Credentials, FileStatus,
    LogFile, LogFilePage, Registration, UploadReceipt, User, UserProfile,
};
