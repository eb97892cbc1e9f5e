//! Authentication command implementation.
//!
//! Handles login, register, logout, whoami and profile.

use std::io::Write;

use logsight_client::guard::{LOGIN_PATH, REGISTER_PATH};
use logsight_client::{Ack, Console, Credentials, Registration, Session, Transport};
use tracing::info;

use super::enter_view;
use crate::error::CliError;
use crate::output::{OutputFormat, SessionView};

/// Handler for the session commands.
pub struct AuthCommand<'a, T> {
    console: &'a Console<T>,
}

impl<'a, T: Transport> AuthCommand<'a, T> {
    /// Creates a new auth command handler.
    #[must_use]
    pub const fn new(console: &'a Console<T>) -> Self {
        Self { console }
    }

    /// Sign in and persist the session.
    pub async fn login<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        username: &str,
        password: &str,
    ) -> Result<(), CliError> {
        self.console.navigator().navigate(LOGIN_PATH)?;
        let session = self
            .console
            .store()
            .login(&Credentials::new(username, password))
            .await?;
        self.signed_in(out, format, &session)
    }

    /// Create an account and sign in with it.
    pub async fn register<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), CliError> {
        self.console.navigator().navigate(REGISTER_PATH)?;
        let registration = Registration {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let session = self.console.store().register(&registration).await?;
        self.signed_in(out, format, &session)
    }

    /// Forget the persisted session.
    pub fn logout<W: Write>(&self, out: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let was_signed_in = self.console.state().is_authenticated();
        self.console.store().logout();
        let message = if was_signed_in {
            "Signed out"
        } else {
            "Not signed in"
        };
        format.write(out, &Ack {
            message: Some(message.into()),
        })
    }

    /// Show the persisted session without contacting the server.
    pub fn whoami<W: Write>(&self, out: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let session = self.console.state().session();
        format.write(out, &session_view(&session))
    }

    /// Fetch the signed-in user's profile.
    pub async fn profile<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
    ) -> Result<(), CliError> {
        enter_view(self.console, "/profile")?;
        let profile = self.console.store().fetch_profile().await?;
        format.write(out, &profile)
    }

    fn signed_in<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        session: &Session,
    ) -> Result<(), CliError> {
        let landed = self.console.navigator().resume()?;
        info!(to = %landed.location, "signed in");
        format.write(out, &session_view(session))
    }
}

fn session_view(session: &Session) -> SessionView {
    SessionView {
        authenticated: session.is_authenticated(),
        user: session.user().cloned(),
    }
}
