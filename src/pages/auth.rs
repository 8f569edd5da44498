//! Login and registration forms.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::fmt::Write;

use crate::error::AuthError;
use crate::net::types::Credentials;
use crate::router::Route;
use crate::state::Session;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

/// Credential form shared by the login and register views.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthPage {
    pub mode: AuthMode,
    pub user: Credentials,
    /// Server message from the last failed attempt, shown inline.
    pub error: Option<String>,
}

impl AuthPage {
    #[must_use]
    pub fn new(mode: AuthMode) -> Self {
        Self { mode, user: Credentials::default(), error: None }
    }

    /// Submit the form according to `mode`.
    pub async fn submit(&mut self, session: &Session) -> Option<Route> {
        match self.mode {
            AuthMode::Login => self.log_in(session).await,
            AuthMode::Register => self.register(session).await,
        }
    }

    /// Register with the form credentials.
    ///
    /// Returns the route to navigate to on success; on failure records the
    /// server's message in `error` and returns `None`.
    pub async fn register(&mut self, session: &Session) -> Option<Route> {
        let outcome = session.auth.register(&self.user).await;
        self.settle(outcome)
    }

    /// Log in with the form credentials. See [`AuthPage::register`].
    pub async fn log_in(&mut self, session: &Session) -> Option<Route> {
        let outcome = session.auth.log_in(&self.user).await;
        self.settle(outcome)
    }

    fn settle(&mut self, outcome: Result<(), AuthError>) -> Option<Route> {
        match outcome {
            Ok(()) => {
                self.error = None;
                Some(Route::Home)
            }
            Err(e) => {
                tracing::debug!(error = %e, mode = ?self.mode, "auth attempt rejected");
                self.error = Some(match e {
                    AuthError::Api(api) => api.display_message(),
                    other => other.to_string(),
                });
                None
            }
        }
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from(match self.mode {
            AuthMode::Login => "Log In\n",
            AuthMode::Register => "Register\n",
        });
        if let Some(error) = &self.error {
            let _ = writeln!(out, "  error: {error}");
        }
        if !self.user.username.is_empty() {
            let _ = writeln!(out, "  username: {}", self.user.username);
        }
        out
    }
}
