//! Navigation bar: login status, current user, log out.

use crate::error::AuthError;
use crate::state::Session;

pub struct NavBar<'a> {
    session: &'a Session,
}

impl<'a> NavBar<'a> {
    #[must_use]
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// # Errors
    ///
    /// Returns `AuthError::Token` for an undecodable token.
    pub fn is_logged_in(&self) -> Result<bool, AuthError> {
        self.session.auth.is_logged_in()
    }

    /// # Errors
    ///
    /// Returns `AuthError::Token` for an undecodable token.
    pub fn current_user(&self) -> Result<Option<String>, AuthError> {
        self.session.auth.current_user()
    }

    /// # Errors
    ///
    /// Returns `AuthError::Store` if the token slot cannot be cleared.
    pub fn log_out(&self) -> Result<(), AuthError> {
        self.session.auth.log_out()
    }

    #[must_use]
    pub fn render(&self) -> String {
        match self.current_user() {
            Ok(Some(user)) => format!("Logged in as {user}  |  flapper logout\n"),
            Ok(None) => "Not logged in  |  flapper login / flapper register\n".to_owned(),
            Err(e) => format!("Unreadable session token ({e})  |  flapper logout\n"),
        }
    }
}

#[cfg(test)]
#[path = "nav_test.rs"]
mod nav_test;
