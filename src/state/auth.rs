//! Token-backed authentication state.
//!
//! DESIGN
//! ======
//! There is no client-side user object. Login status and the current user
//! are derived on every call from the persisted token's claims, so logging
//! out is just clearing the token slot.
//!
//! ERROR HANDLING
//! ==============
//! A token that cannot be decoded is a `TokenError`, never a panic. Callers
//! decide whether to treat it as "logged out" or surface it.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::Deserialize;

use super::token_store::TokenStore;
use crate::error::{AuthError, TokenError};
use crate::net::api::ForumApi;
use crate::net::types::Credentials;

const LENIENT_PADDING: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT_PADDING);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT_PADDING);

/// Decoded payload segment of the bearer token.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Claims {
    /// Expiry, seconds since the Unix epoch. NumericDate may be fractional.
    pub exp: f64,
    pub username: String,
    #[serde(rename = "_id", default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub iat: Option<f64>,
}

impl Claims {
    /// Decode the claims segment of a `header.claims.signature` token.
    ///
    /// The segment may use the URL-safe or the standard base64 alphabet,
    /// with or without padding. The signature is not verified.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` when the token does not have three segments or
    /// the middle one is not base64-encoded JSON claims.
    pub fn decode(token: &str) -> Result<Self, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [_, payload, _] = segments.as_slice() else {
            return Err(TokenError::Malformed { segments: segments.len() });
        };

        let engine = if payload.contains(['+', '/']) { &STANDARD_LENIENT } else { &URL_SAFE_LENIENT };
        let bytes = engine.decode(payload)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// True while `exp` is strictly after `now`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn is_live_at(&self, now: i64) -> bool {
        self.exp > now as f64
    }
}

/// Current time in whole seconds since the Unix epoch.
#[must_use]
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

/// Login/registration plus login-status queries over the token slot.
#[derive(Clone)]
pub struct AuthService {
    api: ForumApi,
    store: Arc<dyn TokenStore>,
}

impl AuthService {
    #[must_use]
    pub fn new(api: ForumApi, store: Arc<dyn TokenStore>) -> Self {
        Self { api, store }
    }

    /// The raw persisted token, if any.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Store` if the slot cannot be read.
    pub fn token(&self) -> Result<Option<String>, AuthError> {
        Ok(self.store.get()?)
    }

    /// Persist `token`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Store` if the slot cannot be written.
    pub fn save_token(&self, token: &str) -> Result<(), AuthError> {
        Ok(self.store.save(token)?)
    }

    /// Claims of the persisted token, regardless of expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` for an undecodable token.
    pub fn claims(&self) -> Result<Option<Claims>, AuthError> {
        match self.token()? {
            Some(token) => Ok(Some(Claims::decode(&token)?)),
            None => Ok(None),
        }
    }

    /// # Errors
    ///
    /// See [`AuthService::claims`].
    pub fn is_logged_in(&self) -> Result<bool, AuthError> {
        self.is_logged_in_at(unix_now())
    }

    /// Login status evaluated against an explicit clock.
    ///
    /// # Errors
    ///
    /// See [`AuthService::claims`].
    pub fn is_logged_in_at(&self, now: i64) -> Result<bool, AuthError> {
        Ok(self.claims()?.is_some_and(|claims| claims.is_live_at(now)))
    }

    /// Username of the logged-in user; `None` when logged out or expired.
    ///
    /// # Errors
    ///
    /// See [`AuthService::claims`].
    pub fn current_user(&self) -> Result<Option<String>, AuthError> {
        self.current_user_at(unix_now())
    }

    /// # Errors
    ///
    /// See [`AuthService::claims`].
    pub fn current_user_at(&self, now: i64) -> Result<Option<String>, AuthError> {
        Ok(self
            .claims()?
            .filter(|claims| claims.is_live_at(now))
            .map(|claims| claims.username))
    }

    /// `POST /register`, then persist the returned token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Api` carrying the server's message on rejection.
    pub async fn register(&self, credentials: &Credentials) -> Result<(), AuthError> {
        let response = self.api.register(credentials).await?;
        self.save_token(&response.token)?;
        tracing::info!(username = %credentials.username, "registered");
        Ok(())
    }

    /// `POST /login`, then persist the returned token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Api` carrying the server's message on rejection.
    pub async fn log_in(&self, credentials: &Credentials) -> Result<(), AuthError> {
        let response = self.api.login(credentials).await?;
        self.save_token(&response.token)?;
        tracing::info!(username = %credentials.username, "logged in");
        Ok(())
    }

    /// Forget the persisted token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Store` if the slot cannot be cleared.
    pub fn log_out(&self) -> Result<(), AuthError> {
        self.store.clear()?;
        tracing::info!("logged out");
        Ok(())
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("base_url", &self.api.base_url())
            .finish_non_exhaustive()
    }
}
