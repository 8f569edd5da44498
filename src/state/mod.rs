//! Client-side state: the token slot and the services built on it.
//!
//! DESIGN
//! ======
//! Nothing here is global. A [`Session`] owns the auth and posts services
//! and is handed by `&mut` to the router and the pages, which is the only
//! way the shared post list gets mutated.

pub mod auth;
pub mod posts;
pub mod token_store;

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::net::api::ForumApi;

use self::auth::AuthService;
use self::posts::PostsService;
use self::token_store::{FileTokenStore, TokenStore};

/// Everything a page needs to talk to the forum.
#[derive(Debug)]
pub struct Session {
    pub auth: AuthService,
    pub posts: PostsService,
}

impl Session {
    #[must_use]
    pub fn new(api: ForumApi, store: Arc<dyn TokenStore>) -> Self {
        Self { auth: AuthService::new(api.clone(), store), posts: PostsService::new(api) }
    }

    /// Session against the configured backend, persisting the token on disk.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidBaseUrl` for an unusable base URL and
    /// `ApiError::HttpClientBuild` if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let api = ForumApi::from_config(config)?;
        let store = FileTokenStore::new(config.token_path());
        Ok(Self::new(api, Arc::new(store)))
    }
}
