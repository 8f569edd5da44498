//! REST helpers for the forum backend.
//!
//! ERROR HANDLING
//! ==============
//! Every call maps to exactly one HTTP round-trip. Non-2xx statuses become
//! `ApiError::Status` carrying the backend's `{message}` when it sent one;
//! nothing is retried.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use super::types::{Comment, Credentials, ErrorPayload, NewComment, NewPost, Post, TokenResponse, Vote};
use crate::config::{ClientConfig, HttpTimeouts};
use crate::error::ApiError;

/// Typed binding of the forum HTTP contract.
///
/// Cloning is cheap; the inner `reqwest::Client` shares its pool.
#[derive(Clone, Debug)]
pub struct ForumApi {
    http: reqwest::Client,
    base_url: String,
    base: Url,
}

impl ForumApi {
    /// Build a client for `base_url` with the given timeouts.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidBaseUrl` if `base_url` is not an absolute
    /// http(s) URL, `ApiError::HttpClientBuild` if the TLS backend fails to
    /// initialize.
    pub fn new(base_url: &str, timeouts: HttpTimeouts) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        let base = Url::parse(&base_url).map_err(|e| ApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url, base })
    }

    /// # Errors
    ///
    /// See [`ForumApi::new`].
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(&config.base_url, config.timeouts)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =========================================================================
    // POSTS
    // =========================================================================

    /// `GET /posts`
    pub async fn list_posts(&self) -> Result<Vec<Post>, ApiError> {
        Self::send_json(self.request(Method::GET, &["posts"], None)?).await
    }

    /// `GET /posts/{id}`
    pub async fn get_post(&self, id: &str) -> Result<Post, ApiError> {
        Self::send_json(self.request(Method::GET, &["posts", id], None)?).await
    }

    /// `POST /posts`
    pub async fn create_post(&self, token: Option<&str>, post: &NewPost) -> Result<Post, ApiError> {
        Self::send_json(self.request(Method::POST, &["posts"], token)?.json(post)).await
    }

    /// `PUT /posts/{id}/upvote` or `/downvote`. The response body is ignored.
    pub async fn vote_post(&self, token: Option<&str>, post_id: &str, vote: Vote) -> Result<(), ApiError> {
        let path = ["posts", post_id, vote.path_segment()];
        Self::send_empty(self.request(Method::PUT, &path, token)?).await
    }

    /// `POST /posts/{id}/comments`
    pub async fn add_comment(
        &self,
        token: Option<&str>,
        post_id: &str,
        comment: &NewComment,
    ) -> Result<Comment, ApiError> {
        Self::send_json(self.request(Method::POST, &["posts", post_id, "comments"], token)?.json(comment)).await
    }

    /// `PUT /posts/{id}/comments/{cid}/upvote` or `/downvote`.
    pub async fn vote_comment(
        &self,
        token: Option<&str>,
        post_id: &str,
        comment_id: &str,
        vote: Vote,
    ) -> Result<(), ApiError> {
        let path = ["posts", post_id, "comments", comment_id, vote.path_segment()];
        Self::send_empty(self.request(Method::PUT, &path, token)?).await
    }

    // =========================================================================
    // AUTH
    // =========================================================================

    /// `POST /register`
    pub async fn register(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        self.send_credentials("register", credentials).await
    }

    /// `POST /login`
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        self.send_credentials("login", credentials).await
    }

    async fn send_credentials(&self, path: &str, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        Self::send_json(self.request(Method::POST, &[path], None)?.json(credentials)).await
    }

    // =========================================================================
    // TRANSPORT
    // =========================================================================

    fn request(&self, method: Method, segments: &[&str], token: Option<&str>) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%method, %url, authorized = token.is_some(), "forum request");
        let request = self.http.request(method, url);
        Ok(match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    /// Append `segments` to the base path, percent-encoding each one so an
    /// id can never add path segments or a query.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(ApiError::InvalidId((*bad).to_owned()));
        }
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let text = Self::send(request).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn send_empty(request: RequestBuilder) -> Result<(), ApiError> {
        Self::send(request).await.map(|_| ())
    }

    async fn send(request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        if !(200..300).contains(&status) {
            tracing::debug!(status, body = %text, "forum request rejected");
            return Err(ApiError::Status { status, message: error_message(&text) });
        }
        Ok(text)
    }
}

/// Pull a display message out of an error body: `{message}` JSON first,
/// then any non-empty raw text.
fn error_message(body: &str) -> Option<String> {
    if let Ok(payload) = serde_json::from_str::<ErrorPayload>(body) {
        return Some(payload.message);
    }
    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}
