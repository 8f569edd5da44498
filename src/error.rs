//! Error types for every client layer.
//!
//! Each layer owns one enum and wraps the layer below it with `#[from]`, so
//! callers can `?` straight through and still match on the precise cause.

use std::path::PathBuf;

// =============================================================================
// NETWORK
// =============================================================================

/// Errors produced by calls against the forum backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connect failure, timeout, ...).
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("server returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String> },

    /// A success body did not match the expected shape.
    #[error("response decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The base URL cannot have endpoint paths appended to it.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// A post or comment id that cannot name a single path segment.
    #[error("invalid id {0:?}")]
    InvalidId(String),
}

impl ApiError {
    /// True when the backend rejected the request for missing or bad credentials.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }

    /// Human-readable message suitable for inline display next to a form.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::Status { message: Some(message), .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

// =============================================================================
// STORAGE + TOKENS
// =============================================================================

/// Token slot read/write failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("token store io failed at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The persisted token could not be decoded into claims.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token: expected 3 dot-separated segments, found {segments}")]
    Malformed { segments: usize },

    #[error("token claims are not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("token claims are not valid JSON: {0}")]
    Claims(#[from] serde_json::Error),
}

/// Errors surfaced by the auth service.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

// =============================================================================
// POSTS
// =============================================================================

/// Errors surfaced by the posts service.
#[derive(Debug, thiserror::Error)]
pub enum PostsError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Credentials could not be read from the token store.
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("post {0} is not in the loaded list")]
    UnknownPost(String),

    #[error("comment {comment_id} is not loaded on post {post_id}")]
    UnknownComment { post_id: String, comment_id: String },
}

// =============================================================================
// PAGES + NAVIGATION
// =============================================================================

/// Form input rejected before anything is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Title can't be blank")]
    BlankTitle,

    #[error("Comment can't be blank")]
    BlankComment,
}

/// Errors returned from page operations.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Posts(#[from] PostsError),
}

/// A route transition could not complete its pre-load.
#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    #[error("failed to load view data: {0}")]
    Posts(#[from] PostsError),

    #[error("failed to check login status: {0}")]
    Auth(#[from] AuthError),
}

// =============================================================================
// CONFIG
// =============================================================================

/// Client configuration could not be assembled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid base URL: {0} (expected http:// or https://)")]
    InvalidBaseUrl(String),
}
