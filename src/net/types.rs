//! Wire types shared between the REST helpers and client state.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

/// A top-level discussion item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub upvotes: u64,
    #[serde(default)]
    pub downvotes: u64,
    #[serde(default)]
    pub comments: Vec<CommentEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Post {
    /// Comments that came back populated, in server order.
    pub fn loaded_comments(&self) -> impl Iterator<Item = &Comment> {
        self.comments.iter().filter_map(CommentEntry::as_loaded)
    }

    /// Look up a loaded comment by id.
    pub fn comment_mut(&mut self, comment_id: &str) -> Option<&mut Comment> {
        self.comments.iter_mut().find_map(|entry| match entry {
            CommentEntry::Loaded(comment) if comment.id == comment_id => Some(comment),
            _ => None,
        })
    }
}

/// One slot of a post's comment list.
///
/// `GET /posts` returns bare comment ids; `GET /posts/{id}` populates them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommentEntry {
    Loaded(Comment),
    Ref(String),
}

impl CommentEntry {
    #[must_use]
    pub fn as_loaded(&self) -> Option<&Comment> {
        match self {
            Self::Loaded(comment) => Some(comment),
            Self::Ref(_) => None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Loaded(comment) => &comment.id,
            Self::Ref(id) => id,
        }
    }
}

/// A reply attached to exactly one post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    pub body: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub upvotes: u64,
    #[serde(default)]
    pub downvotes: u64,
}

/// Body of `POST /posts`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Body of `POST /posts/{id}/comments`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub body: String,
    pub author: String,
}

/// Body of `POST /register` and `POST /login`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Success body of `POST /register` and `POST /login`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Error body the backend sends with 4xx responses.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

/// Direction of a vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vote {
    Up,
    Down,
}

impl Vote {
    /// Trailing path segment of the vote endpoints.
    #[must_use]
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Up => "upvote",
            Self::Down => "downvote",
        }
    }
}
