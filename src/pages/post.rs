//! Single-post page: the post, its comments and the comment form.

#[cfg(test)]
#[path = "post_test.rs"]
mod post_test;

use std::fmt::Write;

use crate::error::{PageError, ValidationError};
use crate::net::types::{CommentEntry, NewComment, Post};
use crate::state::Session;

/// Author recorded when nobody is logged in.
pub const FALLBACK_AUTHOR: &str = "user";

/// The resolved post plus the comment form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostPage {
    pub post: Post,
    pub body: String,
}

impl PostPage {
    #[must_use]
    pub fn new(post: Post) -> Self {
        Self { post, body: String::new() }
    }

    #[must_use]
    pub fn is_logged_in(&self, session: &Session) -> bool {
        super::logged_in_for_display(session)
    }

    /// Submit the form as a comment and append the server's copy on success.
    ///
    /// A blank body is rejected without any request; otherwise the form is
    /// cleared as soon as the comment is dispatched.
    ///
    /// # Errors
    ///
    /// `PageError::Validation` for a blank body, `PageError::Posts` when the
    /// backend rejects the comment.
    pub async fn add_comment(&mut self, session: &Session) -> Result<(), PageError> {
        if self.body.trim().is_empty() {
            return Err(ValidationError::BlankComment.into());
        }
        let author = session
            .auth
            .current_user()
            .ok()
            .flatten()
            .unwrap_or_else(|| FALLBACK_AUTHOR.to_owned());
        let comment = NewComment { body: std::mem::take(&mut self.body), author };

        let created = session
            .posts
            .add_comment(&session.auth, &self.post.id, &comment)
            .await?;
        self.post.comments.push(CommentEntry::Loaded(created));
        Ok(())
    }

    /// Upvote a comment. Failures are logged and otherwise ignored.
    pub async fn upvote(&mut self, session: &Session, comment_id: &str) {
        if let Err(e) = session
            .posts
            .upvote_comment(&session.auth, &mut self.post, comment_id)
            .await
        {
            tracing::warn!(post_id = %self.post.id, %comment_id, error = %e, "comment upvote failed");
        }
    }

    /// Downvote a comment. Failures are logged and otherwise ignored.
    pub async fn downvote(&mut self, session: &Session, comment_id: &str) {
        if let Err(e) = session
            .posts
            .downvote_comment(&session.auth, &mut self.post, comment_id)
            .await
        {
            tracing::warn!(post_id = %self.post.id, %comment_id, error = %e, "comment downvote failed");
        }
    }

    #[must_use]
    pub fn render(&self, session: &Session) -> String {
        let post = &self.post;
        let mut out = String::new();
        let _ = write!(out, "{}", post.title);
        if let Some(link) = post.link.as_deref().filter(|l| !l.is_empty()) {
            let _ = write!(out, " <{link}>");
        }
        let _ = writeln!(out, "\n  [+{} / -{}]  #{}", post.upvotes, post.downvotes, post.id);
        if let Some(author) = &post.author {
            let _ = writeln!(out, "  posted by {author}");
        }

        out.push('\n');
        if post.comments.is_empty() {
            out.push_str("  (no comments yet)\n");
        }
        for entry in &post.comments {
            match entry {
                CommentEntry::Loaded(c) => {
                    let _ = writeln!(out, "  [+{} / -{}] {}: {}  #{}", c.upvotes, c.downvotes, c.author, c.body, c.id);
                }
                CommentEntry::Ref(id) => {
                    let _ = writeln!(out, "  (comment #{id} not loaded)");
                }
            }
        }
        if !self.is_logged_in(session) {
            out.push_str("\nLog in or register to comment.\n");
        }
        out
    }
}
