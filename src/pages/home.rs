//! Front page: the post list and the new-post form.

#[cfg(test)]
#[path = "home_test.rs"]
mod home_test;

use std::fmt::Write;

use crate::error::{PageError, ValidationError};
use crate::net::types::{NewPost, Post};
use crate::state::Session;

/// Form state of the front page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HomePage {
    pub title: String,
    pub link: String,
}

impl HomePage {
    #[must_use]
    pub fn posts<'a>(&self, session: &'a Session) -> &'a [Post] {
        session.posts.posts()
    }

    #[must_use]
    pub fn is_logged_in(&self, session: &Session) -> bool {
        super::logged_in_for_display(session)
    }

    /// Submit the form as a new post.
    ///
    /// A blank title is rejected without any request. Otherwise the form is
    /// cleared as soon as the post is dispatched, whatever the outcome.
    ///
    /// # Errors
    ///
    /// `PageError::Validation` for a blank title, `PageError::Posts` when
    /// the backend rejects the post.
    pub async fn add_post(&mut self, session: &mut Session) -> Result<(), PageError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::BlankTitle.into());
        }
        let title = std::mem::take(&mut self.title);
        let link = std::mem::take(&mut self.link);
        let post = NewPost { title, link: (!link.trim().is_empty()).then_some(link) };

        session.posts.create(&session.auth, &post).await?;
        Ok(())
    }

    /// Upvote a listed post. Failures are logged and otherwise ignored.
    #[allow(clippy::unused_self)]
    pub async fn upvote(&self, session: &mut Session, post_id: &str) {
        if let Err(e) = session.posts.upvote_listed(&session.auth, post_id).await {
            tracing::warn!(%post_id, error = %e, "upvote failed");
        }
    }

    /// Downvote a listed post. Failures are logged and otherwise ignored.
    #[allow(clippy::unused_self)]
    pub async fn downvote(&self, session: &mut Session, post_id: &str) {
        if let Err(e) = session.posts.downvote_listed(&session.auth, post_id).await {
            tracing::warn!(%post_id, error = %e, "downvote failed");
        }
    }

    /// Post list ordered by upvotes, most first; ties keep server order.
    #[must_use]
    pub fn ranked<'a>(&self, session: &'a Session) -> Vec<&'a Post> {
        rank(self.posts(session))
    }

    #[must_use]
    pub fn render(&self, session: &Session) -> String {
        let mut out = String::from("Flapper News\n");
        let ranked = self.ranked(session);
        if ranked.is_empty() {
            out.push_str("  (no posts yet)\n");
        }
        for post in ranked {
            let _ = write!(out, "  [+{} / -{}] {}", post.upvotes, post.downvotes, post.title);
            if let Some(link) = post.link.as_deref().filter(|l| !l.is_empty()) {
                let _ = write!(out, " <{link}>");
            }
            let _ = write!(out, "  ({} comments", post.comments.len());
            if let Some(author) = &post.author {
                let _ = write!(out, ", by {author}");
            }
            let _ = writeln!(out, ")  #{}", post.id);
        }
        if !self.is_logged_in(session) {
            out.push_str("\nLog in or register to add a post.\n");
        }
        out
    }
}

fn rank(posts: &[Post]) -> Vec<&Post> {
    let mut ranked: Vec<&Post> = posts.iter().collect();
    ranked.sort_by(|a, b| b.upvotes.cmp(&a.upvotes));
    ranked
}
