//! Shared post list plus the CRUD/vote operations that feed it.
//!
//! DESIGN
//! ======
//! Local state only changes after the server confirmed the mutation. Vote
//! counts are bumped by exactly one on success; the response body of a vote
//! call is never read.
//!
//! `list` is refreshed in place (`clear` + `extend`) so anything holding the
//! service sees the same `Vec` before and after a reload.

#[cfg(test)]
#[path = "posts_test.rs"]
mod posts_test;

use super::auth::AuthService;
use crate::error::PostsError;
use crate::net::api::ForumApi;
use crate::net::types::{Comment, NewComment, NewPost, Post, Vote};

#[derive(Clone, Debug)]
pub struct PostsService {
    api: ForumApi,
    list: Vec<Post>,
}

impl PostsService {
    #[must_use]
    pub fn new(api: ForumApi) -> Self {
        Self { api, list: Vec::new() }
    }

    /// The shared post list, in server order.
    #[must_use]
    pub fn posts(&self) -> &[Post] {
        &self.list
    }

    #[must_use]
    pub fn listed(&self, post_id: &str) -> Option<&Post> {
        self.list.iter().find(|p| p.id == post_id)
    }

    /// Reload every post into the shared list.
    ///
    /// # Errors
    ///
    /// Returns `PostsError::Api` on failure; the list is left untouched.
    pub async fn get_all(&mut self) -> Result<&[Post], PostsError> {
        let fetched = self.api.list_posts().await?;
        self.list.clear();
        self.list.extend(fetched);
        tracing::debug!(count = self.list.len(), "posts loaded");
        Ok(&self.list)
    }

    /// Fetch a single post. The shared list is not touched.
    ///
    /// # Errors
    ///
    /// Returns `PostsError::Api` on failure.
    pub async fn get(&self, id: &str) -> Result<Post, PostsError> {
        Ok(self.api.get_post(id).await?)
    }

    /// Submit a new post and append the server's copy to the shared list.
    ///
    /// # Errors
    ///
    /// Returns `PostsError::Api` on failure; nothing is appended.
    pub async fn create(&mut self, auth: &AuthService, post: &NewPost) -> Result<&Post, PostsError> {
        let token = auth.token()?;
        let created = self.api.create_post(token.as_deref(), post).await?;
        tracing::info!(post_id = %created.id, title = %created.title, "post created");
        self.list.push(created);
        Ok(&self.list[self.list.len() - 1])
    }

    // =========================================================================
    // POST VOTES
    // =========================================================================

    /// Upvote a post the caller owns.
    ///
    /// # Errors
    ///
    /// Returns `PostsError::Api` on failure; the count is unchanged.
    pub async fn upvote(&self, auth: &AuthService, post: &mut Post) -> Result<(), PostsError> {
        vote_post(&self.api, auth, post, Vote::Up).await
    }

    /// Downvote a post the caller owns.
    ///
    /// # Errors
    ///
    /// Returns `PostsError::Api` on failure; the count is unchanged.
    pub async fn downvote(&self, auth: &AuthService, post: &mut Post) -> Result<(), PostsError> {
        vote_post(&self.api, auth, post, Vote::Down).await
    }

    /// Upvote a post in the shared list.
    ///
    /// # Errors
    ///
    /// Returns `PostsError::UnknownPost` without any request when `post_id`
    /// is not listed, otherwise as [`PostsService::upvote`].
    pub async fn upvote_listed(&mut self, auth: &AuthService, post_id: &str) -> Result<(), PostsError> {
        self.vote_listed(auth, post_id, Vote::Up).await
    }

    /// Downvote a post in the shared list.
    ///
    /// # Errors
    ///
    /// See [`PostsService::upvote_listed`].
    pub async fn downvote_listed(&mut self, auth: &AuthService, post_id: &str) -> Result<(), PostsError> {
        self.vote_listed(auth, post_id, Vote::Down).await
    }

    async fn vote_listed(&mut self, auth: &AuthService, post_id: &str, vote: Vote) -> Result<(), PostsError> {
        let Self { api, list } = self;
        let post = list
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| PostsError::UnknownPost(post_id.to_owned()))?;
        vote_post(api, auth, post, vote).await
    }

    // =========================================================================
    // COMMENTS
    // =========================================================================

    /// Submit a comment. The caller appends the returned comment to its post.
    ///
    /// # Errors
    ///
    /// Returns `PostsError::Api` on failure.
    pub async fn add_comment(
        &self,
        auth: &AuthService,
        post_id: &str,
        comment: &NewComment,
    ) -> Result<Comment, PostsError> {
        let token = auth.token()?;
        let created = self.api.add_comment(token.as_deref(), post_id, comment).await?;
        tracing::info!(%post_id, comment_id = %created.id, "comment added");
        Ok(created)
    }

    /// # Errors
    ///
    /// Returns `PostsError::UnknownComment` without any request when the
    /// comment is not loaded on `post`, `PostsError::Api` on failure.
    pub async fn upvote_comment(&self, auth: &AuthService, post: &mut Post, comment_id: &str) -> Result<(), PostsError> {
        self.vote_comment(auth, post, comment_id, Vote::Up).await
    }

    /// # Errors
    ///
    /// See [`PostsService::upvote_comment`].
    pub async fn downvote_comment(
        &self,
        auth: &AuthService,
        post: &mut Post,
        comment_id: &str,
    ) -> Result<(), PostsError> {
        self.vote_comment(auth, post, comment_id, Vote::Down).await
    }

    async fn vote_comment(
        &self,
        auth: &AuthService,
        post: &mut Post,
        comment_id: &str,
        vote: Vote,
    ) -> Result<(), PostsError> {
        let post_id = post.id.clone();
        let comment = post.comment_mut(comment_id).ok_or_else(|| PostsError::UnknownComment {
            post_id: post_id.clone(),
            comment_id: comment_id.to_owned(),
        })?;
        let token = auth.token()?;
        self.api
            .vote_comment(token.as_deref(), &post_id, comment_id, vote)
            .await?;
        bump(&mut comment.upvotes, &mut comment.downvotes, vote);
        tracing::debug!(%post_id, %comment_id, ?vote, "comment vote recorded");
        Ok(())
    }
}

async fn vote_post(api: &ForumApi, auth: &AuthService, post: &mut Post, vote: Vote) -> Result<(), PostsError> {
    let token = auth.token()?;
    api.vote_post(token.as_deref(), &post.id, vote).await?;
    bump(&mut post.upvotes, &mut post.downvotes, vote);
    tracing::debug!(post_id = %post.id, ?vote, "post vote recorded");
    Ok(())
}

fn bump(upvotes: &mut u64, downvotes: &mut u64, vote: Vote) {
    match vote {
        Vote::Up => *upvotes += 1,
        Vote::Down => *downvotes += 1,
    }
}
