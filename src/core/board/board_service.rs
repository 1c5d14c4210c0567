// Board service - posting, commenting, liking and the read-side aggregates.
//
// Text-bearing writes (posts, comments) go through the moderation gate before
// anything reaches the store. Everything else talks to the store directly.

use super::board_models::{BoardStats, Comment, LikeOutcome, NewComment, NewPost, Post, PostWithComments, Trending};
use super::board_store::BoardStore;
use crate::core::moderation::{ModerationClassifier, ModerationService};
use chrono::{Duration, Utc};
use std::sync::Arc;
use thiserror::Error;

/// How many posts the feed returns.
pub const RECENT_POSTS_LIMIT: usize = 100;
/// Window for the "posts this week" counter.
pub const STATS_WINDOW_DAYS: i64 = 7;
pub const TRENDING_CATEGORY_LIMIT: usize = 5;
pub const TRENDING_POST_LIMIT: usize = 3;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Empty comment")]
    EmptyComment,

    #[error("Message contains inappropriate or unsafe content")]
    UnsafePost,

    #[error("Comment contains inappropriate or unsafe content")]
    UnsafeComment,

    #[error("You have already liked this post")]
    AlreadyLiked,

    #[error("Post {0} not found")]
    PostNotFound(i64),

    #[error("Storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct BoardService<S: BoardStore, C: ModerationClassifier> {
    store: S,
    moderation: Arc<ModerationService<C>>,
}

impl<S: BoardStore, C: ModerationClassifier> BoardService<S, C> {
    pub fn new(store: S, moderation: Arc<ModerationService<C>>) -> Self {
        Self { store, moderation }
    }

    /// Publish a post once it passes moderation.
    pub async fn create_post(&self, post: NewPost) -> Result<Post, BoardError> {
        if post.message.trim().is_empty() {
            return Err(BoardError::EmptyMessage);
        }

        if !self.moderation.is_safe(&post.message).await {
            return Err(BoardError::UnsafePost);
        }
        if !post.title.trim().is_empty() && !self.moderation.is_safe(&post.title).await {
            return Err(BoardError::UnsafePost);
        }

        let created = self.store.insert_post(&post, Utc::now()).await?;
        tracing::info!(post_id = created.id, category = %created.category, "Post created");
        Ok(created)
    }

    /// Add a comment to an existing post once it passes moderation.
    pub async fn add_comment(
        &self,
        post_id: i64,
        username: &str,
        text: &str,
    ) -> Result<Comment, BoardError> {
        if text.trim().is_empty() {
            return Err(BoardError::EmptyComment);
        }

        if !self.moderation.is_safe(text).await {
            return Err(BoardError::UnsafeComment);
        }

        if !self.store.post_exists(post_id).await? {
            return Err(BoardError::PostNotFound(post_id));
        }

        let comment = self
            .store
            .insert_comment(NewComment {
                post_id,
                username: username.to_string(),
                text: text.to_string(),
            })
            .await?;

        tracing::info!(post_id, comment_id = comment.id, username, "Comment added");
        Ok(comment)
    }

    /// Like a post once per user. Returns the post's new like count.
    pub async fn like_post(&self, post_id: i64, username: &str) -> Result<i64, BoardError> {
        match self.store.like_post(post_id, username).await? {
            LikeOutcome::Liked { likes } => {
                tracing::debug!(post_id, username, likes, "Post liked");
                Ok(likes)
            }
            LikeOutcome::AlreadyLiked => Err(BoardError::AlreadyLiked),
            LikeOutcome::PostNotFound => Err(BoardError::PostNotFound(post_id)),
        }
    }

    /// The feed: newest posts with their comments.
    pub async fn recent_posts(&self) -> Result<Vec<PostWithComments>, BoardError> {
        self.store.recent_posts(RECENT_POSTS_LIMIT).await
    }

    pub async fn stats(&self) -> Result<BoardStats, BoardError> {
        let week_ago = Utc::now() - Duration::days(STATS_WINDOW_DAYS);

        Ok(BoardStats {
            posts_this_week: self.store.count_posts_since(week_ago).await?,
            total_likes: self.store.total_likes().await?,
            total_comments: self.store.total_comments().await?,
        })
    }

    pub async fn trending(&self) -> Result<Trending, BoardError> {
        Ok(Trending {
            categories: self.store.top_categories(TRENDING_CATEGORY_LIMIT).await?,
            top_posts: self.store.top_posts(TRENDING_POST_LIMIT).await?,
        })
    }
}
