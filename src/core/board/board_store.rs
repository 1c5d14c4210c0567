use super::board_models::{
    CategoryCount, Comment, LikeOutcome, NewComment, NewPost, Post, PostWithComments,
};
use super::board_service::BoardError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Persistence for posts, comments and likes.
#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Insert a post with `likes = 0` and the given creation time.
    async fn insert_post(&self, post: &NewPost, created_at: DateTime<Utc>)
        -> Result<Post, BoardError>;

    async fn post_exists(&self, post_id: i64) -> Result<bool, BoardError>;

    /// Newest posts first (ties by id), each with its comments in insertion order.
    async fn recent_posts(&self, limit: usize) -> Result<Vec<PostWithComments>, BoardError>;

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, BoardError>;

    /// Record a like and bump the post's counter as one unit.
    ///
    /// Either both the like row and the counter change, or neither does.
    async fn like_post(&self, post_id: i64, username: &str) -> Result<LikeOutcome, BoardError>;

    /// Number of like rows recorded for a post.
    #[allow(dead_code)]
    async fn count_likes(&self, post_id: i64) -> Result<i64, BoardError>;

    async fn count_posts_since(&self, since: DateTime<Utc>) -> Result<i64, BoardError>;

    async fn total_likes(&self) -> Result<i64, BoardError>;

    async fn total_comments(&self) -> Result<i64, BoardError>;

    /// Categories by post count, largest first.
    async fn top_categories(&self, limit: usize) -> Result<Vec<CategoryCount>, BoardError>;

    /// Posts by like count, largest first.
    async fn top_posts(&self, limit: usize) -> Result<Vec<Post>, BoardError>;
}
