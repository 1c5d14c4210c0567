// Board domain models - posts, comments, likes and the aggregate views over them.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: i64,
    pub category: String,
    pub title: String,
    pub message: String,
    /// Always equal to the number of like rows for this post
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub username: String,
    pub text: String,
}

/// A post together with every comment on it, as shown in the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostWithComments {
    pub post: Post,
    pub comments: Vec<Comment>,
}

/// A post submission before moderation.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub category: String,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub username: String,
    pub text: String,
}

/// What happened when a user tried to like a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    /// First like from this user; carries the post's new counter
    Liked { likes: i64 },
    AlreadyLiked,
    PostNotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoardStats {
    pub posts_this_week: i64,
    pub total_likes: i64,
    pub total_comments: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trending {
    pub categories: Vec<CategoryCount>,
    pub top_posts: Vec<Post>,
}
