// JSON API used by the board page.

use super::error::ApiError;
use super::{session, AppState};
use crate::core::board::{BoardStats, CategoryCount, NewPost, Post, PostWithComments};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

const DEFAULT_CATEGORY: &str = "general";

pub fn display_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Unwrap a JSON body, turning axum's rejection into our error shape.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    })
}

// ============================================================================
// RESPONSE BODIES
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CommentJson {
    text: String,
}

#[derive(Debug, Serialize)]
pub struct PostJson {
    id: i64,
    title: String,
    message: String,
    category: String,
    likes: i64,
    created_at: String,
    comments: Vec<CommentJson>,
}

impl From<PostWithComments> for PostJson {
    fn from(item: PostWithComments) -> Self {
        let PostWithComments { post, comments } = item;
        Self {
            id: post.id,
            title: post.title,
            message: post.message,
            category: post.category,
            likes: post.likes,
            created_at: display_time(post.created_at),
            comments: comments
                .into_iter()
                .map(|c| CommentJson { text: c.text })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostsResponse {
    posts: Vec<PostJson>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    posts_this_week: i64,
    total_likes: i64,
    total_comments: i64,
}

impl From<BoardStats> for StatsResponse {
    fn from(stats: BoardStats) -> Self {
        Self {
            posts_this_week: stats.posts_this_week,
            total_likes: stats.total_likes,
            total_comments: stats.total_comments,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryJson {
    category: String,
    count: i64,
}

#[derive(Debug, Serialize)]
pub struct TopPostJson {
    title: String,
    message: String,
}

#[derive(Debug, Serialize)]
pub struct TrendingResponse {
    categories: Vec<CategoryJson>,
    top_posts: Vec<TopPostJson>,
}

// ============================================================================
// REQUEST BODIES
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl CreatePostRequest {
    fn into_new_post(self) -> NewPost {
        let category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        NewPost {
            category,
            title: self.title.unwrap_or_default(),
            message: self.message.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    text: Option<String>,
}

// ============================================================================
// HANDLERS
// ============================================================================

pub async fn list_posts(State(state): State<AppState>) -> Result<Json<PostsResponse>, ApiError> {
    let feed = state.board.recent_posts().await?;
    Ok(Json(PostsResponse {
        posts: feed.into_iter().map(PostJson::from).collect(),
    }))
}

/// Serves both `POST /api/posts` and the older `POST /add_post`.
pub async fn create_post(
    State(state): State<AppState>,
    body: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(body)?;

    state
        .board
        .create_post(request.into_new_post())
        .await
        .map_err(|e| ApiError::from_board(e, "Failed to create post"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Post created successfully" })),
    ))
}

pub async fn like_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let session = session::require_session(&state, &jar, "Please log in to like posts").await?;

    let likes = state
        .board
        .like_post(post_id, &session.username)
        .await
        .map_err(|e| ApiError::from_board(e, "Failed to like post"))?;

    Ok(Json(json!({ "likes": likes, "message": "Post liked successfully" })))
}

pub async fn add_comment(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(post_id): Path<i64>,
    body: Result<Json<CommentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let session = session::require_session(&state, &jar, "Please log in to comment").await?;
    let request = json_body(body)?;
    let text = request.text.unwrap_or_default();

    let comment = state
        .board
        .add_comment(post_id, &session.username, &text)
        .await
        .map_err(|e| ApiError::from_board(e, "Failed to add comment"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "text": comment.text, "username": comment.username })),
    ))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    Ok(Json(state.board.stats().await?.into()))
}

pub async fn trending(State(state): State<AppState>) -> Result<Json<TrendingResponse>, ApiError> {
    let trending = state.board.trending().await?;

    Ok(Json(TrendingResponse {
        categories: trending
            .categories
            .into_iter()
            .map(|CategoryCount { category, count }| CategoryJson { category, count })
            .collect(),
        top_posts: trending
            .top_posts
            .into_iter()
            .map(|Post { title, message, .. }| TopPostJson { title, message })
            .collect(),
    }))
}
