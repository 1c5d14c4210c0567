// SQLite-backed board store.
//
// Tables:
// - posts: one row per post, `likes` is a denormalised counter
// - comments: post comments (no foreign key, nothing cascades)
// - likes: one row per (username, post_id), the source of truth for `posts.likes`

use crate::core::board::{
    BoardError, BoardStore, CategoryCount, Comment, LikeOutcome, NewComment, NewPost, Post,
    PostWithComments,
};
use crate::infra::database::{from_db_time, to_db_time};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use std::collections::HashMap;

fn storage(e: sqlx::Error) -> BoardError {
    BoardError::StorageError(e.to_string())
}

pub struct SqliteBoardStore {
    pool: Pool<Sqlite>,
}

impl SqliteBoardStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), BoardError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category TEXT NOT NULL,
                title TEXT NOT NULL,
                message TEXT NOT NULL,
                likes INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at DESC)")
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL,
                username TEXT NOT NULL,
                text TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id)")
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS likes (
                username TEXT NOT NULL,
                post_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (username, post_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(())
    }

    fn post_from_row(row: &SqliteRow) -> Result<Post, BoardError> {
        let created_at: String = row.get("created_at");
        let created_at = from_db_time(&created_at).map_err(|e| {
            BoardError::StorageError(format!("Bad created_at {:?}: {}", created_at, e))
        })?;

        Ok(Post {
            id: row.get("id"),
            category: row.get("category"),
            title: row.get("title"),
            message: row.get("message"),
            likes: row.get("likes"),
            created_at,
        })
    }
}

#[async_trait]
impl BoardStore for SqliteBoardStore {
    async fn insert_post(
        &self,
        post: &NewPost,
        created_at: DateTime<Utc>,
    ) -> Result<Post, BoardError> {
        let result = sqlx::query(
            r#"
            INSERT INTO posts (category, title, message, likes, created_at)
            VALUES (?, ?, ?, 0, ?)
            "#,
        )
        .bind(&post.category)
        .bind(&post.title)
        .bind(&post.message)
        .bind(to_db_time(created_at))
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(Post {
            id: result.last_insert_rowid(),
            category: post.category.clone(),
            title: post.title.clone(),
            message: post.message.clone(),
            likes: 0,
            created_at,
        })
    }

    async fn post_exists(&self, post_id: i64) -> Result<bool, BoardError> {
        let row = sqlx::query("SELECT 1 FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        Ok(row.is_some())
    }

    async fn recent_posts(&self, limit: usize) -> Result<Vec<PostWithComments>, BoardError> {
        let rows = sqlx::query(
            r#"
            SELECT id, category, title, message, likes, created_at
            FROM posts
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        let posts = rows
            .iter()
            .map(Self::post_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        if posts.is_empty() {
            return Ok(Vec::new());
        }

        // One query for every comment on the page instead of one per post
        let comment_rows = sqlx::query(
            r#"
            SELECT id, post_id, username, text
            FROM comments
            WHERE post_id IN (
                SELECT id FROM posts ORDER BY created_at DESC, id DESC LIMIT ?
            )
            ORDER BY id ASC
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        let mut comments_by_post: HashMap<i64, Vec<Comment>> = HashMap::new();
        for row in comment_rows {
            let comment = Comment {
                id: row.get("id"),
                post_id: row.get("post_id"),
                username: row.get("username"),
                text: row.get("text"),
            };
            comments_by_post
                .entry(comment.post_id)
                .or_default()
                .push(comment);
        }

        Ok(posts
            .into_iter()
            .map(|post| PostWithComments {
                comments: comments_by_post.remove(&post.id).unwrap_or_default(),
                post,
            })
            .collect())
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, BoardError> {
        let result = sqlx::query("INSERT INTO comments (post_id, username, text) VALUES (?, ?, ?)")
            .bind(comment.post_id)
            .bind(&comment.username)
            .bind(&comment.text)
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        Ok(Comment {
            id: result.last_insert_rowid(),
            post_id: comment.post_id,
            username: comment.username,
            text: comment.text,
        })
    }

    async fn like_post(&self, post_id: i64, username: &str) -> Result<LikeOutcome, BoardError> {
        // Dropping `tx` without commit rolls everything back
        let mut tx = self.pool.begin().await.map_err(storage)?;

        // Write first so the transaction takes SQLite's write lock up front
        let inserted = sqlx::query("INSERT INTO likes (username, post_id, created_at) VALUES (?, ?, ?)")
            .bind(username)
            .bind(post_id)
            .bind(to_db_time(Utc::now()))
            .execute(&mut *tx)
            .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                tx.rollback().await.map_err(storage)?;
                return Ok(LikeOutcome::AlreadyLiked);
            }
            Err(e) => return Err(storage(e)),
        }

        let updated = sqlx::query("UPDATE posts SET likes = likes + 1 WHERE id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        if updated.rows_affected() == 0 {
            tx.rollback().await.map_err(storage)?;
            return Ok(LikeOutcome::PostNotFound);
        }

        let likes: i64 = sqlx::query_scalar("SELECT likes FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(storage)?;

        tx.commit().await.map_err(storage)?;

        Ok(LikeOutcome::Liked { likes })
    }

    async fn count_likes(&self, post_id: i64) -> Result<i64, BoardError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await
            .map_err(storage)
    }

    async fn count_posts_since(&self, since: DateTime<Utc>) -> Result<i64, BoardError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE created_at >= ?")
            .bind(to_db_time(since))
            .fetch_one(&self.pool)
            .await
            .map_err(storage)
    }

    async fn total_likes(&self) -> Result<i64, BoardError> {
        sqlx::query_scalar("SELECT COALESCE(SUM(likes), 0) FROM posts")
            .fetch_one(&self.pool)
            .await
            .map_err(storage)
    }

    async fn total_comments(&self) -> Result<i64, BoardError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(&self.pool)
            .await
            .map_err(storage)
    }

    async fn top_categories(&self, limit: usize) -> Result<Vec<CategoryCount>, BoardError> {
        let rows = sqlx::query(
            r#"
            SELECT category, COUNT(*) AS post_count
            FROM posts
            GROUP BY category
            ORDER BY post_count DESC, category ASC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        Ok(rows
            .iter()
            .map(|row| CategoryCount {
                category: row.get("category"),
                count: row.get("post_count"),
            })
            .collect())
    }

    async fn top_posts(&self, limit: usize) -> Result<Vec<Post>, BoardError> {
        let rows = sqlx::query(
            r#"
            SELECT id, category, title, message, likes, created_at
            FROM posts
            ORDER BY likes DESC, created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.iter().map(Self::post_from_row).collect()
    }
}
