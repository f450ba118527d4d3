//! Comment repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Comment, CommentWithAuthor, CreateCommentInput, UserSummary};

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a new comment
    async fn create(&self, input: CreateCommentInput) -> Result<Comment>;

    /// Get a comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Comments on a post with their authors, oldest first
    async fn list_by_post(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>>;

    /// Number of comments on a post
    async fn count_by_post(&self, post_id: i64) -> Result<i64>;

    /// Delete a comment
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, input: CreateCommentInput) -> Result<Comment> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.sqlite()?, input).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.mysql()?, input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list_by_post(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_by_post_sqlite(self.pool.sqlite()?, post_id).await,
            DatabaseDriver::Mysql => list_by_post_mysql(self.pool.mysql()?, post_id).await,
        }
    }

    async fn count_by_post(&self, post_id: i64) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_by_post_sqlite(self.pool.sqlite()?, post_id).await,
            DatabaseDriver::Mysql => count_by_post_mysql(self.pool.mysql()?, post_id).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_mysql(self.pool.mysql()?, id).await,
        }
    }
}

const LIST_BY_POST: &str = r#"
    SELECT c.id, c.content, c.post_id, c.author_id, c.created_at,
           u.email AS author_email, u.name AS author_name
    FROM comments c
    JOIN users u ON u.id = c.author_id
    WHERE c.post_id = ?
    ORDER BY c.created_at ASC, c.id ASC
"#;

// SQLite implementations
async fn create_sqlite(pool: &SqlitePool, input: CreateCommentInput) -> Result<Comment> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO comments (content, post_id, author_id, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&input.content)
    .bind(input.post_id)
    .bind(input.author_id)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_rowid(),
        content: input.content,
        post_id: input.post_id,
        author_id: input.author_id,
        created_at: now,
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(
        "SELECT id, content, post_id, author_id, created_at FROM comments WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get comment by ID")?;

    Ok(row.map(|r| Comment {
        id: r.get("id"),
        content: r.get("content"),
        post_id: r.get("post_id"),
        author_id: r.get("author_id"),
        created_at: r.get("created_at"),
    }))
}

async fn list_by_post_sqlite(pool: &SqlitePool, post_id: i64) -> Result<Vec<CommentWithAuthor>> {
    let rows = sqlx::query(LIST_BY_POST)
        .bind(post_id)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    Ok(rows
        .iter()
        .map(|r| CommentWithAuthor {
            comment: Comment {
                id: r.get("id"),
                content: r.get("content"),
                post_id: r.get("post_id"),
                author_id: r.get("author_id"),
                created_at: r.get("created_at"),
            },
            author: UserSummary {
                id: r.get("author_id"),
                email: r.get("author_email"),
                name: r.get("author_name"),
            },
        })
        .collect())
}

async fn count_by_post_sqlite(pool: &SqlitePool, post_id: i64) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = ?")
        .bind(post_id)
        .fetch_one(pool)
        .await
        .context("Failed to count comments")
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete comment")?;
    Ok(result.rows_affected() > 0)
}

// MySQL implementations
async fn create_mysql(pool: &MySqlPool, input: CreateCommentInput) -> Result<Comment> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO comments (content, post_id, author_id, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&input.content)
    .bind(input.post_id)
    .bind(input.author_id)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_id() as i64,
        content: input.content,
        post_id: input.post_id,
        author_id: input.author_id,
        created_at: now,
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(
        "SELECT id, content, post_id, author_id, created_at FROM comments WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get comment by ID")?;

    Ok(row.map(|r| Comment {
        id: r.get("id"),
        content: r.get("content"),
        post_id: r.get("post_id"),
        author_id: r.get("author_id"),
        created_at: r.get("created_at"),
    }))
}

async fn list_by_post_mysql(pool: &MySqlPool, post_id: i64) -> Result<Vec<CommentWithAuthor>> {
    let rows = sqlx::query(LIST_BY_POST)
        .bind(post_id)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    Ok(rows
        .iter()
        .map(|r| CommentWithAuthor {
            comment: Comment {
                id: r.get("id"),
                content: r.get("content"),
                post_id: r.get("post_id"),
                author_id: r.get("author_id"),
                created_at: r.get("created_at"),
            },
            author: UserSummary {
                id: r.get("author_id"),
                email: r.get("author_email"),
                name: r.get("author_name"),
            },
        })
        .collect())
}

async fn count_by_post_mysql(pool: &MySqlPool, post_id: i64) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = ?")
        .bind(post_id)
        .fetch_one(pool)
        .await
        .context("Failed to count comments")
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete comment")?;
    Ok(result.rows_affected() > 0)
}
