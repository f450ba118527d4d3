//! Post repository
//!
//! Database operations for posts, including the filtered list query behind
//! `GET /api/posts` and the transactional delete that removes comments first.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{like_pattern, ListPostsParams, Post, PostWithAuthor, UserSummary};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create a new post
    async fn create(&self, post: &Post) -> Result<Post>;

    /// Get post by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// List posts with author and comment count, newest first.
    ///
    /// Returns the requested page and the total number of matching posts.
    async fn list(&self, params: &ListPostsParams) -> Result<(Vec<PostWithAuthor>, i64)>;

    /// All posts written by a user, newest first
    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Post>>;

    /// Update title, content and published flag
    async fn update(&self, post: &Post) -> Result<Post>;

    /// Delete a post and its comments in one transaction.
    ///
    /// Returns `false` when no such post existed.
    async fn delete_with_comments(&self, id: i64) -> Result<bool>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post) -> Result<Post> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_post_sqlite(self.pool.sqlite()?, post).await,
            DatabaseDriver::Mysql => create_post_mysql(self.pool.mysql()?, post).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_post_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_post_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list(&self, params: &ListPostsParams) -> Result<(Vec<PostWithAuthor>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_posts_sqlite(self.pool.sqlite()?, params).await,
            DatabaseDriver::Mysql => list_posts_mysql(self.pool.mysql()?, params).await,
        }
    }

    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Post>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_posts_by_author_sqlite(self.pool.sqlite()?, author_id).await,
            DatabaseDriver::Mysql => list_posts_by_author_mysql(self.pool.mysql()?, author_id).await,
        }
    }

    async fn update(&self, post: &Post) -> Result<Post> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_post_sqlite(self.pool.sqlite()?, post).await,
            DatabaseDriver::Mysql => update_post_mysql(self.pool.mysql()?, post).await,
        }
    }

    async fn delete_with_comments(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_post_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_post_mysql(self.pool.mysql()?, id).await,
        }
    }
}

const POST_COLUMNS: &str = "id, title, content, published, author_id, created_at, updated_at";

const LIST_SELECT: &str = r#"
    SELECT p.id, p.title, p.content, p.published, p.author_id, p.created_at, p.updated_at,
           u.email AS author_email, u.name AS author_name,
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

/// A value bound to a list filter placeholder
#[derive(Debug, Clone, PartialEq)]
enum FilterArg {
    Int(i64),
    Bool(bool),
    Text(String),
}

/// Build the `WHERE` clause for a post listing.
///
/// `like_escape` is appended after each `LIKE ?`; SQLite needs an explicit
/// `ESCAPE` while MySQL already treats `\` as the escape character.
fn filter_clause(params: &ListPostsParams, like_escape: &str) -> (String, Vec<FilterArg>) {
    let mut conditions = Vec::new();
    let mut args = Vec::new();

    if let Some(search) = &params.search {
        let pattern = like_pattern(search);
        conditions.push(format!(
            "(LOWER(p.title) LIKE ?{esc} OR LOWER(COALESCE(p.content, '')) LIKE ?{esc})",
            esc = like_escape
        ));
        args.push(FilterArg::Text(pattern.clone()));
        args.push(FilterArg::Text(pattern));
    }
    if let Some(published) = params.published {
        conditions.push("p.published = ?".to_string());
        args.push(FilterArg::Bool(published));
    }
    if let Some(author_id) = params.author_id {
        conditions.push("p.author_id = ?".to_string());
        args.push(FilterArg::Int(author_id));
    }

    if conditions.is_empty() {
        (String::new(), args)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), args)
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

const SQLITE_LIKE_ESCAPE: &str = r" ESCAPE '\'";

async fn create_post_sqlite(pool: &SqlitePool, post: &Post) -> Result<Post> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO posts (title, content, published, author_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&post.title)
    .bind(&post.content)
    .bind(post.published)
    .bind(post.author_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create post")?;

    Ok(Post {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..post.clone()
    })
}

async fn get_post_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Post>> {
    let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by ID")?;

    Ok(row.map(|row| row_to_post_sqlite(&row)))
}

async fn list_posts_sqlite(
    pool: &SqlitePool,
    params: &ListPostsParams,
) -> Result<(Vec<PostWithAuthor>, i64)> {
    let (where_clause, args) = filter_clause(params, SQLITE_LIKE_ESCAPE);

    let sql = format!(
        "{}{} ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?",
        LIST_SELECT, where_clause
    );
    let mut query = sqlx::query(&sql);
    for arg in &args {
        query = match arg {
            FilterArg::Int(v) => query.bind(*v),
            FilterArg::Bool(v) => query.bind(*v),
            FilterArg::Text(v) => query.bind(v.clone()),
        };
    }
    let rows = query
        .bind(params.pagination.limit())
        .bind(params.pagination.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;

    let count_sql = format!("SELECT COUNT(*) FROM posts p{}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_query = match arg {
            FilterArg::Int(v) => count_query.bind(*v),
            FilterArg::Bool(v) => count_query.bind(*v),
            FilterArg::Text(v) => count_query.bind(v.clone()),
        };
    }
    let total = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count posts")?;

    let posts = rows
        .iter()
        .map(|row| PostWithAuthor {
            post: row_to_post_sqlite(row),
            author: UserSummary {
                id: row.get("author_id"),
                email: row.get("author_email"),
                name: row.get("author_name"),
            },
            comment_count: row.get("comment_count"),
        })
        .collect();

    Ok((posts, total))
}

async fn list_posts_by_author_sqlite(pool: &SqlitePool, author_id: i64) -> Result<Vec<Post>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM posts WHERE author_id = ? ORDER BY created_at DESC, id DESC",
        POST_COLUMNS
    ))
    .bind(author_id)
    .fetch_all(pool)
    .await
    .context("Failed to list posts by author")?;

    Ok(rows.iter().map(row_to_post_sqlite).collect())
}

async fn update_post_sqlite(pool: &SqlitePool, post: &Post) -> Result<Post> {
    sqlx::query(
        r#"
        UPDATE posts
        SET title = ?, content = ?, published = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&post.title)
    .bind(&post.content)
    .bind(post.published)
    .bind(Utc::now())
    .bind(post.id)
    .execute(pool)
    .await
    .context("Failed to update post")?;

    get_post_by_id_sqlite(pool, post.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
}

async fn delete_post_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("DELETE FROM comments WHERE post_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete post comments")?;

    let result = sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete post")?;

    tx.commit().await.context("Failed to commit post deletion")?;
    Ok(result.rows_affected() > 0)
}

fn row_to_post_sqlite(row: &sqlx::sqlite::SqliteRow) -> Post {
    Post {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        published: row.get("published"),
        author_id: row.get("author_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_post_mysql(pool: &MySqlPool, post: &Post) -> Result<Post> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO posts (title, content, published, author_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&post.title)
    .bind(&post.content)
    .bind(post.published)
    .bind(post.author_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create post")?;

    Ok(Post {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..post.clone()
    })
}

async fn get_post_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Post>> {
    let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by ID")?;

    Ok(row.map(|row| row_to_post_mysql(&row)))
}

async fn list_posts_mysql(
    pool: &MySqlPool,
    params: &ListPostsParams,
) -> Result<(Vec<PostWithAuthor>, i64)> {
    let (where_clause, args) = filter_clause(params, "");

    let sql = format!(
        "{}{} ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?",
        LIST_SELECT, where_clause
    );
    let mut query = sqlx::query(&sql);
    for arg in &args {
        query = match arg {
            FilterArg::Int(v) => query.bind(*v),
            FilterArg::Bool(v) => query.bind(*v),
            FilterArg::Text(v) => query.bind(v.clone()),
        };
    }
    let rows = query
        .bind(params.pagination.limit())
        .bind(params.pagination.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;

    let count_sql = format!("SELECT COUNT(*) FROM posts p{}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_query = match arg {
            FilterArg::Int(v) => count_query.bind(*v),
            FilterArg::Bool(v) => count_query.bind(*v),
            FilterArg::Text(v) => count_query.bind(v.clone()),
        };
    }
    let total = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count posts")?;

    let posts = rows
        .iter()
        .map(|row| PostWithAuthor {
            post: row_to_post_mysql(row),
            author: UserSummary {
                id: row.get("author_id"),
                email: row.get("author_email"),
                name: row.get("author_name"),
            },
            comment_count: row.get("comment_count"),
        })
        .collect();

    Ok((posts, total))
}

async fn list_posts_by_author_mysql(pool: &MySqlPool, author_id: i64) -> Result<Vec<Post>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM posts WHERE author_id = ? ORDER BY created_at DESC, id DESC",
        POST_COLUMNS
    ))
    .bind(author_id)
    .fetch_all(pool)
    .await
    .context("Failed to list posts by author")?;

    Ok(rows.iter().map(row_to_post_mysql).collect())
}

async fn update_post_mysql(pool: &MySqlPool, post: &Post) -> Result<Post> {
    sqlx::query(
        r#"
        UPDATE posts
        SET title = ?, content = ?, published = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&post.title)
    .bind(&post.content)
    .bind(post.published)
    .bind(Utc::now())
    .bind(post.id)
    .execute(pool)
    .await
    .context("Failed to update post")?;

    get_post_by_id_mysql(pool, post.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
}

async fn delete_post_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("DELETE FROM comments WHERE post_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete post comments")?;

    let result = sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete post")?;

    tx.commit().await.context("Failed to commit post deletion")?;
    Ok(result.rows_affected() > 0)
}

fn row_to_post_mysql(row: &sqlx::mysql::MySqlRow) -> Post {
    Post {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        published: row.get("published"),
        author_id: row.get("author_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
