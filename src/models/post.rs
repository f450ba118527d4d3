//! Post model
//!
//! This module provides:
//! - `Post` entity representing a blog post
//! - Relation projections (`PostWithAuthor`, `PostDetail`)
//! - Input types for creating, updating and listing posts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CommentWithAuthor, ListParams, UserSummary};

/// Post entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Unique identifier
    pub id: i64,
    /// Post title
    pub title: String,
    /// Body text
    pub content: Option<String>,
    /// Whether the post is visible as published
    pub published: bool,
    /// Author user ID
    pub author_id: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Post with its author and comment count, used by list endpoints
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostWithAuthor {
    #[serde(flatten)]
    pub post: Post,
    pub author: UserSummary,
    pub comment_count: i64,
}

/// Post with author and every comment, used by the detail endpoint
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub author: UserSummary,
    pub comments: Vec<CommentWithAuthor>,
}

/// Input for creating a post
#[derive(Debug, Clone)]
pub struct CreatePostInput {
    pub title: String,
    pub content: Option<String>,
    pub published: bool,
}

/// Input for updating a post (only provided fields change)
#[derive(Debug, Clone, Default)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
}

impl UpdatePostInput {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.published.is_none()
    }

    /// Apply the provided fields onto an existing post
    pub fn apply_to(self, post: &mut Post) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(content) = self.content {
            post.content = Some(content);
        }
        if let Some(published) = self.published {
            post.published = published;
        }
    }
}

/// Filters for post listing
#[derive(Debug, Clone, Default)]
pub struct ListPostsParams {
    pub pagination: ListParams,
    /// Case-insensitive keyword matched against title and content
    pub search: Option<String>,
    pub published: Option<bool>,
    pub author_id: Option<i64>,
}

impl ListPostsParams {
    pub fn new(pagination: ListParams) -> Self {
        Self {
            pagination,
            ..Default::default()
        }
    }

    /// Set the search keyword; blank keywords are dropped
    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    pub fn with_published(mut self, published: Option<bool>) -> Self {
        self.published = published;
        self
    }

    pub fn with_author(mut self, author_id: Option<i64>) -> Self {
        self.author_id = author_id;
        self
    }
}

/// Build a `LIKE` pattern for a keyword, escaping wildcard characters with `\`
///
/// Only ASCII letters are lowercased. SQLite's `LOWER()` leaves other
/// characters untouched, so folding them here would stop exact matches.
pub fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for c in keyword.to_ascii_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
