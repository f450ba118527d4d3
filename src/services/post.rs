//! Post service
//!
//! Business logic for posts: listing with search and filters, detail views
//! with author and comments, and owner-only mutation.

use crate::db::repositories::{CommentRepository, PostRepository, UserRepository};
use crate::models::{
    CreatePostInput, ListPostsParams, PagedResult, Post, PostDetail, PostWithAuthor,
    UpdatePostInput,
};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    #[error("Post not found")]
    NotFound,

    /// Caller is not the author of the post
    #[error("{0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Post service
pub struct PostService {
    post_repo: Arc<dyn PostRepository>,
    user_repo: Arc<dyn UserRepository>,
    comment_repo: Arc<dyn CommentRepository>,
}

impl PostService {
    pub fn new(
        post_repo: Arc<dyn PostRepository>,
        user_repo: Arc<dyn UserRepository>,
        comment_repo: Arc<dyn CommentRepository>,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            comment_repo,
        }
    }

    /// List posts matching the filters, newest first
    pub async fn list(
        &self,
        params: &ListPostsParams,
    ) -> Result<PagedResult<PostWithAuthor>, PostServiceError> {
        let (posts, total) = self.post_repo.list(params).await.context("Failed to list posts")?;
        Ok(PagedResult::new(posts, total, &params.pagination))
    }

    /// Get a post by ID
    pub async fn get(&self, id: i64) -> Result<Post, PostServiceError> {
        self.post_repo
            .get_by_id(id)
            .await
            .context("Failed to get post")?
            .ok_or(PostServiceError::NotFound)
    }

    /// Get a post with its author and all comments
    pub async fn get_detail(&self, id: i64) -> Result<PostDetail, PostServiceError> {
        let post = self.get(id).await?;

        let author = self
            .user_repo
            .get_by_id(post.author_id)
            .await
            .context("Failed to load post author")?
            .context("Post author missing")?
            .summary();
        let comments = self
            .comment_repo
            .list_by_post(id)
            .await
            .context("Failed to list comments")?;

        Ok(PostDetail {
            post,
            author,
            comments,
        })
    }

    /// Create a post authored by `author_id`
    pub async fn create(
        &self,
        author_id: i64,
        input: CreatePostInput,
    ) -> Result<Post, PostServiceError> {
        let now = Utc::now();
        let post = Post {
            id: 0,
            title: input.title.trim().to_string(),
            content: input.content,
            published: input.published,
            author_id,
            created_at: now,
            updated_at: now,
        };

        let created = self.post_repo.create(&post).await.context("Failed to create post")?;
        tracing::info!(post_id = created.id, author_id, "post created");
        Ok(created)
    }

    /// Update a post; only its author may do so
    pub async fn update(
        &self,
        id: i64,
        caller_id: i64,
        mut input: UpdatePostInput,
    ) -> Result<Post, PostServiceError> {
        let mut post = self.get(id).await?;
        ensure_owner(&post, caller_id, "update")?;

        input.title = input.title.map(|t| t.trim().to_string());
        input.apply_to(&mut post);

        Ok(self.post_repo.update(&post).await.context("Failed to update post")?)
    }

    /// Delete a post and its comments; only its author may do so
    pub async fn delete(&self, id: i64, caller_id: i64) -> Result<(), PostServiceError> {
        let post = self.get(id).await?;
        ensure_owner(&post, caller_id, "delete")?;

        let deleted = self
            .post_repo
            .delete_with_comments(id)
            .await
            .context("Failed to delete post")?;
        if !deleted {
            return Err(PostServiceError::NotFound);
        }

        tracing::info!(post_id = id, "post deleted");
        Ok(())
    }
}

fn ensure_owner(post: &Post, caller_id: i64, action: &str) -> Result<(), PostServiceError> {
    if post.author_id != caller_id {
        return Err(PostServiceError::Forbidden(format!(
            "You can only {} your own posts",
            action
        )));
    }
    Ok(())
}
