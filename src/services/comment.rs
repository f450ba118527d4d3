//! Comment service

use std::sync::Arc;

use anyhow::Context;

use crate::db::repositories::{CommentRepository, PostRepository, UserRepository};
use crate::models::{CommentWithAuthor, CreateCommentInput, Post};

/// Error types for comment service operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    #[error("Post not found")]
    PostNotFound,

    #[error("Comment not found")]
    NotFound,

    /// Caller wrote neither the comment nor the post
    #[error("{0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Comment service
pub struct CommentService {
    repo: Arc<dyn CommentRepository>,
    post_repo: Arc<dyn PostRepository>,
    user_repo: Arc<dyn UserRepository>,
}

impl CommentService {
    pub fn new(
        repo: Arc<dyn CommentRepository>,
        post_repo: Arc<dyn PostRepository>,
        user_repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            repo,
            post_repo,
            user_repo,
        }
    }

    /// Comments on a post, oldest first
    pub async fn list_for_post(
        &self,
        post_id: i64,
    ) -> Result<Vec<CommentWithAuthor>, CommentServiceError> {
        self.require_post(post_id).await?;
        Ok(self.repo.list_by_post(post_id).await.context("Failed to list comments")?)
    }

    /// Add a comment to a post
    pub async fn create(
        &self,
        post_id: i64,
        author_id: i64,
        content: String,
    ) -> Result<CommentWithAuthor, CommentServiceError> {
        self.require_post(post_id).await?;

        let author = self
            .user_repo
            .get_by_id(author_id)
            .await
            .context("Failed to load comment author")?
            .context("Comment author missing")?
            .summary();

        let comment = self
            .repo
            .create(CreateCommentInput {
                post_id,
                author_id,
                content: content.trim().to_string(),
            })
            .await
            .context("Failed to create comment")?;

        tracing::info!(comment_id = comment.id, post_id, "comment created");
        Ok(CommentWithAuthor { comment, author })
    }

    /// Delete a comment
    ///
    /// Allowed for the comment's author and for the author of the post it
    /// belongs to.
    pub async fn delete(
        &self,
        post_id: i64,
        comment_id: i64,
        caller_id: i64,
    ) -> Result<(), CommentServiceError> {
        let post = self.require_post(post_id).await?;

        let comment = self
            .repo
            .get_by_id(comment_id)
            .await
            .context("Failed to get comment")?
            .filter(|c| c.post_id == post_id)
            .ok_or(CommentServiceError::NotFound)?;

        if comment.author_id != caller_id && post.author_id != caller_id {
            return Err(CommentServiceError::Forbidden(
                "You can only delete your own comments or comments on your posts".into(),
            ));
        }

        self.repo
            .delete(comment_id)
            .await
            .context("Failed to delete comment")?;
        tracing::info!(comment_id, post_id, "comment deleted");
        Ok(())
    }

    async fn require_post(&self, post_id: i64) -> Result<Post, CommentServiceError> {
        self.post_repo
            .get_by_id(post_id)
            .await
            .context("Failed to get post")?
            .ok_or(CommentServiceError::PostNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxCommentRepository, SqlxPostRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::User;
    use chrono::Utc;

    struct Fixture {
        service: CommentService,
        post_id: i64,
        post_author: i64,
        commenter: i64,
        bystander: i64,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::boxed(pool.clone());
        let posts = SqlxPostRepository::boxed(pool.clone());

        let mut ids = Vec::new();
        for email in ["author@example.com", "commenter@example.com", "bystander@example.com"] {
            let user = users
                .create(&User::new(email.into(), None, "hash".into()))
                .await
                .unwrap();
            ids.push(user.id);
        }

        let post = posts
            .create(&Post {
                id: 0,
                title: "Post".into(),
                content: None,
                published: true,
                author_id: ids[0],
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();

        Fixture {
            service: CommentService::new(SqlxCommentRepository::boxed(pool.clone()), posts, users),
            post_id: post.id,
            post_author: ids[0],
            commenter: ids[1],
            bystander: ids[2],
        }
    }

    #[tokio::test]
    async fn test_create_returns_author() {
        let f = setup().await;
        let created = f
            .service
            .create(f.post_id, f.commenter, "  Great read  ".into())
            .await
            .unwrap();

        assert_eq!(created.comment.content, "Great read");
        assert_eq!(created.author.email, "commenter@example.com");
        assert_eq!(f.service.list_for_post(f.post_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_post() {
        let f = setup().await;
        assert!(matches!(
            f.service.create(999, f.commenter, "hi".into()).await,
            Err(CommentServiceError::PostNotFound)
        ));
        assert!(matches!(
            f.service.list_for_post(999).await,
            Err(CommentServiceError::PostNotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_permissions() {
        let f = setup().await;
        let first = f.service.create(f.post_id, f.commenter, "one".into()).await.unwrap();
        let second = f.service.create(f.post_id, f.commenter, "two".into()).await.unwrap();

        assert!(matches!(
            f.service.delete(f.post_id, first.comment.id, f.bystander).await,
            Err(CommentServiceError::Forbidden(_))
        ));

        // The comment author and the post author may both delete
        f.service.delete(f.post_id, first.comment.id, f.commenter).await.unwrap();
        f.service.delete(f.post_id, second.comment.id, f.post_author).await.unwrap();

        assert!(f.service.list_for_post(f.post_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_comment_from_other_post_is_not_found() {
        let f = setup().await;
        let comment = f.service.create(f.post_id, f.commenter, "x".into()).await.unwrap();

        assert!(matches!(
            f.service.delete(f.post_id + 1, comment.comment.id, f.commenter).await,
            Err(CommentServiceError::PostNotFound)
        ));
        assert!(matches!(
            f.service.delete(f.post_id, comment.comment.id + 100, f.commenter).await,
            Err(CommentServiceError::NotFound)
        ));
    }
}
