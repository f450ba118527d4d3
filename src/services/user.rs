//! User service
//!
//! Implements business logic for user management:
//! - Registration and login against argon2 password hashes
//! - Profile lookup, listing and partial updates
//! - Account deletion together with everything the user wrote

use crate::db::is_unique_violation;
use crate::db::repositories::{PostRepository, UserRepository};
use crate::models::{
    CreateUserInput, ListParams, PagedResult, UpdateUserInput, User, UserWithCount, UserWithPosts,
};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use std::sync::Arc;

/// Message returned for every failed login, whatever the cause
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("{0}")]
    AuthenticationError(String),

    /// Email already registered
    #[error("{0}")]
    UserExists(String),

    #[error("User not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for managing accounts and credentials
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    post_repo: Arc<dyn PostRepository>,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, post_repo: Arc<dyn PostRepository>) -> Self {
        Self {
            user_repo,
            post_repo,
        }
    }

    /// Register a new account
    ///
    /// # Errors
    ///
    /// - `UserExists` if the email is already registered
    /// - `InternalError` for database errors
    pub async fn register(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        let email = normalize_email(&input.email);
        self.ensure_email_free(&email).await?;

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(email, normalize_name(input.name), password_hash);

        let created = self
            .user_repo
            .create(&user)
            .await
            .map_err(|e| email_conflict_or_internal(e, &user.email))?;

        tracing::info!(user_id = created.id, "user registered");
        Ok(created)
    }

    /// Create a user on behalf of an authenticated caller
    pub async fn create(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        self.register(input).await
    }

    /// Check an email and password pair
    ///
    /// Unknown emails and wrong passwords produce the same error so callers
    /// cannot probe which accounts exist.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, UserServiceError> {
        let user = self
            .user_repo
            .get_by_email(&normalize_email(email))
            .await
            .context("Failed to look up user")?
            .ok_or_else(|| UserServiceError::AuthenticationError(INVALID_CREDENTIALS.into()))?;

        let valid =
            verify_password(password, &user.password_hash).context("Failed to verify password")?;
        if !valid {
            tracing::debug!(user_id = user.id, "login rejected");
            return Err(UserServiceError::AuthenticationError(INVALID_CREDENTIALS.into()));
        }

        Ok(user)
    }

    /// Get a user by ID
    pub async fn get(&self, id: i64) -> Result<User, UserServiceError> {
        self.user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user")?
            .ok_or(UserServiceError::NotFound)
    }

    /// Get a user by ID, returning `None` instead of an error when missing
    pub async fn find(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        Ok(self.user_repo.get_by_id(id).await.context("Failed to get user")?)
    }

    /// Get a user together with their posts
    pub async fn get_with_posts(&self, id: i64) -> Result<UserWithPosts, UserServiceError> {
        let user = self.get(id).await?;
        let posts = self
            .post_repo
            .list_by_author(id)
            .await
            .context("Failed to list user posts")?;
        Ok(UserWithPosts { user, posts })
    }

    /// List users with their post counts
    pub async fn list(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<UserWithCount>, UserServiceError> {
        let (users, total) = self.user_repo.list(params).await.context("Failed to list users")?;
        Ok(PagedResult::new(users, total, params))
    }

    /// Apply a partial update
    ///
    /// # Errors
    ///
    /// - `NotFound` if the user does not exist
    /// - `UserExists` if the new email belongs to another account
    pub async fn update(
        &self,
        id: i64,
        input: UpdateUserInput,
    ) -> Result<User, UserServiceError> {
        let mut user = self.get(id).await?;

        if let Some(email) = input.email {
            let email = normalize_email(&email);
            if email != user.email {
                self.ensure_email_free(&email).await?;
                user.email = email;
            }
        }
        if let Some(name) = input.name {
            user.name = normalize_name(Some(name));
        }
        if let Some(password) = input.password {
            user.password_hash = hash_password(&password).context("Failed to hash password")?;
        }

        let updated = self
            .user_repo
            .update(&user)
            .await
            .map_err(|e| email_conflict_or_internal(e, &user.email))?;
        Ok(updated)
    }

    /// Delete a user with all their posts and comments
    pub async fn delete(&self, id: i64) -> Result<(), UserServiceError> {
        let deleted = self
            .user_repo
            .delete_with_content(id)
            .await
            .context("Failed to delete user")?;
        if !deleted {
            return Err(UserServiceError::NotFound);
        }

        tracing::info!(user_id = id, "user deleted");
        Ok(())
    }

    async fn ensure_email_free(&self, email: &str) -> Result<(), UserServiceError> {
        let existing = self
            .user_repo
            .get_by_email(email)
            .await
            .context("Failed to check email")?;
        if existing.is_some() {
            return Err(UserServiceError::UserExists(email_taken(email)));
        }
        Ok(())
    }
}

fn email_taken(email: &str) -> String {
    format!("Email '{}' is already registered", email)
}

// A concurrent insert can still hit the unique index after the pre-check.
fn email_conflict_or_internal(err: anyhow::Error, email: &str) -> UserServiceError {
    if is_unique_violation(&err) {
        UserServiceError::UserExists(email_taken(email))
    } else {
        UserServiceError::InternalError(err)
    }
}

/// Emails are compared case-insensitively
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn normalize_name(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}
