//! Comment API endpoints
//!
//! Public:
//! - GET /api/posts/{id}/comments - Comments on a post, oldest first
//!
//! Protected:
//! - POST /api/posts/{id}/comments - Comment on a post
//! - DELETE /api/posts/{id}/comments/{comment_id} - Delete a comment

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::common::reject_blank;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::ApiResponse;
use crate::api::validation::{ApiPath, ValidatedJson};

/// Routes that need no authentication
pub fn public_router() -> Router<AppState> {
    Router::new().route("/posts/{id}/comments", get(list_comments))
}

/// Routes behind `require_auth`
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/posts/{id}/comments", post(create_comment))
        .route("/posts/{id}/comments/{comment_id}", delete(delete_comment))
}

/// Request body for a new comment
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 1000, message = "Comment must be 1 to 1000 characters"))]
    pub content: String,
}

/// GET /api/posts/{id}/comments
async fn list_comments(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let comments = state.comment_service.list_for_post(post_id).await?;
    Ok(ApiResponse::ok(comments))
}

/// POST /api/posts/{id}/comments
async fn create_comment(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiPath(post_id): ApiPath<i64>,
    ValidatedJson(body): ValidatedJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    reject_blank(Some(&body.content), "Comment must not be blank")?;

    let comment = state
        .comment_service
        .create(post_id, caller.id, body.content)
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(comment)))
}

/// DELETE /api/posts/{id}/comments/{comment_id}
async fn delete_comment(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiPath((post_id, comment_id)): ApiPath<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .comment_service
        .delete(post_id, comment_id, caller.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
