//! User API endpoints
//!
//! Public:
//! - GET /api/users - Paginated users with post counts
//! - GET /api/users/{id} - User with their posts
//!
//! Protected:
//! - POST /api/users - Create a user
//! - PATCH /api/users/{id} - Update your own account
//! - DELETE /api/users/{id} - Delete your own account and everything you wrote

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::auth::{RegisterRequest, BLANK_NAME};
use crate::api::common::{reject_blank, PaginationQuery};
use crate::api::cookies::cleared_cookies;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{ApiResponse, Paginated};
use crate::api::validation::{ApiPath, ValidatedJson, ValidatedQuery};
use crate::models::UpdateUserInput;

/// Routes that need no authentication
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user))
}

/// Routes behind `require_auth`
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/{id}", patch(update_user).delete(delete_user))
}

/// Request body for a partial account update
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub password: Option<String>,
}

impl From<UpdateUserRequest> for UpdateUserInput {
    fn from(body: UpdateUserRequest) -> Self {
        Self {
            email: body.email,
            name: body.name,
            password: body.password,
        }
    }
}

/// GET /api/users
async fn list_users(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.user_service.list(&query.params()).await?;
    Ok(Json(Paginated::from(page)))
}

/// GET /api/users/{id}
async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.user_service.get_with_posts(id).await?;
    Ok(ApiResponse::ok(user))
}

/// POST /api/users
async fn create_user(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    reject_blank(body.name.as_deref(), BLANK_NAME)?;
    let user = state.user_service.create(body.into()).await?;
    tracing::info!(user_id = user.id, created_by = caller.id, "user created");
    Ok((StatusCode::CREATED, ApiResponse::ok(user)))
}

/// PATCH /api/users/{id}
///
/// Ownership is checked before the body, so a foreign account always gets 403.
async fn update_user(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
    body: Result<ValidatedJson<UpdateUserRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    if !caller.owns(id) {
        return Err(ApiError::forbidden("You can only update your own account"));
    }
    let ValidatedJson(body) = body?;
    reject_blank(body.name.as_deref(), BLANK_NAME)?;

    let input = UpdateUserInput::from(body);
    if input.is_empty() {
        return Err(ApiError::bad_request("At least one field must be provided"));
    }

    let user = state.user_service.update(id, input).await?;
    Ok(ApiResponse::ok(user))
}

/// DELETE /api/users/{id}
///
/// Also clears the auth cookies, since the session belonged to this account.
async fn delete_user(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if !caller.owns(id) {
        return Err(ApiError::forbidden("You can only delete your own account"));
    }

    state.user_service.delete(id).await?;
    let headers = cleared_cookies(state.secure_cookies())?;
    Ok((StatusCode::NO_CONTENT, headers))
}
