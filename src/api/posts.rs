//! Post API endpoints
//!
//! Public:
//! - GET /api/posts - Paginated posts with search and filters
//! - GET /api/posts/{id} - Post with author and comments
//!
//! Protected:
//! - POST /api/posts - Create a post
//! - PATCH /api/posts/{id} - Update a post you wrote
//! - DELETE /api/posts/{id} - Delete a post you wrote, with its comments

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::common::{default_limit, default_page, reject_blank};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{ApiResponse, Paginated};
use crate::api::validation::{ApiPath, ValidatedJson, ValidatedQuery};
use crate::models::{CreatePostInput, ListParams, ListPostsParams, UpdatePostInput};

const BLANK_TITLE: &str = "Title must not be blank";

/// Routes that need no authentication
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/{id}", get(get_post))
}

/// Routes behind `require_auth`
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/posts", post(create_post))
        .route("/posts/{id}", patch(update_post).delete(delete_post))
}

/// Query parameters for listing posts
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: u32,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: u32,
    #[validate(length(max = 100, message = "search must be at most 100 characters"))]
    pub search: Option<String>,
    pub published: Option<bool>,
    pub author_id: Option<i64>,
}

impl ListPostsQuery {
    pub fn params(self) -> ListPostsParams {
        ListPostsParams::new(ListParams::new(self.page, self.limit))
            .with_search(self.search)
            .with_published(self.published)
            .with_author(self.author_id)
    }
}

/// Request body for creating a post
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    #[validate(length(max = 50000, message = "Content must be at most 50000 characters"))]
    pub content: Option<String>,
    pub published: Option<bool>,
}

impl From<CreatePostRequest> for CreatePostInput {
    fn from(body: CreatePostRequest) -> Self {
        Self {
            title: body.title,
            content: body.content,
            published: body.published.unwrap_or(false),
        }
    }
}

/// Request body for a partial post update
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 50000, message = "Content must be at most 50000 characters"))]
    pub content: Option<String>,
    pub published: Option<bool>,
}

impl From<UpdatePostRequest> for UpdatePostInput {
    fn from(body: UpdatePostRequest) -> Self {
        Self {
            title: body.title,
            content: body.content,
            published: body.published,
        }
    }
}

/// GET /api/posts
async fn list_posts(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ListPostsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.post_service.list(&query.params()).await?;
    Ok(Json(Paginated::from(page)))
}

/// GET /api/posts/{id}
async fn get_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state.post_service.get_detail(id).await?;
    Ok(ApiResponse::ok(detail))
}

/// POST /api/posts
async fn create_post(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ValidatedJson(body): ValidatedJson<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    reject_blank(Some(&body.title), BLANK_TITLE)?;

    let post = state.post_service.create(caller.id, body.into()).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(post)))
}

/// PATCH /api/posts/{id}
async fn update_post(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
    ValidatedJson(body): ValidatedJson<UpdatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = UpdatePostInput::from(body);
    if input.is_empty() {
        return Err(ApiError::bad_request("At least one field must be provided"));
    }
    reject_blank(input.title.as_deref(), BLANK_TITLE)?;

    let post = state.post_service.update(id, caller.id, input).await?;
    Ok(ApiResponse::ok(post))
}

/// DELETE /api/posts/{id}
async fn delete_post(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.post_service.delete(id, caller.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
