//! Authentication API endpoints
//!
//! Public:
//! - POST /api/auth/register - Create an account and sign in
//! - POST /api/auth/login - Sign in
//! - POST /api/auth/refresh - Rotate both tokens using the refresh cookie
//! - POST /api/auth/logout - Clear the auth cookies
//!
//! Protected:
//! - GET /api/auth/me - Current user

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::common::reject_blank;
use crate::api::cookies::{auth_cookies, cleared_cookies, read_cookie, REFRESH_COOKIE};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{ApiResponse, MessageResponse};
use crate::api::validation::ValidatedJson;
use crate::models::{CreateUserInput, User};

pub(crate) const BLANK_NAME: &str = "Name must not be blank";

/// Routes that need no authentication
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

/// Routes behind `require_auth`
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

/// Request body for registration
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: Option<String>,
}

impl From<RegisterRequest> for CreateUserInput {
    fn from(body: RegisterRequest) -> Self {
        Self {
            email: body.email,
            password: body.password,
            name: body.name,
        }
    }
}

/// Request body for login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    reject_blank(body.name.as_deref(), BLANK_NAME)?;
    let user = state.user_service.register(body.into()).await?;

    let headers = issue_cookies(&state, &user)?;

    Ok((StatusCode::CREATED, headers, ApiResponse::ok(user)))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.user_service.login(&body.email, &body.password).await?;

    let headers = issue_cookies(&state, &user)?;

    tracing::info!(user_id = user.id, "user logged in");
    Ok((headers, ApiResponse::ok(user)))
}

/// POST /api/auth/refresh
///
/// Issues a new token pair; the presented refresh token is replaced.
async fn refresh(
    State(state): State<AppState>,
    request_headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = read_cookie(&request_headers, REFRESH_COOKIE)
        .ok_or_else(|| ApiError::unauthorized("Refresh token required"))?;

    let claims = state.token_service.verify_refresh(&token)?;
    let user = state
        .user_service
        .find(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;

    let headers = issue_cookies(&state, &user)?;

    Ok((headers, ApiResponse::ok(user)))
}

/// POST /api/auth/logout
async fn logout(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let headers = cleared_cookies(state.secure_cookies())?;
    Ok((headers, MessageResponse::ok("Logged out")))
}

fn issue_cookies(state: &AppState, user: &User) -> Result<HeaderMap, ApiError> {
    let tokens = state
        .token_service
        .issue_pair(user)
        .map_err(|e| ApiError::internal(anyhow::Error::new(e)))?;
    auth_cookies(&tokens, state.secure_cookies())
}

/// GET /api/auth/me
async fn me(AuthenticatedUser(user): AuthenticatedUser) -> impl IntoResponse {
    ApiResponse::ok(user)
}
