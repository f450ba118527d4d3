//! API layer - HTTP handlers and routing
//!
//! Every endpoint lives under `/api`:
//! - Health check
//! - Auth endpoints (register, login, refresh, logout, me)
//! - User, post and comment endpoints
//!
//! Each resource module exposes a public router and a protected router; the
//! protected ones are merged and put behind `require_auth`.

pub mod auth;
pub mod comments;
pub mod common;
pub mod cookies;
pub mod health;
pub mod middleware;
pub mod posts;
pub mod responses;
pub mod users;
pub mod validation;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the `/api` router (public and protected routes)
pub fn build_api_router(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(auth::protected_router())
        .merge(users::protected_router())
        .merge(posts::protected_router())
        .merge(comments::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    Router::new()
        .merge(health::router())
        .merge(auth::public_router())
        .merge(users::public_router())
        .merge(posts::public_router())
        .merge(comments::public_router())
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    Router::new()
        .nest("/api", build_api_router(state.clone()))
        .fallback(route_not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::mask_internal_errors,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origin))
        .with_state(state)
}

/// CORS for cookie auth: a single explicit origin with credentials
fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    match origin.parse::<HeaderValue>() {
        Ok(value) => cors.allow_origin(value),
        Err(_) => {
            tracing::warn!("Invalid CORS_ORIGIN '{}', cross-origin requests disabled", origin);
            cors
        }
    }
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
