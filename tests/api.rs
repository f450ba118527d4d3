//! HTTP-level tests against the full router on in-memory SQLite

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};

use blog_api::api::{self, ApiError, AppState};
use blog_api::config::{AuthConfig, Config, Environment};
use blog_api::db::{self, DynDatabasePool};

struct TestApp {
    server: TestServer,
    pool: DynDatabasePool,
}

fn test_config(environment: Environment) -> Config {
    Config {
        environment,
        auth: AuthConfig {
            access_secret: "test-access-secret-0123456789abcdef".into(),
            refresh_secret: "test-refresh-secret-0123456789abcdef".into(),
        },
        ..Default::default()
    }
}

async fn setup() -> TestApp {
    setup_in(Environment::Test).await
}

async fn setup_in(environment: Environment) -> TestApp {
    let pool = db::create_test_pool().await.unwrap();
    db::migrations::run_migrations(&pool).await.unwrap();

    let config = test_config(environment);
    let state = AppState::new(pool.clone(), &config);
    let app = api::build_router(state, &config.server.cors_origin);
    TestApp {
        server: TestServer::new(app).unwrap(),
        pool,
    }
}

/// `name=value` pairs from the response's `Set-Cookie` headers
fn set_cookies(response: &TestResponse) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or_default().to_string())
        .collect()
}

fn cookie_value(response: &TestResponse, name: &str) -> Option<String> {
    set_cookies(response)
        .into_iter()
        .find_map(|pair| pair.strip_prefix(&format!("{}=", name)).map(str::to_string))
}

/// Cookie header that sends back every cookie the response set
fn cookie_header(response: &TestResponse) -> HeaderValue {
    HeaderValue::from_str(&set_cookies(response).join("; ")).unwrap()
}

async fn register(app: &TestApp, email: &str) -> (i64, HeaderValue) {
    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "email": email, "password": "password123", "name": "Tester" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let body = response.json::<Value>();
    let id = body["data"]["id"].as_i64().unwrap();
    (id, cookie_header(&response))
}

async fn create_post(app: &TestApp, cookies: &HeaderValue, title: &str, published: bool) -> i64 {
    let response = app
        .server
        .post("/api/posts")
        .add_header(header::COOKIE, cookies.clone())
        .json(&json!({ "title": title, "content": "Body text", "published": published }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = setup().await;

    let response = app.server.get("/api/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body = response.json::<Value>();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], "connected");
}

#[tokio::test]
async fn test_register_sets_http_only_cookies() {
    let app = setup().await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "email": "Alice@Example.com", "password": "password123" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let raw: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(raw.len(), 2);
    assert!(raw.iter().any(|c| c.starts_with("accessToken=") && c.contains("Max-Age=900")));
    assert!(raw.iter().any(|c| c.starts_with("refreshToken=") && c.contains("Max-Age=604800")));
    assert!(raw.iter().all(|c| c.contains("HttpOnly") && !c.contains("Secure")));

    let body = response.json::<Value>();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert!(body["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let app = setup().await;
    register(&app, "dup@example.com").await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "email": "DUP@example.com", "password": "password123" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    let body = response.json::<Value>();
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_invalid_body_returns_details() {
    let app = setup().await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "email": "not-an-email", "password": "short" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body = response.json::<Value>();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Validation failed");
    assert!(body["details"]["email"].is_array());
    assert!(body["details"]["password"].is_array());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = setup().await;

    let response = app
        .server
        .post("/api/auth/login")
        .add_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .text("{not json")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["success"], false);
}

#[tokio::test]
async fn test_login_and_me() {
    let app = setup().await;
    register(&app, "login@example.com").await;

    let wrong = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": "login@example.com", "password": "wrong-password" }))
        .await;
    assert_eq!(wrong.status_code(), StatusCode::UNAUTHORIZED);

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": "login@example.com", "password": "password123" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let me = app
        .server
        .get("/api/auth/me")
        .add_header(header::COOKIE, cookie_header(&response))
        .await;
    assert_eq!(me.status_code(), StatusCode::OK);
    assert_eq!(me.json::<Value>()["data"]["email"], "login@example.com");
}

#[tokio::test]
async fn test_bearer_header_is_accepted() {
    let app = setup().await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "email": "bearer@example.com", "password": "password123" }))
        .await;
    let token = cookie_value(&response, "accessToken").unwrap();

    let me = app
        .server
        .get("/api/auth/me")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        )
        .await;
    assert_eq!(me.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_unauthenticated_mutation_rejected() {
    let app = setup().await;

    let response = app
        .server
        .post("/api/posts")
        .json(&json!({ "title": "Nope" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["message"], "Authentication required");

    let garbage = app
        .server
        .post("/api/posts")
        .add_header(header::COOKIE, HeaderValue::from_static("accessToken=garbage"))
        .json(&json!({ "title": "Nope" }))
        .await;
    assert_eq!(garbage.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.json::<Value>()["message"], "Invalid or expired token");
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let app = setup().await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "email": "swap@example.com", "password": "password123" }))
        .await;
    let refresh = cookie_value(&response, "refreshToken").unwrap();

    let me = app
        .server
        .get("/api/auth/me")
        .add_header(
            header::COOKIE,
            HeaderValue::from_str(&format!("accessToken={}", refresh)).unwrap(),
        )
        .await;
    assert_eq!(me.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_ids_and_routes_are_not_found() {
    let app = setup().await;

    let user = app.server.get("/api/users/999").await;
    assert_eq!(user.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(user.json::<Value>()["message"], "User not found");

    let post = app.server.get("/api/posts/999").await;
    assert_eq!(post.status_code(), StatusCode::NOT_FOUND);

    let comments = app.server.get("/api/posts/999/comments").await;
    assert_eq!(comments.status_code(), StatusCode::NOT_FOUND);

    let route = app.server.get("/api/nowhere").await;
    assert_eq!(route.status_code(), StatusCode::NOT_FOUND);
    let body = route.json::<Value>();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Route not found");
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    let app = setup().await;

    let response = app.server.get("/api/posts/abc").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["success"], false);
}

#[tokio::test]
async fn test_foreign_post_edit_forbidden() {
    let app = setup().await;
    let (_, alice) = register(&app, "alice@example.com").await;
    let (_, bob) = register(&app, "bob@example.com").await;
    let post_id = create_post(&app, &alice, "Alice's post", true).await;

    let response = app
        .server
        .patch(&format!("/api/posts/{}", post_id))
        .add_header(header::COOKIE, bob.clone())
        .json(&json!({ "title": "Hijacked" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let delete = app
        .server
        .delete(&format!("/api/posts/{}", post_id))
        .add_header(header::COOKIE, bob)
        .await;
    assert_eq!(delete.status_code(), StatusCode::FORBIDDEN);

    let own = app
        .server
        .patch(&format!("/api/posts/{}", post_id))
        .add_header(header::COOKIE, alice.clone())
        .json(&json!({ "title": "Edited" }))
        .await;
    assert_eq!(own.status_code(), StatusCode::OK);
    assert_eq!(own.json::<Value>()["data"]["title"], "Edited");

    let empty = app
        .server
        .patch(&format!("/api/posts/{}", post_id))
        .add_header(header::COOKIE, alice)
        .json(&json!({}))
        .await;
    assert_eq!(empty.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_foreign_account_edit_forbidden() {
    let app = setup().await;
    let (alice_id, _) = register(&app, "alice@example.com").await;
    let (_, bob) = register(&app, "bob@example.com").await;

    let response = app
        .server
        .patch(&format!("/api/users/{}", alice_id))
        .add_header(header::COOKIE, bob)
        .json(&json!({ "name": "Mallory" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_post_pagination_and_search() {
    let app = setup().await;
    let (author_id, cookies) = register(&app, "writer@example.com").await;
    create_post(&app, &cookies, "Learning Rust", true).await;
    create_post(&app, &cookies, "Cooking pasta", true).await;
    create_post(&app, &cookies, "Rust async notes", false).await;

    let page = app.server.get("/api/posts?page=2&limit=2").await;
    assert_eq!(page.status_code(), StatusCode::OK);
    let body = page.json::<Value>();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["totalPages"], 2);
    assert_eq!(body["pagination"]["hasNext"], false);
    assert_eq!(body["pagination"]["hasPrev"], true);

    let past_end = app.server.get("/api/posts?page=9&limit=2").await;
    let body = past_end.json::<Value>();
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["pagination"]["total"], 3);

    let search = app.server.get("/api/posts?search=RUST").await;
    let body = search.json::<Value>();
    assert_eq!(body["pagination"]["total"], 2);
    assert_eq!(body["data"][0]["title"], "Rust async notes");
    assert_eq!(body["data"][0]["author"]["id"], author_id);

    let published = app
        .server
        .get(&format!("/api/posts?search=rust&published=true&authorId={}", author_id))
        .await;
    let body = published.json::<Value>();
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "Learning Rust");

    let too_big = app.server.get("/api/posts?limit=101").await;
    assert_eq!(too_big.status_code(), StatusCode::BAD_REQUEST);

    let zero = app.server.get("/api/users?page=0").await;
    assert_eq!(zero.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_comments_flow() {
    let app = setup().await;
    let (_, alice) = register(&app, "alice@example.com").await;
    let (_, bob) = register(&app, "bob@example.com").await;
    let (_, carol) = register(&app, "carol@example.com").await;
    let post_id = create_post(&app, &alice, "Open thread", true).await;

    let created = app
        .server
        .post(&format!("/api/posts/{}/comments", post_id))
        .add_header(header::COOKIE, bob.clone())
        .json(&json!({ "content": "First!" }))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let comment = created.json::<Value>();
    let comment_id = comment["data"]["id"].as_i64().unwrap();
    assert_eq!(comment["data"]["author"]["email"], "bob@example.com");

    let list = app.server.get(&format!("/api/posts/{}/comments", post_id)).await;
    assert_eq!(list.json::<Value>()["data"].as_array().unwrap().len(), 1);

    let detail = app.server.get(&format!("/api/posts/{}", post_id)).await;
    let body = detail.json::<Value>();
    assert_eq!(body["data"]["author"]["email"], "alice@example.com");
    assert_eq!(body["data"]["comments"][0]["content"], "First!");

    let stranger = app
        .server
        .delete(&format!("/api/posts/{}/comments/{}", post_id, comment_id))
        .add_header(header::COOKIE, carol)
        .await;
    assert_eq!(stranger.status_code(), StatusCode::FORBIDDEN);

    // The post author may moderate comments on their post.
    let moderated = app
        .server
        .delete(&format!("/api/posts/{}/comments/{}", post_id, comment_id))
        .add_header(header::COOKIE, alice)
        .await;
    assert_eq!(moderated.status_code(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_delete_post_leaves_no_orphaned_comments() {
    let app = setup().await;
    let (_, alice) = register(&app, "alice@example.com").await;
    let (_, bob) = register(&app, "bob@example.com").await;
    let post_id = create_post(&app, &alice, "Short lived", true).await;

    for text in ["one", "two"] {
        let response = app
            .server
            .post(&format!("/api/posts/{}/comments", post_id))
            .add_header(header::COOKIE, bob.clone())
            .json(&json!({ "content": text }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
    }

    let response = app
        .server
        .delete(&format!("/api/posts/{}", post_id))
        .add_header(header::COOKIE, alice)
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = ?")
        .bind(post_id)
        .fetch_one(app.pool.sqlite().unwrap())
        .await
        .unwrap();
    assert_eq!(remaining, 0);

    let gone = app.server.get(&format!("/api/posts/{}", post_id)).await;
    assert_eq!(gone.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_account_removes_content_and_session() {
    let app = setup().await;
    let (alice_id, alice) = register(&app, "alice@example.com").await;
    let post_id = create_post(&app, &alice, "Farewell", true).await;

    let response = app
        .server
        .delete(&format!("/api/users/{}", alice_id))
        .add_header(header::COOKIE, alice.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
    assert_eq!(cookie_value(&response, "accessToken").as_deref(), Some(""));

    let post = app.server.get(&format!("/api/posts/{}", post_id)).await;
    assert_eq!(post.status_code(), StatusCode::NOT_FOUND);

    // The old access token names a user that no longer exists.
    let me = app
        .server
        .get("/api/auth/me")
        .add_header(header::COOKIE, alice)
        .await;
    assert_eq!(me.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_users_list_counts_posts() {
    let app = setup().await;
    let (alice_id, alice) = register(&app, "alice@example.com").await;
    register(&app, "bob@example.com").await;
    create_post(&app, &alice, "One", true).await;
    create_post(&app, &alice, "Two", false).await;

    let response = app.server.get("/api/users?limit=10").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["pagination"]["total"], 2);

    let alice_row = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["id"] == alice_id)
        .unwrap();
    assert_eq!(alice_row["postCount"], 2);

    let detail = app.server.get(&format!("/api/users/{}", alice_id)).await;
    assert_eq!(detail.json::<Value>()["data"]["posts"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_refresh_rotates_cookies() {
    let app = setup().await;

    let registered = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "email": "rotate@example.com", "password": "password123" }))
        .await;
    let old_access = cookie_value(&registered, "accessToken").unwrap();
    let old_refresh = cookie_value(&registered, "refreshToken").unwrap();

    let missing = app.server.post("/api/auth/refresh").await;
    assert_eq!(missing.status_code(), StatusCode::UNAUTHORIZED);

    let response = app
        .server
        .post("/api/auth/refresh")
        .add_header(
            header::COOKIE,
            HeaderValue::from_str(&format!("refreshToken={}", old_refresh)).unwrap(),
        )
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let new_access = cookie_value(&response, "accessToken").unwrap();
    let new_refresh = cookie_value(&response, "refreshToken").unwrap();
    assert_ne!(new_access, old_access);
    assert_ne!(new_refresh, old_refresh);

    // An access token cannot stand in for a refresh token.
    let swapped = app
        .server
        .post("/api/auth/refresh")
        .add_header(
            header::COOKIE,
            HeaderValue::from_str(&format!("refreshToken={}", new_access)).unwrap(),
        )
        .await;
    assert_eq!(swapped.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_clears_cookies() {
    let app = setup().await;

    let response = app.server.post("/api/auth/logout").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["success"], true);

    let raw: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert!(raw.iter().any(|c| c.starts_with("accessToken=;") && c.contains("Max-Age=0")));
    assert!(raw.iter().any(|c| c.starts_with("refreshToken=;") && c.contains("Max-Age=0")));
}

#[tokio::test]
async fn test_production_hides_details_and_secures_cookies() {
    let app = setup_in(Environment::Production).await;

    let invalid = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "email": "nope", "password": "password123" }))
        .await;
    assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
    let body = invalid.json::<Value>();
    assert_eq!(body["message"], "Validation failed");
    assert!(body.get("details").is_none());

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "email": "prod@example.com", "password": "password123" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    assert!(response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .all(|v| v.to_str().unwrap().ends_with("; Secure")));
}

#[tokio::test]
async fn test_production_masks_internal_errors() {
    let pool = db::create_test_pool().await.unwrap();
    let state = AppState::new(pool, &test_config(Environment::Production));

    let app = axum::Router::new()
        .route(
            "/boom",
            axum::routing::get(|| async { ApiError::internal_error("connection refused at 10.0.0.5") }),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            api::middleware::mask_internal_errors,
        ))
        .with_state(state);
    let server = TestServer::new(app).unwrap();

    let response = server.get("/boom").await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json::<Value>();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Internal server error");
}

#[tokio::test]
async fn test_blank_name_rejected_and_kept() {
    let app = setup().await;

    let blank_register = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "email": "blank@example.com", "password": "password123", "name": "   " }))
        .await;
    assert_eq!(blank_register.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(blank_register.json::<Value>()["message"], "Name must not be blank");

    let (id, cookies) = register(&app, "named@example.com").await;
    let response = app
        .server
        .patch(&format!("/api/users/{}", id))
        .add_header(header::COOKIE, cookies)
        .json(&json!({ "name": "   " }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], "Name must not be blank");

    let user = app.server.get(&format!("/api/users/{}", id)).await;
    assert_eq!(user.json::<Value>()["data"]["name"], "Tester");
}

#[tokio::test]
async fn test_foreign_account_edit_forbidden_before_body_checks() {
    let app = setup().await;
    let (alice_id, _) = register(&app, "alice@example.com").await;
    let (_, bob) = register(&app, "bob@example.com").await;

    let response = app
        .server
        .patch(&format!("/api/users/{}", alice_id))
        .add_header(header::COOKIE, bob)
        .json(&json!({ "email": "not-an-email", "password": "short" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert!(response.json::<Value>().get("details").is_none());
}
