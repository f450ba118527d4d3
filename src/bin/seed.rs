//! Seed the database with demo users, posts and comments
//!
//! Usage: `cargo run --bin seed`
//!
//! Safe to run repeatedly; demo accounts that already exist are skipped
//! together with their content.

use anyhow::{Context, Result};
use std::path::Path;

use blog_api::{
    config::Config,
    db::{
        self,
        repositories::{SqlxCommentRepository, SqlxPostRepository, SqlxUserRepository},
    },
    models::{CreatePostInput, CreateUserInput, User},
    services::{CommentService, PostService, UserService, UserServiceError},
};

const DEMO_PASSWORD: &str = "password123";

struct DemoPost {
    title: &'static str,
    content: &'static str,
    published: bool,
}

struct DemoUser {
    email: &'static str,
    name: &'static str,
    posts: &'static [DemoPost],
}

const DEMO_USERS: &[DemoUser] = &[
    DemoUser {
        email: "alice@example.com",
        name: "Alice",
        posts: &[
            DemoPost {
                title: "Getting started with Rust",
                content: "Ownership, borrowing and lifetimes in a nutshell.",
                published: true,
            },
            DemoPost {
                title: "Draft: async pitfalls",
                content: "Notes on holding locks across await points.",
                published: false,
            },
        ],
    },
    DemoUser {
        email: "bob@example.com",
        name: "Bob",
        posts: &[DemoPost {
            title: "Building a REST API with axum",
            content: "Routers, extractors and middleware.",
            published: true,
        }],
    },
];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seed=info,blog_api=info".into()),
        )
        .init();

    let config = Config::load_with_env(Path::new("config.yml"))?;
    let pool = db::create_pool(&config.database).await?;
    db::migrations::run_migrations(&pool).await?;

    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let post_repo = SqlxPostRepository::boxed(pool.clone());
    let comment_repo = SqlxCommentRepository::boxed(pool.clone());

    let users = UserService::new(user_repo.clone(), post_repo.clone());
    let posts = PostService::new(post_repo.clone(), user_repo.clone(), comment_repo.clone());
    let comments = CommentService::new(comment_repo, post_repo, user_repo);

    let mut created: Vec<User> = Vec::new();
    for demo in DEMO_USERS {
        let input = CreateUserInput {
            email: demo.email.to_string(),
            password: DEMO_PASSWORD.to_string(),
            name: Some(demo.name.to_string()),
        };

        let user = match users.register(input).await {
            Ok(user) => user,
            Err(UserServiceError::UserExists(_)) => {
                tracing::info!("Skipping existing demo user {}", demo.email);
                continue;
            }
            Err(e) => return Err(e).context("Failed to create demo user"),
        };

        for post in demo.posts {
            posts
                .create(
                    user.id,
                    CreatePostInput {
                        title: post.title.to_string(),
                        content: Some(post.content.to_string()),
                        published: post.published,
                    },
                )
                .await
                .context("Failed to create demo post")?;
        }

        created.push(user);
    }

    // Everyone comments on everyone else's published posts.
    for commenter in &created {
        for author in created.iter().filter(|u| u.id != commenter.id) {
            let authored = users.get_with_posts(author.id).await?;
            let greeting = author.name.as_deref().unwrap_or("friend");
            for post in authored.posts.iter().filter(|p| p.published) {
                let text = format!("Thanks for writing this, {}!", greeting);
                comments.create(post.id, commenter.id, text).await?;
            }
        }
    }

    tracing::info!("Seeded {} demo users (password: {})", created.len(), DEMO_PASSWORD);
    pool.close().await;
    Ok(())
}
