//! Data models
//!
//! This module contains all data structures used throughout the blog API.
//! Models represent:
//! - Database entities (User, Post, Comment)
//! - Relation projections returned by the API
//! - Internal data transfer objects and pagination types

mod comment;
mod pagination;
mod post;
mod user;

pub use comment::{Comment, CommentWithAuthor, CreateCommentInput};
pub use pagination::{ListParams, PageMeta, PagedResult, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use post::{
    like_pattern, CreatePostInput, ListPostsParams, Post, PostDetail, PostWithAuthor,
    UpdatePostInput,
};
pub use user::{CreateUserInput, UpdateUserInput, User, UserSummary, UserWithCount, UserWithPosts};
