//! Services layer - Business logic
//!
//! This module contains the business logic of the blog API.
//! Services are responsible for:
//! - Implementing business rules (ownership, uniqueness)
//! - Coordinating between repositories
//! - Issuing and checking credentials

pub mod comment;
pub mod password;
pub mod post;
pub mod token;
pub mod user;

pub use comment::{CommentService, CommentServiceError};
pub use password::{hash_password, verify_password};
pub use post::{PostService, PostServiceError};
pub use token::{Claims, TokenError, TokenPair, TokenService, TokenType};
pub use user::{UserService, UserServiceError};
