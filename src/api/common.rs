//! Common API utilities and shared types

use serde::Deserialize;
use validator::Validate;

use crate::api::middleware::ApiError;
use crate::models::{ListParams, DEFAULT_PAGE_SIZE};

/// Default page number (1-indexed)
pub fn default_page() -> u32 {
    1
}

/// Default page size
pub fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Basic pagination query parameters
#[derive(Debug, Deserialize, Validate)]
pub struct PaginationQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: u32,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: u32,
}

impl PaginationQuery {
    pub fn params(&self) -> ListParams {
        ListParams::new(self.page, self.limit)
    }
}

/// Reject a provided text field that is only whitespace
///
/// Length rules count whitespace, so `"   "` passes them.
pub fn reject_blank(value: Option<&str>, message: &str) -> Result<(), ApiError> {
    match value {
        Some(v) if v.trim().is_empty() => Err(ApiError::bad_request(message)),
        _ => Ok(()),
    }
}
