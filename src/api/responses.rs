//! Shared API response types
//!
//! Successful responses wrap their payload as `{ "success": true, "data": ... }`;
//! list endpoints add a `pagination` block.

use axum::Json;
use serde::Serialize;

use crate::models::{PageMeta, PagedResult};

/// Envelope for a single payload
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Envelope for a page of items
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> From<PagedResult<T>> for Paginated<T> {
    fn from(result: PagedResult<T>) -> Self {
        let pagination = result.meta();
        Self {
            success: true,
            data: result.items,
            pagination,
        }
    }
}

/// Body for endpoints that only report an outcome
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
        })
    }
}
