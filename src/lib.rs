//! Blog API - A blog REST API with JWT cookie authentication
//!
//! This library provides users, posts and comments over HTTP, backed by
//! SQLite or MySQL.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
