//! Core types and shared functionality for quire.
//!
//! This crate provides:
//! - The content model and the live, atomically swapped content snapshot
//! - SQLite-backed persistence (comments, subscribers, notification ledger, search index)
//! - The sliding-window rate limiter guarding write endpoints
//! - Unified error types and layered configuration

pub mod config;
pub mod content;
pub mod error;
pub mod limiter;
pub mod live;
pub mod search;
pub mod store;

pub use config::AppConfig;
pub use content::{ContentSnapshot, Page, Post, PostStatus, Project};
pub use error::Error;
pub use limiter::RateLimiter;
pub use live::LiveCache;
pub use search::{ContentType, SearchHit, SearchIndexEntry};
pub use store::Store;
