//! SQLite-backed persistence.
//!
//! Async access via tokio-rusqlite. Holds:
//!
//! - Visitor comments and their moderation state
//! - Email subscribers and the notified-posts ledger
//! - The full-text search index, rebuilt whole on every reload
//! - Versioned schema migrations, WAL mode

pub mod comments;
pub mod connection;
pub mod migrations;
pub mod search;
pub mod subscribers;

pub use crate::Error;

pub use comments::Comment;
pub use connection::Store;
pub use subscribers::{Recipient, SubscriberCounts, Subscription, new_token};
