//! Content loading for quire.
//!
//! This crate reads the markdown tree on disk (frontmatter plus body), renders
//! it to HTML and assembles a [`quire_core::ContentSnapshot`]. It is purely
//! synchronous; callers run it on a blocking thread.

pub mod error;
pub mod frontmatter;
pub mod load;
pub mod markdown;
pub mod slug;

pub use error::{FileError, LoadError};
pub use load::{ContentLayout, load_content};
pub use markdown::render_markdown;
pub use slug::{post_slug, slugify};
