//! Search index entry derivation.
//!
//! Turns a [`ContentSnapshot`] into the flat rows stored in the full-text
//! index. Only public posts and projects are indexed.

use scraper::Html;
use serde::Serialize;

use crate::content::ContentSnapshot;

/// Kind of content a search row points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Post,
    Project,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Post => "post",
            ContentType::Project => "project",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "post" => Some(ContentType::Post),
            "project" => Some(ContentType::Project),
            _ => None,
        }
    }
}

/// One row of the full-text index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchIndexEntry {
    pub slug: String,
    pub title: String,
    /// Tags joined with single spaces.
    pub tags: String,
    /// Rendered body with markup removed.
    pub body: String,
    pub content_type: ContentType,
}

/// A ranked match returned by [`crate::Store::search`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub slug: String,
    pub title: String,
    pub content_type: ContentType,
    /// Escaped HTML excerpt with matches wrapped in `<mark>`.
    pub snippet: String,
}

/// Every index row for a snapshot, posts first.
pub fn index_entries(snapshot: &ContentSnapshot) -> Vec<SearchIndexEntry> {
    let posts = snapshot.public_posts().map(|p| SearchIndexEntry {
        slug: p.slug.clone(),
        title: p.title.clone(),
        tags: p.tags.join(" "),
        body: strip_tags(&p.body),
        content_type: ContentType::Post,
    });
    let projects = snapshot.projects.iter().map(|p| SearchIndexEntry {
        slug: p.slug.clone(),
        title: p.title.clone(),
        tags: p.tags.join(" "),
        body: strip_tags(&p.body),
        content_type: ContentType::Project,
    });
    posts.chain(projects).collect()
}

/// Visible text of rendered HTML.
///
/// Entities are decoded and text nodes are joined with single spaces, so
/// element boundaries never glue words together.
pub fn strip_tags(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
