//! Content model shared by the loader, the live cache and the HTTP layer.
//!
//! A [`ContentSnapshot`] is an immutable view of every post, page and project
//! at one instant. It is built completely by the loader and then handed to
//! [`crate::LiveCache`]; nothing mutates it afterwards.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Publication status declared in a post's frontmatter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Public,
    Draft,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Public => "public",
            PostStatus::Draft => "draft",
        }
    }
}

/// A journal post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    /// Unique within a snapshot, derived from the file name.
    pub slug: String,
    pub description: String,
    pub status: PostStatus,
    /// Loaded from the private directory; never shown publicly regardless of status.
    pub private: bool,
    pub date: NaiveDate,
    pub tags: Vec<String>,
    /// Rendered HTML.
    pub body: String,
    /// Slug of the project this post belongs to, if any.
    pub project: Option<String>,
}

impl Post {
    /// The single visibility rule: public status and not private.
    ///
    /// Listings, the feed, search indexing, comment eligibility and
    /// subscriber notifications all go through this.
    pub fn is_public(&self) -> bool {
        self.status == PostStatus::Public && !self.private
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A standalone page such as `/uses` or `/now`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub title: String,
    pub slug: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub repo: String,
    pub featured: bool,
    /// Free-form status, `active` unless the frontmatter says otherwise.
    pub status: String,
    pub tags: Vec<String>,
    pub body: String,
}

/// All content at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentSnapshot {
    /// Sorted by date, newest first.
    pub posts: Vec<Post>,
    pub pages: Vec<Page>,
    pub projects: Vec<Project>,
}

impl ContentSnapshot {
    /// Build a snapshot, enforcing newest-first post order.
    ///
    /// The sort is stable so posts sharing a date keep their load order.
    pub fn new(mut posts: Vec<Post>, pages: Vec<Page>, projects: Vec<Project>) -> Self {
        posts.sort_by(|a, b| b.date.cmp(&a.date));
        Self { posts, pages, projects }
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty() && self.pages.is_empty() && self.projects.is_empty()
    }

    /// Publicly visible posts, newest first.
    pub fn public_posts(&self) -> impl Iterator<Item = &Post> {
        self.posts.iter().filter(|p| p.is_public())
    }

    /// Any post with the slug, public or not.
    pub fn find_post(&self, slug: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.slug == slug)
    }

    /// A post only if it is publicly visible.
    pub fn find_public_post(&self, slug: &str) -> Option<&Post> {
        self.find_post(slug).filter(|p| p.is_public())
    }

    pub fn find_page(&self, slug: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.slug == slug)
    }

    pub fn find_project(&self, slug: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.slug == slug)
    }

    pub fn featured_projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter().filter(|p| p.featured)
    }

    /// Public posts attached to a project.
    pub fn related_posts<'a>(&'a self, project_slug: &'a str) -> impl Iterator<Item = &'a Post> + 'a {
        self.public_posts()
            .filter(move |p| p.project.as_deref() == Some(project_slug))
    }

    /// Content fingerprint used to tell whether a reload changed anything.
    ///
    /// Covers every field that reaches readers, in snapshot order.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for post in &self.posts {
            hasher.update(b"post\n");
            hasher.update(post.slug.as_bytes());
            hasher.update(b"\n");
            hasher.update(post.title.as_bytes());
            hasher.update(b"\n");
            hasher.update(post.description.as_bytes());
            hasher.update(b"\n");
            hasher.update(post.status.as_str().as_bytes());
            hasher.update([post.private as u8]);
            hasher.update(post.date.to_string().as_bytes());
            hasher.update(post.tags.join("\u{1f}").as_bytes());
            hasher.update(b"\n");
            hasher.update(post.project.as_deref().unwrap_or_default().as_bytes());
            hasher.update(b"\n");
            hasher.update(post.body.as_bytes());
        }
        for page in &self.pages {
            hasher.update(b"page\n");
            hasher.update(page.slug.as_bytes());
            hasher.update(b"\n");
            hasher.update(page.title.as_bytes());
            hasher.update(b"\n");
            hasher.update(page.body.as_bytes());
        }
        for project in &self.projects {
            hasher.update(b"project\n");
            hasher.update(project.slug.as_bytes());
            hasher.update(b"\n");
            hasher.update(project.title.as_bytes());
            hasher.update(b"\n");
            hasher.update(project.description.as_bytes());
            hasher.update(b"\n");
            hasher.update(project.repo.as_bytes());
            hasher.update([project.featured as u8]);
            hasher.update(project.status.as_bytes());
            hasher.update(project.tags.join("\u{1f}").as_bytes());
            hasher.update(b"\n");
            hasher.update(project.body.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn post(slug: &str, date: (i32, u32, u32)) -> Post {
        Post {
            title: format!("Title of {slug}"),
            slug: slug.to_string(),
            description: String::new(),
            status: PostStatus::Public,
            private: false,
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            tags: Vec::new(),
            body: format!("<p>Body of {slug}</p>"),
            project: None,
        }
    }

    pub fn page(slug: &str) -> Page {
        Page { title: slug.to_uppercase(), slug: slug.to_string(), body: format!("<p>{slug}</p>") }
    }

    pub fn project(slug: &str) -> Project {
        Project {
            title: format!("Project {slug}"),
            slug: slug.to_string(),
            description: String::new(),
            repo: String::new(),
            featured: false,
            status: "active".to_string(),
            tags: Vec::new(),
            body: format!("<p>About {slug}</p>"),
        }
    }
}
