//! Content tree loader.
//!
//! Layout under the content root:
//!
//! - `posts/*.md`: journal posts
//! - `private/*.md`: private posts, never public whatever their status
//! - `pages/*.md`: standalone pages
//! - `projects/*.md`: projects
//!
//! A missing subdirectory is an empty collection. A bad individual file is
//! logged and skipped. Only a missing or unlistable root fails the load.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use quire_core::{ContentSnapshot, Page, Post, PostStatus, Project};

use crate::error::{FileError, LoadError};
use crate::frontmatter::{self, PageMeta, PostMeta, ProjectMeta};
use crate::markdown::render_markdown;
use crate::slug::{file_slug, post_slug};

/// Directory names under the content root.
pub struct ContentLayout;

impl ContentLayout {
    pub const POSTS: &'static str = "posts";
    pub const PRIVATE: &'static str = "private";
    pub const PAGES: &'static str = "pages";
    pub const PROJECTS: &'static str = "projects";
}

/// Load and render every content file under `root`.
///
/// Posts are ordered newest first. When two post files share a slug the one
/// seen first wins: `posts/` before `private/`, lexical order within each.
///
/// # Errors
///
/// Returns `LoadError::RootMissing` if `root` is not a directory and
/// `LoadError::Io` if an existing directory cannot be listed.
pub fn load_content(root: &Path) -> Result<ContentSnapshot, LoadError> {
    if !root.is_dir() {
        return Err(LoadError::RootMissing(root.to_path_buf()));
    }
    let started = Instant::now();

    let mut seen = HashSet::new();
    let mut posts = load_posts(&root.join(ContentLayout::POSTS), false, &mut seen)?;
    posts.extend(load_posts(&root.join(ContentLayout::PRIVATE), true, &mut seen)?);
    let pages = load_pages(&root.join(ContentLayout::PAGES))?;
    let projects = load_projects(&root.join(ContentLayout::PROJECTS))?;

    let snapshot = ContentSnapshot::new(posts, pages, projects);
    tracing::info!(
        root = %root.display(),
        posts = snapshot.posts.len(),
        pages = snapshot.pages.len(),
        projects = snapshot.projects.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "content loaded"
    );
    Ok(snapshot)
}

/// Markdown files directly inside `dir`, sorted by name.
fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "content directory absent");
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir).map_err(|source| LoadError::Io { path: dir.to_path_buf(), source })?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Io { path: dir.to_path_buf(), source })?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "md") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> Result<&str, FileError> {
    path.file_name().and_then(|n| n.to_str()).ok_or(FileError::InvalidName)
}

fn skip(path: &Path, err: &FileError) {
    tracing::warn!(path = %path.display(), error = %err, "skipping content file");
}

fn load_posts(dir: &Path, private: bool, seen: &mut HashSet<String>) -> Result<Vec<Post>, LoadError> {
    let mut posts = Vec::new();
    for path in markdown_files(dir)? {
        match parse_post(&path, private) {
            Ok(post) => {
                if !seen.insert(post.slug.clone()) {
                    tracing::warn!(path = %path.display(), slug = %post.slug, "duplicate post slug, skipping");
                    continue;
                }
                posts.push(post);
            }
            Err(err) => skip(&path, &err),
        }
    }
    Ok(posts)
}

fn parse_post(path: &Path, private: bool) -> Result<Post, FileError> {
    let slug = post_slug(file_name(path)?).to_string();
    if slug.is_empty() {
        return Err(FileError::InvalidName);
    }
    let source = std::fs::read_to_string(path)?;
    let (meta, body): (PostMeta, _) = frontmatter::parse(&source)?;
    let date = meta.parsed_date()?;

    Ok(Post {
        title: if meta.title.is_empty() { slug.clone() } else { meta.title },
        slug,
        description: meta.description,
        status: meta.status.unwrap_or(PostStatus::Public),
        private,
        date,
        tags: meta.tags,
        body: render_markdown(body),
        project: meta.project.filter(|p| !p.is_empty()),
    })
}

fn load_pages(dir: &Path) -> Result<Vec<Page>, LoadError> {
    let mut pages = Vec::new();
    for path in markdown_files(dir)? {
        match parse_page(&path) {
            Ok(page) => pages.push(page),
            Err(err) => skip(&path, &err),
        }
    }
    Ok(pages)
}

fn parse_page(path: &Path) -> Result<Page, FileError> {
    let slug = file_slug(file_name(path)?).to_string();
    let source = std::fs::read_to_string(path)?;
    let (meta, body): (PageMeta, _) = frontmatter::parse(&source)?;
    Ok(Page { title: if meta.title.is_empty() { slug.clone() } else { meta.title }, slug, body: render_markdown(body) })
}

fn load_projects(dir: &Path) -> Result<Vec<Project>, LoadError> {
    let mut projects = Vec::new();
    for path in markdown_files(dir)? {
        match parse_project(&path) {
            Ok(project) => projects.push(project),
            Err(err) => skip(&path, &err),
        }
    }
    Ok(projects)
}

fn parse_project(path: &Path) -> Result<Project, FileError> {
    let slug = file_slug(file_name(path)?).to_string();
    let source = std::fs::read_to_string(path)?;
    let (meta, body): (ProjectMeta, _) = frontmatter::parse(&source)?;

    Ok(Project {
        title: if meta.title.is_empty() { slug.clone() } else { meta.title },
        slug,
        description: meta.description,
        repo: meta.repo,
        featured: meta.featured,
        status: meta.status.filter(|s| !s.is_empty()).unwrap_or_else(|| "active".to_string()),
        tags: meta.tags,
        body: render_markdown(body),
    })
}
