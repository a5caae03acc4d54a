//! Local content authoring: new drafts, new projects, publishing.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use quire_content::{ContentLayout, post_slug, slugify};
use serde::Serialize;

#[derive(Serialize)]
struct PostTemplate<'a> {
    title: &'a str,
    date: String,
    tags: Vec<String>,
    description: &'a str,
}

#[derive(Serialize)]
struct ProjectTemplate<'a> {
    title: &'a str,
    description: &'a str,
    repo: &'a str,
    status: &'a str,
    featured: bool,
    tags: Vec<String>,
}

/// Content tree rooted at `root`.
#[derive(Debug, Clone)]
pub struct Scaffold {
    root: PathBuf,
}

impl Scaffold {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create `private/<date>-<slug>.md`. New posts start private.
    pub fn new_post(&self, title: &str, date: NaiveDate) -> Result<PathBuf> {
        let slug = non_empty_slug(title)?;
        let date = date.format("%Y-%m-%d").to_string();
        let path = self.root.join(ContentLayout::PRIVATE).join(format!("{date}-{slug}.md"));
        let meta = PostTemplate { title, date, tags: Vec::new(), description: "" };
        write_new(&path, &document(&meta)?)?;
        Ok(path)
    }

    /// Create `projects/<slug>.md`.
    pub fn new_project(&self, name: &str) -> Result<PathBuf> {
        let slug = non_empty_slug(name)?;
        let path = self.root.join(ContentLayout::PROJECTS).join(format!("{slug}.md"));
        let meta =
            ProjectTemplate { title: name, description: "", repo: "", status: "active", featured: false, tags: Vec::new() };
        write_new(&path, &document(&meta)?)?;
        Ok(path)
    }

    /// Move the private post with `slug` into `posts/`. Returns `(from, to)`.
    pub fn publish(&self, slug: &str) -> Result<(PathBuf, PathBuf)> {
        let private = self.root.join(ContentLayout::PRIVATE);
        let mut names: Vec<String> = fs::read_dir(&private)
            .with_context(|| format!("reading {}", private.display()))?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(".md"))
            .collect();
        names.sort();

        let Some(name) = names.into_iter().find(|name| post_slug(name) == slug) else {
            bail!("no private post found with slug {slug:?}");
        };

        let posts = self.root.join(ContentLayout::POSTS);
        fs::create_dir_all(&posts).with_context(|| format!("creating {}", posts.display()))?;
        let from = private.join(&name);
        let to = posts.join(&name);
        if to.exists() {
            bail!("{} already exists", to.display());
        }
        fs::rename(&from, &to).with_context(|| format!("moving {} to {}", from.display(), to.display()))?;
        Ok((from, to))
    }
}

fn non_empty_slug(title: &str) -> Result<String> {
    let slug = slugify(title);
    if slug.is_empty() {
        bail!("title {title:?} has no characters usable in a slug");
    }
    Ok(slug)
}

fn document<T: Serialize>(meta: &T) -> Result<String> {
    let yaml = serde_yaml::to_string(meta).context("serializing frontmatter")?;
    Ok(format!("---\n{yaml}---\n\n"))
}

fn write_new(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("creating {}", path.display()))?;
    file.write_all(contents.as_bytes())?;
    Ok(())
}

/// Open `path` in `$EDITOR`, if one is set.
pub fn open_editor(path: &Path) -> Result<()> {
    let Some(editor) = std::env::var_os("EDITOR").filter(|e| !e.is_empty()) else {
        return Ok(());
    };
    let status = Command::new(&editor).arg(path).status().with_context(|| format!("launching {editor:?}"))?;
    if !status.success() {
        tracing::warn!(%status, "editor exited unsuccessfully");
    }
    Ok(())
}
