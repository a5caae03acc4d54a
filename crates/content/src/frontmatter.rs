//! YAML frontmatter between `---` fences.
//!
//! ```text
//! ---
//! title: Hello world
//! date: 2026-02-25
//! tags: [rust, web]
//! ---
//! Markdown body...
//! ```

use chrono::NaiveDate;
use quire_core::PostStatus;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::FileError;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostMeta {
    pub title: String,
    pub date: Option<String>,
    pub tags: Vec<String>,
    pub status: Option<PostStatus>,
    pub description: String,
    pub project: Option<String>,
}

impl PostMeta {
    /// Publish date in `YYYY-MM-DD` form.
    pub fn parsed_date(&self) -> Result<NaiveDate, FileError> {
        let raw = self.date.as_deref().ok_or(FileError::MissingField("date"))?;
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| FileError::InvalidDate(raw.to_string()))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageMeta {
    pub title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProjectMeta {
    pub title: String,
    pub description: String,
    pub repo: String,
    pub status: Option<String>,
    pub featured: bool,
    pub tags: Vec<String>,
}

/// Split a document into its frontmatter block and markdown body.
///
/// Documents without an opening fence have no frontmatter.
pub fn split(source: &str) -> Result<(Option<&str>, &str), FileError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let Some(rest) = strip_fence(source) else {
        return Ok((None, source));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((Some(yaml), body));
        }
        offset += line.len();
    }
    Err(FileError::Unterminated)
}

fn strip_fence(source: &str) -> Option<&str> {
    let first_line_end = source.find('\n')?;
    if source[..first_line_end].trim_end() == "---" { Some(&source[first_line_end + 1..]) } else { None }
}

/// Parse a document into typed frontmatter and the markdown body.
pub fn parse<T: DeserializeOwned + Default>(source: &str) -> Result<(T, &str), FileError> {
    let (yaml, body) = split(source)?;
    let meta = match yaml {
        Some(yaml) if !yaml.trim().is_empty() => serde_yaml::from_str(yaml)?,
        _ => T::default(),
    };
    Ok((meta, body))
}
