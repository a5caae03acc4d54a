//! Client for the server's admin API.

use std::fmt::Write as _;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde::de::DeserializeOwned;

pub const URL_VAR: &str = "QUIRE_URL";
pub const KEY_VAR: &str = "QUIRE_ADMIN_API_KEY";

#[derive(Debug, Deserialize)]
pub struct PostCounts {
    pub public: u64,
    pub draft: u64,
    pub private: u64,
}

#[derive(Debug, Deserialize)]
pub struct Stats {
    pub posts: PostCounts,
    pub pages: u64,
    pub projects: u64,
    pub comments: u64,
}

#[derive(Debug, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_slug: String,
    pub author: String,
    pub body: String,
    pub visible: bool,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct SubscriberCounts {
    pub total: u64,
    pub verified: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moderation {
    Toggle,
    Delete,
}

impl Moderation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Moderation::Toggle => "toggle",
            Moderation::Delete => "delete",
        }
    }
}

pub struct AdminClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl AdminClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self { base_url, api_key: api_key.to_string(), http: reqwest::Client::new() }
    }

    /// Build from `QUIRE_URL` and `QUIRE_ADMIN_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let url = lookup(URL_VAR).filter(|v| !v.is_empty());
        let key = lookup(KEY_VAR).filter(|v| !v.is_empty());
        match (url, key) {
            (Some(url), Some(key)) => Ok(Self::new(&url, &key)),
            _ => bail!("{URL_VAR} and {KEY_VAR} must be set"),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .with_context(|| format!("GET {path}"))?;
        decode(resp).await
    }

    pub async fn stats(&self) -> Result<Stats> {
        self.get("/api/admin/stats").await
    }

    pub async fn comments(&self) -> Result<Vec<Comment>> {
        self.get("/api/admin/comments").await
    }

    pub async fn subscribers(&self) -> Result<SubscriberCounts> {
        self.get("/api/admin/subscribers").await
    }

    pub async fn moderate(&self, id: i64, action: Moderation) -> Result<()> {
        let path = format!("/api/admin/comments/{id}/{}", action.as_str());
        let resp = self
            .http
            .post(self.url(&path))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .with_context(|| format!("POST {path}"))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("server returned {status}: {body}");
        }
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("server returned {status}: {body}");
    }
    resp.json().await.context("decoding response")
}

pub fn render_stats(stats: &Stats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Dashboard");
    let _ = writeln!(out, "─────────");
    let _ = writeln!(out, "Public posts:  {}", stats.posts.public);
    let _ = writeln!(out, "Draft posts:   {}", stats.posts.draft);
    let _ = writeln!(out, "Private posts: {}", stats.posts.private);
    let _ = writeln!(out, "Pages:         {}", stats.pages);
    let _ = writeln!(out, "Projects:      {}", stats.projects);
    let _ = writeln!(out, "Comments:      {}", stats.comments);
    out
}

pub fn render_comments(comments: &[Comment]) -> String {
    if comments.is_empty() {
        return "No comments.\n".to_string();
    }
    let mut out = String::new();
    for c in comments {
        let visibility = if c.visible { "visible" } else { "hidden" };
        let when = c.created_at.get(..16).unwrap_or(&c.created_at).replace('T', " ");
        let _ = writeln!(out, "#{} [{visibility}] on {} by {} ({when})\n  {}\n", c.id, c.post_slug, c.author, c.body);
    }
    out
}

pub fn render_subscribers(counts: &SubscriberCounts) -> String {
    let pending = counts.total.saturating_sub(counts.verified);
    format!("Subscribers: {} ({} verified, {pending} pending)\n", counts.total, counts.verified)
}
