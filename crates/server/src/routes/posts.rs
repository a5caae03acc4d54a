//! Post listings and post pages.

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::NaiveDate;
use quire_core::Post;
use quire_core::store::Comment;
use serde::{Deserialize, Serialize};

use super::projects::ProjectSummary;
use crate::error::ApiError;
use crate::state::SharedState;

/// Posts shown on the home page.
const HOME_POSTS: usize = 5;

#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub date: NaiveDate,
    pub tags: Vec<String>,
    pub project: Option<String>,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.clone(),
            description: post.description.clone(),
            date: post.date,
            tags: post.tags.clone(),
            project: post.project.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub posts: Vec<PostSummary>,
    pub projects: Vec<ProjectSummary>,
}

pub async fn home(State(state): State<SharedState>) -> Json<HomeResponse> {
    let snapshot = state.cache.read();
    Json(HomeResponse {
        posts: snapshot.public_posts().take(HOME_POSTS).map(PostSummary::from).collect(),
        projects: snapshot.featured_projects().map(ProjectSummary::from).collect(),
    })
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub tag: Option<String>,
}

pub async fn list(State(state): State<SharedState>, Query(params): Query<ListParams>) -> Json<Vec<PostSummary>> {
    let snapshot = state.cache.read();
    let tag = params.tag.filter(|t| !t.is_empty());
    let posts = snapshot
        .public_posts()
        .filter(|p| tag.as_deref().is_none_or(|t| p.has_tag(t)))
        .map(PostSummary::from)
        .collect();
    Json(posts)
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    #[serde(flatten)]
    pub post: Post,
    pub comments: Vec<Comment>,
}

pub async fn show(State(state): State<SharedState>, Path(slug): Path<String>) -> Result<Json<PostResponse>, ApiError> {
    let post = state.cache.read().find_public_post(&slug).cloned().ok_or(ApiError::NotFound)?;
    let comments = state.store.visible_comments(&post.slug).await?;
    Ok(Json(PostResponse { post, comments }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use quire_core::{AppConfig, ContentSnapshot, PostStatus};

    use crate::reload::testing::post;
    use crate::routes::testing::TestApp;

    fn snapshot() -> ContentSnapshot {
        let mut posts: Vec<_> = (1..=7).map(|i| post(&format!("post-{i}"))).collect();
        for (i, p) in posts.iter_mut().enumerate() {
            p.date = chrono::NaiveDate::from_ymd_opt(2026, 1, 1 + i as u32).unwrap();
        }
        posts[0].tags = vec!["rust".into()];
        posts[1].status = PostStatus::Draft;
        posts[2].private = true;
        ContentSnapshot::new(posts, Vec::new(), Vec::new())
    }

    #[tokio::test]
    async fn test_home_shows_five_newest_public() {
        let app = TestApp::new(AppConfig::default(), snapshot()).await;
        let (status, body) = app.get("/").await;
        assert_eq!(status, StatusCode::OK);

        let slugs: Vec<_> = body["posts"].as_array().unwrap().iter().map(|p| p["slug"].as_str().unwrap()).collect();
        assert_eq!(slugs, ["post-7", "post-6", "post-5", "post-4", "post-1"]);
    }

    #[tokio::test]
    async fn test_list_filters_by_tag() {
        let app = TestApp::new(AppConfig::default(), snapshot()).await;
        let (_, all) = app.get("/posts").await;
        assert_eq!(all.as_array().unwrap().len(), 5);

        let (_, tagged) = app.get("/posts?tag=rust").await;
        let tagged = tagged.as_array().unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0]["slug"], "post-1");
    }

    #[tokio::test]
    async fn test_show_hides_non_public_posts() {
        let app = TestApp::new(AppConfig::default(), snapshot()).await;
        assert_eq!(app.get("/posts/post-2").await.0, StatusCode::NOT_FOUND);
        assert_eq!(app.get("/posts/post-3").await.0, StatusCode::NOT_FOUND);
        assert_eq!(app.get("/posts/missing").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_show_includes_visible_comments() {
        let app = TestApp::new(AppConfig::default(), snapshot()).await;
        app.state.store.insert_comment("post-1", "Ada", "Great").await.unwrap();
        let hidden = app.state.store.insert_comment("post-1", "Bob", "Hidden").await.unwrap();
        app.state.store.toggle_comment(hidden).await.unwrap();

        let (status, body) = app.get("/posts/post-1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["slug"], "post-1");
        let comments = body["comments"].as_array().unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0]["author"], "Ada");
    }
}
