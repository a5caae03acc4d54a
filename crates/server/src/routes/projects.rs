//! Project listings.

use axum::Json;
use axum::extract::{Path, State};
use quire_core::Project;
use serde::Serialize;

use super::posts::PostSummary;
use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct ProjectSummary {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub repo: String,
    pub featured: bool,
    pub status: String,
    pub tags: Vec<String>,
}

impl From<&Project> for ProjectSummary {
    fn from(project: &Project) -> Self {
        Self {
            title: project.title.clone(),
            slug: project.slug.clone(),
            description: project.description.clone(),
            repo: project.repo.clone(),
            featured: project.featured,
            status: project.status.clone(),
            tags: project.tags.clone(),
        }
    }
}

pub async fn list(State(state): State<SharedState>) -> Json<Vec<ProjectSummary>> {
    let snapshot = state.cache.read();
    Json(snapshot.projects.iter().map(ProjectSummary::from).collect())
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    #[serde(flatten)]
    pub project: Project,
    /// Public posts that reference this project.
    pub posts: Vec<PostSummary>,
}

pub async fn show(
    State(state): State<SharedState>, Path(slug): Path<String>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let snapshot = state.cache.read();
    let project = snapshot.find_project(&slug).cloned().ok_or(ApiError::NotFound)?;
    let posts = snapshot.related_posts(&project.slug).map(PostSummary::from).collect();
    Ok(Json(ProjectResponse { project, posts }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use quire_core::{AppConfig, ContentSnapshot, Post, Project};

    use crate::reload::testing::post;
    use crate::routes::testing::TestApp;

    fn project(slug: &str, featured: bool) -> Project {
        Project {
            title: slug.to_uppercase(),
            slug: slug.to_string(),
            description: format!("about {slug}"),
            repo: format!("https://example.com/{slug}"),
            featured,
            status: "active".to_string(),
            tags: Vec::new(),
            body: String::new(),
        }
    }

    fn snapshot() -> ContentSnapshot {
        ContentSnapshot::new(
            vec![
                Post { project: Some("quire".into()), ..post("launch") },
                Post { project: Some("quire".into()), private: true, ..post("notes") },
            ],
            Vec::new(),
            vec![project("quire", true), project("side", false)],
        )
    }

    #[tokio::test]
    async fn test_list_projects() {
        let app = TestApp::new(AppConfig::default(), snapshot()).await;
        let (status, body) = app.get("/projects").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (_, home) = app.get("/").await;
        assert_eq!(home["projects"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_show_project_with_related_public_posts() {
        let app = TestApp::new(AppConfig::default(), snapshot()).await;
        let (status, body) = app.get("/projects/quire").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["repo"], "https://example.com/quire");
        let posts = body["posts"].as_array().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0]["slug"], "launch");

        assert_eq!(app.get("/projects/nope").await.0, StatusCode::NOT_FOUND);
    }
}
