//! Bearer-token admin API used by the operator CLI.

use axum::Json;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use quire_core::PostStatus;
use quire_core::store::{Comment, SubscriberCounts};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::SharedState;
use crate::webhook::tokens_match;

/// Proof that the request carried the admin bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

impl FromRequestParts<SharedState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        let Ok(expected) = state.config.require_admin_api_key() else {
            return Err(ApiError::Forbidden("admin API disabled"));
        };
        let provided = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;
        if !tokens_match(expected, provided) {
            tracing::warn!("admin request with wrong token");
            return Err(ApiError::Unauthorized);
        }
        Ok(AdminAuth)
    }
}

#[derive(Debug, Default, Serialize)]
pub struct PostCounts {
    pub public: usize,
    pub draft: usize,
    pub private: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub posts: PostCounts,
    pub pages: usize,
    pub projects: usize,
    pub comments: u64,
}

pub async fn stats(_: AdminAuth, State(state): State<SharedState>) -> Result<Json<StatsResponse>, ApiError> {
    let snapshot = state.cache.read();
    let mut posts = PostCounts::default();
    for post in &snapshot.posts {
        if post.private {
            posts.private += 1;
        } else if post.status == PostStatus::Draft {
            posts.draft += 1;
        } else {
            posts.public += 1;
        }
    }
    let comments = state.store.count_comments().await?;
    Ok(Json(StatsResponse { posts, pages: snapshot.pages.len(), projects: snapshot.projects.len(), comments }))
}

pub async fn comments(_: AdminAuth, State(state): State<SharedState>) -> Result<Json<Vec<Comment>>, ApiError> {
    Ok(Json(state.store.all_comments().await?))
}

pub async fn toggle_comment(
    _: AdminAuth, State(state): State<SharedState>, Path(id): Path<i64>,
) -> Result<Json<Comment>, ApiError> {
    state.store.toggle_comment(id).await?;
    let comment = state.store.get_comment(id).await?.ok_or(ApiError::NotFound)?;
    tracing::info!(id, visible = comment.visible, "comment visibility toggled");
    Ok(Json(comment))
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub deleted: i64,
}

pub async fn delete_comment(
    _: AdminAuth, State(state): State<SharedState>, Path(id): Path<i64>,
) -> Result<Json<Deleted>, ApiError> {
    state.store.delete_comment(id).await?;
    tracing::info!(id, "comment deleted");
    Ok(Json(Deleted { deleted: id }))
}

pub async fn subscribers(_: AdminAuth, State(state): State<SharedState>) -> Result<Json<SubscriberCounts>, ApiError> {
    Ok(Json(state.store.subscriber_counts().await?))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use quire_core::{AppConfig, ContentSnapshot, Post, PostStatus};

    use crate::reload::testing::post;
    use crate::routes::testing::TestApp;

    const KEY: &str = "admin-key";

    async fn app() -> TestApp {
        let config = AppConfig { admin_api_key: Some(KEY.into()), ..AppConfig::default() };
        let snapshot = ContentSnapshot::new(
            vec![
                post("live"),
                Post { status: PostStatus::Draft, ..post("wip") },
                Post { private: true, ..post("journal") },
                Post { private: true, status: PostStatus::Draft, ..post("idea") },
            ],
            Vec::new(),
            Vec::new(),
        );
        TestApp::new(config, snapshot).await
    }

    async fn call(app: &TestApp, method: &str, uri: &str, token: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header("authorization", format!("Bearer {token}"));
        }
        let (status, _, body) = app.send(request.body(Body::empty()).unwrap()).await;
        (status, serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null))
    }

    #[tokio::test]
    async fn test_admin_disabled_without_key() {
        let app = TestApp::new(AppConfig::default(), ContentSnapshot::default()).await;
        let (status, _) = call(&app, "GET", "/api/admin/stats", Some("anything")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let config = AppConfig { admin_api_key: Some(String::new()), ..AppConfig::default() };
        let app = TestApp::new(config, ContentSnapshot::default()).await;
        let (status, _) = call(&app, "GET", "/api/admin/stats", Some("")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_missing_or_wrong_token_unauthorized() {
        let app = app().await;
        assert_eq!(call(&app, "GET", "/api/admin/stats", None).await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(call(&app, "GET", "/api/admin/stats", Some("admin-kez")).await.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_stats_counts() {
        let app = app().await;
        app.state.store.insert_comment("live", "Ada", "hi").await.unwrap();
        let (status, body) = call(&app, "GET", "/api/admin/stats", Some(KEY)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["posts"]["public"], 1);
        assert_eq!(body["posts"]["draft"], 1);
        assert_eq!(body["posts"]["private"], 2);
        assert_eq!(body["comments"], 1);
    }

    #[tokio::test]
    async fn test_comment_moderation() {
        let app = app().await;
        let first = app.state.store.insert_comment("live", "Ada", "first").await.unwrap();
        app.state.store.insert_comment("live", "Bob", "second").await.unwrap();

        let (_, listed) = call(&app, "GET", "/api/admin/comments", Some(KEY)).await;
        assert_eq!(listed[0]["body"], "second");

        let (status, toggled) = call(&app, "POST", &format!("/api/admin/comments/{first}/toggle"), Some(KEY)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(toggled["visible"], false);

        let (status, _) = call(&app, "POST", &format!("/api/admin/comments/{first}/delete"), Some(KEY)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(app.state.store.count_comments().await.unwrap(), 1);

        assert_eq!(call(&app, "POST", "/api/admin/comments/999/toggle", Some(KEY)).await.0, StatusCode::NOT_FOUND);
        assert_eq!(call(&app, "POST", "/api/admin/comments/999/delete", Some(KEY)).await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_subscriber_counts() {
        let app = app().await;
        app.state.store.subscribe("a@example.com").await.unwrap();
        let (status, body) = call(&app, "GET", "/api/admin/subscribers", Some(KEY)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["verified"], 0);
    }
}
