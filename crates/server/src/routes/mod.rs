//! HTTP routes.
//!
//! Reader-facing content is served as JSON documents, the feed as RSS.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::Router;
use axum::extract::rejection::FormRejection;
use axum::extract::{ConnectInfo, DefaultBodyLimit, FromRequestParts};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::SharedState;

mod admin;
mod comments;
mod deploy;
mod feed;
mod health;
mod pages;
mod posts;
mod projects;
mod search;
mod subscribe;

/// Largest comment form accepted.
pub const COMMENT_FORM_LIMIT: usize = 16 * 1024;
/// Largest subscription form accepted.
pub const SUBSCRIBE_FORM_LIMIT: usize = 4 * 1024;

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(posts::home))
        .route("/posts", get(posts::list))
        .route("/posts/{slug}", get(posts::show))
        .route(
            "/posts/{slug}/comments",
            post(comments::create).layer(DefaultBodyLimit::max(COMMENT_FORM_LIMIT)),
        )
        .route("/projects", get(projects::list))
        .route("/projects/{slug}", get(projects::show))
        .route("/pages/{slug}", get(pages::show))
        .route("/uses", get(pages::uses))
        .route("/now", get(pages::now))
        .route("/rss.xml", get(feed::rss))
        .route("/search", get(search::search))
        .route("/subscribe", post(subscribe::subscribe).layer(DefaultBodyLimit::max(SUBSCRIBE_FORM_LIMIT)))
        .route("/subscribe/verify", get(subscribe::verify))
        .route("/subscribe/remove", get(subscribe::remove))
        .route("/deploy", post(deploy::deploy))
        .route("/api/health", get(health::health))
        .route("/api/admin/stats", get(admin::stats))
        .route("/api/admin/comments", get(admin::comments))
        .route("/api/admin/comments/{id}/toggle", post(admin::toggle_comment))
        .route("/api/admin/comments/{id}/delete", post(admin::delete_comment))
        .route("/api/admin/subscribers", get(admin::subscribers))
        .fallback(|| async { ApiError::NotFound })
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Remote IP of the connection, `unknown` when not served over a socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Ok(ClientIp(ip))
    }
}

/// Map a form extraction failure to a client error.
fn form_error(rejection: FormRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::BadRequest("malformed form")
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use axum::body::{Body, Bytes};
    use axum::http::{HeaderMap, Request};
    use http_body_util::BodyExt;
    use quire_core::{AppConfig, ContentSnapshot, Store};
    use tower::ServiceExt;

    use super::*;
    use crate::notify::testing::RecordingNotifier;
    use crate::reload::testing::{FakePuller, ScriptedLoader};
    use crate::state::AppState;

    pub struct TestApp {
        pub state: SharedState,
        pub notifier: Arc<RecordingNotifier>,
        pub loader: Arc<ScriptedLoader>,
        pub puller: Arc<FakePuller>,
    }

    impl TestApp {
        pub async fn new(config: AppConfig, snapshot: ContentSnapshot) -> Self {
            let store = Store::open_in_memory().await.unwrap();
            let notifier = Arc::new(RecordingNotifier::default());
            let loader = Arc::new(ScriptedLoader::default());
            let puller = Arc::new(FakePuller::default());
            let state = AppState::new(config, store, loader.clone(), puller.clone(), notifier.clone());
            state.cache.replace(snapshot);
            Self { state: Arc::new(state), notifier, loader, puller }
        }

        pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
            let response = build_router(self.state.clone()).oneshot(request).await.unwrap();
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.into_body().collect().await.unwrap().to_bytes();
            (status, headers, body)
        }

        pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
            let (status, _, body) = self.send(Request::get(uri).body(Body::empty()).unwrap()).await;
            let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
            (status, json)
        }

        pub async fn post_form(&self, uri: &str, form: &str) -> (StatusCode, HeaderMap) {
            let request = Request::post(uri)
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .unwrap();
            let (status, headers, _) = self.send(request).await;
            (status, headers)
        }
    }
}
