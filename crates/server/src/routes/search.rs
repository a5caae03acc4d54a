//! Full-text search over public posts and projects.

use axum::Json;
use axum::extract::{Query, State};
use quire_core::SearchHit;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::SharedState;

const MAX_RESULTS: usize = 20;
const MAX_QUERY_LEN: usize = 200;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
}

pub async fn search(
    State(state): State<SharedState>, Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = params.q.trim().to_string();
    if query.len() > MAX_QUERY_LEN {
        return Err(ApiError::BadRequest("query too long"));
    }
    let results = if query.is_empty() { Vec::new() } else { state.store.search(&query, MAX_RESULTS).await? };
    Ok(Json(SearchResponse { query, results }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use quire_core::search::index_entries;
    use quire_core::{AppConfig, ContentSnapshot, Post};

    use crate::reload::testing::post;
    use crate::routes::testing::TestApp;

    async fn app() -> TestApp {
        let snapshot = ContentSnapshot::new(
            vec![
                Post { body: "<p>Writing a parser in Rust</p>".into(), ..post("parser") },
                Post { body: "<p>Rust secrets</p>".into(), private: true, ..post("journal") },
            ],
            Vec::new(),
            Vec::new(),
        );
        let app = TestApp::new(AppConfig::default(), snapshot).await;
        let entries = index_entries(&app.state.cache.read());
        app.state.store.rebuild_search_index(entries).await.unwrap();
        app
    }

    #[tokio::test]
    async fn test_search_finds_public_posts_only() {
        let app = app().await;
        let (status, body) = app.get("/search?q=rust").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["query"], "rust");
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["slug"], "parser");
        assert!(results[0]["snippet"].as_str().unwrap().contains("<mark>"));
    }

    #[tokio::test]
    async fn test_empty_query_returns_nothing() {
        let app = app().await;
        let (status, body) = app.get("/search?q=%20%20").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["results"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_operator_syntax_is_not_an_error() {
        let app = app().await;
        let (status, _) = app.get("/search?q=rust%20OR%20%22").await;
        assert_eq!(status, StatusCode::OK);
    }
}
