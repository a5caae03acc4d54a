//! Standalone pages.

use axum::Json;
use axum::extract::{Path, State};
use quire_core::Page;

use crate::error::ApiError;
use crate::state::SharedState;

fn find(state: &SharedState, slug: &str) -> Result<Json<Page>, ApiError> {
    state.cache.read().find_page(slug).cloned().map(Json).ok_or(ApiError::NotFound)
}

pub async fn show(State(state): State<SharedState>, Path(slug): Path<String>) -> Result<Json<Page>, ApiError> {
    find(&state, &slug)
}

pub async fn uses(State(state): State<SharedState>) -> Result<Json<Page>, ApiError> {
    find(&state, "uses")
}

pub async fn now(State(state): State<SharedState>) -> Result<Json<Page>, ApiError> {
    find(&state, "now")
}
