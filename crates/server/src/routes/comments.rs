//! Visitor comment submission.

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Path, State};
use axum::response::Redirect;
use serde::Deserialize;

use super::{ClientIp, form_error};
use crate::error::ApiError;
use crate::state::SharedState;

const MAX_AUTHOR_BYTES: usize = 100;
const MAX_BODY_BYTES: usize = 5000;

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub body: String,
    /// Honeypot; hidden from people, filled in by bots.
    #[serde(default)]
    pub url: String,
}

pub async fn create(
    State(state): State<SharedState>, Path(slug): Path<String>, ClientIp(ip): ClientIp,
    form: Result<Form<CommentForm>, FormRejection>,
) -> Result<Redirect, ApiError> {
    if state.cache.read().find_public_post(&slug).is_none() {
        return Err(ApiError::NotFound);
    }
    let Form(form) = form.map_err(form_error)?;
    let back = format!("/posts/{slug}#comments");

    if !form.url.is_empty() {
        tracing::info!(slug = %slug, "honeypot filled, comment dropped");
        return Ok(Redirect::to(&back));
    }

    let author = form.author.trim();
    let body = form.body.trim();
    if author.is_empty() || author.len() > MAX_AUTHOR_BYTES {
        return Err(ApiError::BadRequest("author must be 1-100 characters"));
    }
    if body.is_empty() || body.len() > MAX_BODY_BYTES {
        return Err(ApiError::BadRequest("comment must be 1-5000 characters"));
    }

    if !state.comment_limiter.allow(&ip) {
        tracing::warn!(ip = %ip, "comment rate limit exceeded");
        return Err(ApiError::TooManyRequests);
    }

    let id = state.store.insert_comment(&slug, author, body).await?;
    tracing::info!(slug = %slug, id, "comment stored");
    Ok(Redirect::to(&back))
}
