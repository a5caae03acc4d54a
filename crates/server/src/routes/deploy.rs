//! Signed deploy webhook: pull the content repository and reload.

use axum::body::{Body, to_bytes};
use axum::extract::State;
use axum::http::HeaderMap;

use crate::error::ApiError;
use crate::reload::Trigger;
use crate::state::SharedState;
use crate::webhook::{SIGNATURE_HEADER, verify_signature};

/// Answers as soon as the signature checks out; the reload runs in the background.
pub async fn deploy(State(state): State<SharedState>, headers: HeaderMap, body: Body) -> Result<&'static str, ApiError> {
    let Ok(secret) = state.config.require_webhook_secret() else {
        return Err(ApiError::Forbidden("deploy webhook disabled"));
    };

    let read = to_bytes(body, state.config.webhook_max_bytes);
    let body = tokio::time::timeout(state.config.webhook_read_timeout(), read)
        .await
        .map_err(|_| {
            tracing::warn!("deploy webhook rejected: body read timed out");
            ApiError::RequestTimeout
        })?
        .map_err(|_| ApiError::PayloadTooLarge)?;
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()).unwrap_or_default();
    if !verify_signature(secret, &body, signature) {
        tracing::warn!(bytes = body.len(), "deploy webhook rejected: bad signature");
        return Err(ApiError::Forbidden("invalid signature"));
    }

    tracing::info!("deploy webhook accepted, reloading");
    state.reloader.spawn(Trigger::Webhook);
    Ok("ok")
}
