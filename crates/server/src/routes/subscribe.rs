//! Email subscription: sign-up, verification and removal.

use std::sync::LazyLock;

use axum::Json;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Query, State};
use quire_core::store::Subscription;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{ClientIp, form_error};
use crate::error::ApiError;
use crate::notify;
use crate::state::SharedState;

const MAX_EMAIL_LEN: usize = 254;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"));

#[derive(Debug, Deserialize)]
pub struct SubscribeForm {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenParams {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub status: &'static str,
    pub message: &'static str,
}

fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LEN && EMAIL.is_match(email)
}

/// The response is the same for new and known addresses.
pub async fn subscribe(
    State(state): State<SharedState>, ClientIp(ip): ClientIp, form: Result<Form<SubscribeForm>, FormRejection>,
) -> Result<Json<Ack>, ApiError> {
    let Form(form) = form.map_err(form_error)?;
    let email = form.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ApiError::BadRequest("invalid email address"));
    }

    if !state.subscribe_limiter.allow(&format!("sub:{ip}")) {
        tracing::warn!(ip = %ip, "subscribe rate limit exceeded");
        return Err(ApiError::TooManyRequests);
    }

    let subscription = state.store.subscribe(&email).await?;
    if let Subscription::Created { verify_token } = subscription {
        if state.notifier.is_configured() {
            if let Err(err) = notify::send_verification(state.notifier.as_ref(), &state.mail, &email, &verify_token).await {
                tracing::warn!(error = %err, "verification mail failed");
            }
        }
    }

    Ok(Json(Ack { status: "ok", message: "check your inbox to confirm the subscription" }))
}

pub async fn verify(State(state): State<SharedState>, Query(params): Query<TokenParams>) -> Result<Json<Ack>, ApiError> {
    state.store.verify_subscriber(&params.token).await?;
    Ok(Json(Ack { status: "ok", message: "subscription confirmed" }))
}

pub async fn remove(State(state): State<SharedState>, Query(params): Query<TokenParams>) -> Result<Json<Ack>, ApiError> {
    state.store.unsubscribe(&params.token).await?;
    Ok(Json(Ack { status: "ok", message: "unsubscribed" }))
}
