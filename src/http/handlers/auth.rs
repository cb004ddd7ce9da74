use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    auth::AuthSession,
    models::{Account, Session},
    session::SessionContext,
    state::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpPayload {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub avatar: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_token: String,
    pub account: Account,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            session_token: session.token,
            account: session.account,
        }
    }
}

pub async fn sign_up_handler(
    State(state): State<AppState>,
    Json(payload): Json<SignUpPayload>,
) -> Result<(StatusCode, Json<SessionResponse>), (StatusCode, String)> {
    let ctx = SessionContext::absent();
    let session = state
        .accounts
        .sign_up(
            &ctx,
            &payload.name,
            &payload.email,
            &payload.password,
            &payload.confirm_password,
            payload.avatar.as_deref(),
        )
        .await
        .map_err(|e| {
            tracing::error!("Error signing up: {}", e);
            e.to_response()
        })?;

    Ok((StatusCode::CREATED, Json(session.into())))
}

pub async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<SessionResponse>, (StatusCode, String)> {
    let ctx = SessionContext::absent();
    let session = state
        .accounts
        .sign_in(&ctx, &payload.email, &payload.password)
        .await
        .map_err(|e| {
            tracing::warn!("Login failed for {}: {}", payload.email, e);
            e.to_response()
        })?;

    Ok(Json(session.into()))
}

pub async fn logout_handler(
    State(state): State<AppState>,
    AuthSession(ctx): AuthSession,
) -> Result<StatusCode, (StatusCode, String)> {
    state.accounts.sign_out(&ctx).await.map_err(|e| {
        tracing::error!("Error signing out: {}", e);
        e.to_response()
    })?;

    Ok(StatusCode::NO_CONTENT)
}
