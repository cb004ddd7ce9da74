use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    auth::AuthSession,
    http::handlers::auth::SessionResponse,
    models::Account,
    profile::AvatarChange,
    reviews::ReviewStats,
    state::AppState,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub account: Account,
    pub avatar: String,
    pub stats: ReviewStats,
}

#[derive(Deserialize)]
pub struct UpdateAvatarPayload {
    pub avatar: String,
}

#[derive(Deserialize)]
pub struct UpdateEmailPayload {
    pub email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordPayload {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

pub async fn get_profile_handler(
    State(state): State<AppState>,
    AuthSession(ctx): AuthSession,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    let session = ctx.require().map_err(|e| e.to_response())?;
    let reviews = state
        .reviews
        .list_by_author(&session.account.id)
        .await
        .map_err(|e| {
            tracing::error!("Error loading profile of {}: {}", session.account.id, e);
            e.to_response()
        })?;

    Ok(Json(ProfileResponse {
        avatar: session.account.avatar_or_default().to_string(),
        account: session.account,
        stats: ReviewStats::from_reviews(&reviews),
    }))
}

pub async fn update_avatar_handler(
    State(state): State<AppState>,
    AuthSession(ctx): AuthSession,
    Json(payload): Json<UpdateAvatarPayload>,
) -> Result<Json<AvatarChange>, (StatusCode, String)> {
    let session = ctx.require().map_err(|e| e.to_response())?;
    let mut change = AvatarChange::new(session.account.avatar_or_default());

    state
        .profiles
        .change_avatar(&ctx, &mut change, &payload.avatar)
        .await
        .map_err(|e| e.to_response())?;

    Ok(Json(change))
}

pub async fn update_email_handler(
    State(state): State<AppState>,
    AuthSession(ctx): AuthSession,
    Json(payload): Json<UpdateEmailPayload>,
) -> Result<Json<Account>, (StatusCode, String)> {
    state
        .profiles
        .update_email(&ctx, &payload.email)
        .await
        .map_err(|e| e.to_response())?;

    let session = ctx.require().map_err(|e| e.to_response())?;
    Ok(Json(session.account))
}

/// Answers with the re-authenticated session, which the client must keep.
pub async fn update_password_handler(
    State(state): State<AppState>,
    AuthSession(ctx): AuthSession,
    Json(payload): Json<UpdatePasswordPayload>,
) -> Result<Json<SessionResponse>, (StatusCode, String)> {
    state
        .profiles
        .update_password(
            &ctx,
            &payload.current_password,
            &payload.new_password,
            &payload.confirm_password,
        )
        .await
        .map_err(|e| e.to_response())?;

    let session = ctx.require().map_err(|e| e.to_response())?;
    Ok(Json(session.into()))
}
