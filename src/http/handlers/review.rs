use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    auth::AuthSession, errors::AppError, models::NewReview, reviews::ReviewListing,
    state::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewPayload {
    #[serde(default)]
    pub game_name: String,
    pub score: i64,
    pub comment: Option<String>,
}

pub async fn get_game_reviews_handler(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<ReviewListing>, (StatusCode, String)> {
    let reviews = state.reviews.list_by_game(&game_id).await.map_err(|e| {
        tracing::error!("Error loading reviews for game {}: {}", game_id, e);
        e.to_response()
    })?;

    Ok(Json(ReviewListing::new(&reviews)))
}

pub async fn create_review_handler(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    AuthSession(ctx): AuthSession,
    Json(payload): Json<CreateReviewPayload>,
) -> Result<(StatusCode, Json<ReviewListing>), (StatusCode, String)> {
    let review = NewReview::new(
        &game_id,
        &payload.game_name,
        payload.score,
        payload.comment.as_deref(),
    )
    .map_err(|e| e.to_response())?;

    let session = ctx.require().map_err(|e| e.to_response())?;
    state
        .reviews
        .create(&session, review)
        .await
        .map_err(|e| {
            tracing::error!("Error creating review for game {}: {}", game_id, e);
            e.to_response()
        })?;

    let reviews = state
        .reviews
        .list_by_game(&game_id)
        .await
        .map_err(|e| e.to_response())?;

    Ok((StatusCode::CREATED, Json(ReviewListing::new(&reviews))))
}

pub async fn get_my_reviews_handler(
    State(state): State<AppState>,
    AuthSession(ctx): AuthSession,
) -> Result<Json<ReviewListing>, (StatusCode, String)> {
    let session = ctx.require().map_err(|e| e.to_response())?;
    let reviews = state
        .reviews
        .list_by_author(&session.account.id)
        .await
        .map_err(|e| {
            tracing::error!("Error loading reviews of {}: {}", session.account.id, e);
            e.to_response()
        })?;

    Ok(Json(ReviewListing::new(&reviews)))
}

pub async fn delete_review_handler(
    State(state): State<AppState>,
    Path(review_id): Path<String>,
    AuthSession(ctx): AuthSession,
) -> Result<Json<ReviewListing>, (StatusCode, String)> {
    let session = ctx.require().map_err(|e| e.to_response())?;

    if let Err(e) = state.reviews.delete_by_id(&session, &review_id).await {
        match &e {
            AppError::NotFound(_) => tracing::warn!("Review {} not found", review_id),
            _ => tracing::error!("Error deleting review {}: {}", review_id, e),
        }
        return Err(e.to_response());
    }

    let reviews = state
        .reviews
        .list_by_author(&session.account.id)
        .await
        .map_err(|e| e.to_response())?;

    Ok(Json(ReviewListing::new(&reviews)))
}
