use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{catalog::load_game_detail, models::GameDetail, state::AppState};

pub async fn get_game_handler(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<GameDetail>, (StatusCode, String)> {
    let detail = load_game_detail(state.catalog.as_ref(), &game_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load game {}: {}", game_id, e);
            e.to_response()
        })?;

    Ok(Json(detail))
}
