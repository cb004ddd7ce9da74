use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::{
    backend::{Query, RecordStore, USER_CLASS, pointer},
    errors::AppError,
    models::{AuthorSnapshot, NewReview, ReviewRecord, Score, Session},
};

pub const REVIEW_CLASS: &str = "GameRating";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRef {
    object_id: String,
    name: Option<String>,
    avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameRatingRow {
    object_id: String,
    game_id: String,
    #[serde(default)]
    game_name: Option<String>,
    rating: i64,
    #[serde(default)]
    comment: Option<String>,
    user: UserRef,
    created_at: DateTime<Utc>,
}

impl TryFrom<GameRatingRow> for ReviewRecord {
    type Error = AppError;

    fn try_from(row: GameRatingRow) -> Result<Self, Self::Error> {
        Ok(ReviewRecord {
            id: row.object_id,
            game_id: row.game_id,
            game_name: row.game_name.unwrap_or_default(),
            score: Score::new(row.rating)?,
            comment: row
                .comment
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            author: AuthorSnapshot {
                id: row.user.object_id,
                display_name: row.user.name,
                avatar: row.user.avatar,
            },
            created_at: row.created_at,
        })
    }
}

fn decode(value: Value) -> Result<ReviewRecord, AppError> {
    let row: GameRatingRow = serde_json::from_value(value)
        .map_err(|e| AppError::Deserialization(format!("Invalid review record: {}", e)))?;
    row.try_into()
}

/// Decodes a result set, skipping records that no longer satisfy the model.
fn decode_all(values: Vec<Value>) -> Vec<ReviewRecord> {
    values
        .into_iter()
        .filter_map(|value| match decode(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping unreadable review: {}", e);
                None
            }
        })
        .collect()
}

/// Create, list and delete reviews. Every call goes to the store; nothing is cached.
#[derive(Clone)]
pub struct ReviewRepository {
    store: Arc<dyn RecordStore>,
}

impl ReviewRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        session: &Session,
        review: NewReview,
    ) -> Result<ReviewRecord, AppError> {
        // re-validate in case the caller built the struct by hand
        let review = NewReview::new(
            &review.game_id,
            &review.game_name,
            review.score.value() as i64,
            review.comment.as_deref(),
        )?;

        let mut fields = Map::new();
        fields.insert("gameId".into(), json!(review.game_id));
        fields.insert("gameName".into(), json!(review.game_name));
        fields.insert("rating".into(), json!(review.score.value()));
        fields.insert(
            "comment".into(),
            json!(review.comment.clone().unwrap_or_default()),
        );
        fields.insert("user".into(), pointer(USER_CLASS, &session.account.id));

        let saved = self
            .store
            .create(REVIEW_CLASS, fields, Some(session))
            .await
            .map_err(AppError::into_persistence)?;

        let id = saved
            .get("objectId")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::Persistence("Store returned no objectId".into()))?
            .to_string();
        let created_at = saved
            .get("createdAt")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| AppError::Persistence("Store returned no createdAt".into()))?;

        tracing::info!(
            "Review {} created for game {} by {}",
            id,
            review.game_id,
            session.account.id
        );

        Ok(ReviewRecord {
            id,
            game_id: review.game_id,
            game_name: review.game_name,
            score: review.score,
            comment: review.comment,
            author: AuthorSnapshot {
                id: session.account.id.clone(),
                display_name: session.account.display_name.clone(),
                avatar: session.account.avatar.clone(),
            },
            created_at,
        })
    }

    /// Newest first, with the author resolved.
    pub async fn list_by_game(&self, game_id: &str) -> Result<Vec<ReviewRecord>, AppError> {
        let query = Query::new(REVIEW_CLASS)
            .equal_to("gameId", json!(game_id))
            .include("user")
            .descending("createdAt");

        let values = self
            .store
            .find(&query)
            .await
            .map_err(AppError::into_persistence)?;

        Ok(decode_all(values))
    }

    /// Newest first.
    pub async fn list_by_author(&self, account_id: &str) -> Result<Vec<ReviewRecord>, AppError> {
        let query = Query::new(REVIEW_CLASS)
            .equal_to("user", pointer(USER_CLASS, account_id))
            .include("user")
            .descending("createdAt");

        let values = self
            .store
            .find(&query)
            .await
            .map_err(AppError::into_persistence)?;

        Ok(decode_all(values))
    }

    /// Deletes one of the session owner's reviews. A missing id is reported,
    /// not silently accepted.
    pub async fn delete_by_id(&self, session: &Session, id: &str) -> Result<(), AppError> {
        let existing = self
            .store
            .get(REVIEW_CLASS, id, &[])
            .await
            .map_err(AppError::into_persistence)?;

        let author_id = existing
            .get("user")
            .and_then(|user| user.get("objectId"))
            .and_then(Value::as_str);

        if author_id != Some(session.account.id.as_str()) {
            return Err(AppError::Unauthorized(
                "You can only delete your own reviews".into(),
            ));
        }

        self.store
            .delete(REVIEW_CLASS, id, Some(session))
            .await
            .map_err(AppError::into_persistence)?;

        tracing::info!("Review {} deleted by {}", id, session.account.id);
        Ok(())
    }
}
