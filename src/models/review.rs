use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub const MAX_COMMENT_CHARS: usize = 500;

/// Star rating in the closed range 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, AppError> {
        if value == 0 {
            return Err(AppError::Validation("Please select a rating".into()));
        }
        if !(Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            return Err(AppError::Validation(format!(
                "Rating must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )));
        }
        Ok(Self(value as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

/// The author reference of a review. Name and avatar are only known when the
/// pointer was resolved at query time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSnapshot {
    pub id: String,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub id: String,
    pub game_id: String,
    pub game_name: String,
    pub score: Score,
    pub comment: Option<String>,
    pub author: AuthorSnapshot,
    pub created_at: DateTime<Utc>,
}

/// A validated review that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub game_id: String,
    pub game_name: String,
    pub score: Score,
    pub comment: Option<String>,
}

impl NewReview {
    pub fn new(
        game_id: &str,
        game_name: &str,
        score: i64,
        comment: Option<&str>,
    ) -> Result<Self, AppError> {
        let game_id = game_id.trim();
        if game_id.is_empty() {
            return Err(AppError::Validation("Game id is required".into()));
        }

        let score = Score::new(score)?;
        let comment = normalize_comment(comment)?;

        Ok(Self {
            game_id: game_id.to_string(),
            game_name: game_name.trim().to_string(),
            score,
            comment,
        })
    }
}

/// Trims the comment, drops it when blank and enforces the length cap.
pub fn normalize_comment(comment: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(comment) = comment.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };

    let len = comment.chars().count();
    if len > MAX_COMMENT_CHARS {
        return Err(AppError::Validation(format!(
            "Comment must be at most {MAX_COMMENT_CHARS} characters, got {len}"
        )));
    }

    Ok(Some(comment.to_string()))
}
