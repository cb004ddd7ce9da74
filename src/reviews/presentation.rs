use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    models::{ReviewRecord, account::DEFAULT_AVATAR},
    reviews::aggregate::ReviewStats,
};

pub const DEFAULT_DISPLAY_NAME: &str = "User";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: String,
    pub game_id: String,
    pub game_name: String,
    pub score: u8,
    pub comment: Option<String>,
    pub display_name: String,
    pub avatar: String,
    pub has_comment: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&ReviewRecord> for ReviewView {
    fn from(record: &ReviewRecord) -> Self {
        let display_name = record
            .author
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_DISPLAY_NAME);

        let avatar = record
            .author
            .avatar
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or(DEFAULT_AVATAR);

        Self {
            id: record.id.clone(),
            game_id: record.game_id.clone(),
            game_name: record.game_name.clone(),
            score: record.score.value(),
            comment: record.comment.clone(),
            display_name: display_name.to_string(),
            avatar: avatar.to_string(),
            has_comment: record
                .comment
                .as_deref()
                .is_some_and(|c| !c.trim().is_empty()),
            created_at: record.created_at,
        }
    }
}

/// A list of reviews ready for display, with its summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListing {
    pub stats: ReviewStats,
    pub rounded_stars: u8,
    pub display_average: String,
    pub reviews: Vec<ReviewView>,
}

impl ReviewListing {
    pub fn new(records: &[ReviewRecord]) -> Self {
        let stats = ReviewStats::from_reviews(records);
        Self {
            stats,
            rounded_stars: stats.rounded_stars(),
            display_average: stats.display_average(),
            reviews: records.iter().map(ReviewView::from).collect(),
        }
    }
}
