use serde::Serialize;

use crate::models::ReviewRecord;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    /// Mean score, `0.0` when there are no reviews.
    pub average_score: f64,
    pub total_count: usize,
    pub commented_count: usize,
}

impl ReviewStats {
    pub fn from_reviews(reviews: &[ReviewRecord]) -> Self {
        let total_count = reviews.len();
        let commented_count = reviews
            .iter()
            .filter(|r| r.comment.as_deref().is_some_and(|c| !c.trim().is_empty()))
            .count();

        let average_score = if total_count == 0 {
            0.0
        } else {
            let sum: u32 = reviews.iter().map(|r| r.score.value() as u32).sum();
            sum as f64 / total_count as f64
        };

        Self {
            average_score,
            total_count,
            commented_count,
        }
    }

    /// Whole stars for the read-only rating widget.
    pub fn rounded_stars(&self) -> u8 {
        self.average_score.round().clamp(0.0, 5.0) as u8
    }

    pub fn display_average(&self) -> String {
        format!("{:.1}", self.average_score)
    }
}
