use serde::{Deserialize, Serialize};

use crate::mentions::Mentions;

/// Author name the forum API reports for removed accounts.
pub const DELETED_AUTHOR: &str = "[deleted]";

/// One collected comment, flattened out of its submission's reply tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawComment {
    pub submission_id: String,
    pub submission_title: String,
    pub submission_url: String,
    pub subreddit: String,
    pub comment_id: String,
    pub comment_body: String,
    pub author: String,
    /// ISO-8601 timestamp with a `+00:00` offset.
    pub created_utc: String,
    pub score: i64,
    pub permalink: String,
}

/// A comment after the external dedup/annotation step.
///
/// Raw fields are optional because the dashboard only needs the annotated
/// ones and the upstream file may drop some raw columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedComment {
    pub subreddit: String,
    pub cleaned: String,
    pub enthusiasm: Option<f64>,
    pub sentiment_label: String,
    pub dedupe_score: Option<f64>,
    pub mentions: Mentions,
    pub submission_id: Option<String>,
    pub submission_title: Option<String>,
    pub submission_url: Option<String>,
    pub comment_id: Option<String>,
    pub comment_body: Option<String>,
    pub author: Option<String>,
    pub created_utc: Option<String>,
    pub score: Option<i64>,
    pub permalink: Option<String>,
}

impl EnrichedComment {
    /// Build a row carrying only the annotated fields. Handy for fixtures.
    #[must_use]
    pub fn annotated(
        subreddit: impl Into<String>,
        cleaned: impl Into<String>,
        enthusiasm: Option<f64>,
        sentiment_label: impl Into<String>,
        mentions: Mentions,
    ) -> Self {
        Self {
            subreddit: subreddit.into(),
            cleaned: cleaned.into(),
            enthusiasm,
            sentiment_label: sentiment_label.into(),
            dedupe_score: None,
            mentions,
            submission_id: None,
            submission_title: None,
            submission_url: None,
            comment_id: None,
            comment_body: None,
            author: None,
            created_utc: None,
            score: None,
            permalink: None,
        }
    }
}
