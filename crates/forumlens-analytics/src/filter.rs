//! Filter choices and row selection.

use std::collections::BTreeSet;

use forumlens_core::EnrichedComment;
use serde::Serialize;

use crate::dataset::Dataset;
use crate::error::AnalyticsError;

/// Wildcard community option.
pub const ALL_COMMUNITIES: &str = "All";

/// Choices offered by the filter controls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    /// `"All"` followed by the sorted distinct community names.
    pub communities: Vec<String>,
    /// Sorted distinct sentiment labels. There is no wildcard.
    pub sentiments: Vec<String>,
}

impl FilterOptions {
    #[must_use]
    pub fn from_rows(rows: &[EnrichedComment]) -> Self {
        // A blank name would parse back to the wildcard, so it is not offered.
        let communities: BTreeSet<&str> = rows
            .iter()
            .map(|r| r.subreddit.as_str())
            .filter(|name| !name.trim().is_empty())
            .collect();
        let sentiments: BTreeSet<&str> = rows.iter().map(|r| r.sentiment_label.as_str()).collect();

        Self {
            communities: std::iter::once(ALL_COMMUNITIES)
                .chain(communities)
                .map(ToOwned::to_owned)
                .collect(),
            sentiments: sentiments.into_iter().map(ToOwned::to_owned).collect(),
        }
    }

    /// Community names without the wildcard.
    #[must_use]
    pub fn community_names(&self) -> &[String] {
        self.communities.get(1..).unwrap_or_default()
    }

    /// Label used when the caller did not pick one.
    #[must_use]
    pub fn default_sentiment(&self) -> Option<&str> {
        self.sentiments.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CommunityFilter {
    #[default]
    All,
    Only(String),
}

impl CommunityFilter {
    /// Missing, empty and `"All"` all mean no community constraint.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::All,
            Some(v) if v == ALL_COMMUNITIES => Self::All,
            Some(v) => Self::Only(v.to_string()),
        }
    }

    #[must_use]
    pub fn matches(&self, community: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(name) => name == community,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL_COMMUNITIES,
            Self::Only(name) => name,
        }
    }
}

/// The three user-controlled filter inputs, applied as a conjunction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub community: CommunityFilter,
    /// `None` selects the first sorted label of the dataset.
    pub sentiment: Option<String>,
    /// Inclusive lower bound in `[0.0, 1.0]`.
    pub min_enthusiasm: f64,
}

impl Filter {
    /// Build a validated filter.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidFilter`] if `min_enthusiasm` is not a
    /// finite number in `[0.0, 1.0]`.
    pub fn new(
        community: CommunityFilter,
        sentiment: Option<String>,
        min_enthusiasm: f64,
    ) -> Result<Self, AnalyticsError> {
        if !min_enthusiasm.is_finite() || !(0.0..=1.0).contains(&min_enthusiasm) {
            return Err(AnalyticsError::InvalidFilter(format!(
                "min_enthusiasm must be between 0.0 and 1.0, got {min_enthusiasm}"
            )));
        }
        Ok(Self {
            community,
            sentiment: sentiment.filter(|s| !s.trim().is_empty()),
            min_enthusiasm,
        })
    }

    /// The sentiment label this filter selects against `options`.
    #[must_use]
    pub fn effective_sentiment<'a>(&'a self, options: &'a FilterOptions) -> Option<&'a str> {
        self.sentiment
            .as_deref()
            .or_else(|| options.default_sentiment())
    }

    /// Rows of `dataset` passing every constraint, in dataset order.
    #[must_use]
    pub fn apply<'a>(&self, dataset: &'a Dataset) -> Vec<&'a EnrichedComment> {
        let Some(sentiment) = self.effective_sentiment(dataset.options()) else {
            return Vec::new();
        };
        dataset
            .rows()
            .iter()
            .filter(|row| self.matches(row, sentiment))
            .collect()
    }

    fn matches(&self, row: &EnrichedComment, sentiment: &str) -> bool {
        self.community.matches(&row.subreddit)
            && row.sentiment_label == sentiment
            && row.enthusiasm.is_some_and(|e| e >= self.min_enthusiasm)
    }
}
