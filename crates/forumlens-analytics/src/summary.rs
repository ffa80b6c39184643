//! Aggregates recomputed for every filter change.

use std::collections::{BTreeSet, HashMap};

use forumlens_core::{EnrichedComment, Mentions};
use serde::Serialize;

use crate::dataset::Dataset;
use crate::filter::Filter;

/// Length of both top-N rankings.
pub const TOP_N: usize = 10;
/// Rows shown in the preview table.
pub const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentionCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunityEnthusiasm {
    pub community: String,
    pub mean_enthusiasm: f64,
    pub comments: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewRow {
    pub cleaned: String,
    pub enthusiasm: Option<f64>,
    pub mentions: Mentions,
    pub dedupe_score: Option<f64>,
    pub subreddit: String,
}

/// Everything the dashboard shows for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub row_count: usize,
    pub community_count: usize,
    /// Rounded to two decimals; `None` for an empty selection.
    pub mean_enthusiasm: Option<f64>,
    pub total_mentions: usize,
    pub top_mentions: Vec<MentionCount>,
    pub top_communities: Vec<CommunityEnthusiasm>,
    pub preview: Vec<PreviewRow>,
}

impl Summary {
    #[must_use]
    pub fn from_rows(rows: &[&EnrichedComment]) -> Self {
        let communities: BTreeSet<&str> = rows.iter().map(|r| r.subreddit.as_str()).collect();

        Self {
            row_count: rows.len(),
            community_count: communities.len(),
            mean_enthusiasm: mean(rows.iter().filter_map(|r| r.enthusiasm)).map(round2),
            total_mentions: rows.iter().map(|r| r.mentions.total()).sum(),
            top_mentions: top_mentions(rows),
            top_communities: top_communities(rows),
            preview: rows
                .iter()
                .take(PREVIEW_ROWS)
                .map(|r| PreviewRow {
                    cleaned: r.cleaned.clone(),
                    enthusiasm: r.enthusiasm,
                    mentions: r.mentions.clone(),
                    dedupe_score: r.dedupe_score,
                    subreddit: r.subreddit.clone(),
                })
                .collect(),
        }
    }
}

/// Apply `filter` to `dataset` and aggregate the surviving rows.
#[must_use]
pub fn summarize(dataset: &Dataset, filter: &Filter) -> Summary {
    Summary::from_rows(&filter.apply(dataset))
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Half-way cases go to the even hundredth.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Most frequent individual mentions across brands and products.
///
/// Ties keep the order in which the names were first seen.
fn top_mentions(rows: &[&EnrichedComment]) -> Vec<MentionCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<MentionCount> = Vec::new();

    for name in rows.iter().flat_map(|r| r.mentions.iter()) {
        match index.get(name) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(name, counts.len());
                counts.push(MentionCount {
                    name: name.to_string(),
                    count: 1,
                });
            }
        }
    }

    // Stable sort keeps first-appearance order within equal counts.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(TOP_N);
    counts
}

/// Communities ranked by mean enthusiasm, ties broken by name.
fn top_communities(rows: &[&EnrichedComment]) -> Vec<CommunityEnthusiasm> {
    let mut groups: HashMap<&str, (f64, usize)> = HashMap::new();
    for row in rows {
        if let Some(e) = row.enthusiasm {
            let entry = groups.entry(row.subreddit.as_str()).or_default();
            entry.0 += e;
            entry.1 += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let mut ranked: Vec<CommunityEnthusiasm> = groups
        .into_iter()
        .map(|(community, (sum, count))| CommunityEnthusiasm {
            community: community.to_string(),
            mean_enthusiasm: sum / count as f64,
            comments: count,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.mean_enthusiasm
            .total_cmp(&a.mean_enthusiasm)
            .then_with(|| a.community.cmp(&b.community))
    });
    ranked.truncate(TOP_N);
    ranked
}

#[cfg(test)]
#[path = "summary_test.rs"]
mod tests;
