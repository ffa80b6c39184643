//! Collection orchestration.
//!
//! Walks communities in order, searches each for top submissions, expands
//! the qualifying ones and turns their comments into [`RawComment`] rows.
//! Nothing is persisted here; the caller writes the accumulated rows once
//! every community has succeeded.

use std::future::Future;

use chrono::{DateTime, SecondsFormat, Utc};
use forumlens_core::{RawComment, DELETED_AUTHOR};

use crate::error::CollectorError;
use crate::types::{CollectSettings, Comment, Submission};

const PERMALINK_HOST: &str = "https://reddit.com";

/// Where submissions and their comments come from.
pub trait CommentSource {
    /// Top-ranked submissions in `community` matching `query`, at most `limit`.
    fn search_submissions(
        &self,
        community: &str,
        query: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Submission>, CollectorError>>;

    /// All comments of `submission`, fully expanded and flattened.
    fn expand_comments(
        &self,
        submission: &Submission,
    ) -> impl Future<Output = Result<Vec<Comment>, CollectorError>>;
}

/// Per-community tally for logging and reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommunityTally {
    pub community: String,
    pub submissions_seen: usize,
    pub submissions_skipped: usize,
    pub comments_kept: usize,
}

/// Collect rows from every community in order.
///
/// # Errors
///
/// The first source error aborts the whole run; rows gathered so far are
/// dropped.
pub async fn collect_all<S: CommentSource>(
    source: &S,
    communities: &[String],
    settings: &CollectSettings,
) -> Result<(Vec<RawComment>, Vec<CommunityTally>), CollectorError> {
    let mut rows = Vec::new();
    let mut tallies = Vec::with_capacity(communities.len());

    for community in communities {
        tracing::info!(community = %community, "fetching community");
        let (community_rows, tally) = collect_community(source, community, settings).await?;
        tracing::info!(
            community = %community,
            submissions = tally.submissions_seen,
            skipped = tally.submissions_skipped,
            comments = tally.comments_kept,
            "community collected"
        );
        rows.extend(community_rows);
        tallies.push(tally);
    }

    Ok((rows, tallies))
}

/// Collect rows from one community.
///
/// # Errors
///
/// Propagates search and expansion failures unchanged.
pub async fn collect_community<S: CommentSource>(
    source: &S,
    community: &str,
    settings: &CollectSettings,
) -> Result<(Vec<RawComment>, CommunityTally), CollectorError> {
    let submissions = source
        .search_submissions(community, &settings.search_query, settings.submissions_limit)
        .await?;

    let mut tally = CommunityTally {
        community: community.to_string(),
        submissions_seen: submissions.len(),
        ..CommunityTally::default()
    };
    let mut rows = Vec::new();

    for submission in &submissions {
        if submission.num_comments < settings.min_comments {
            tracing::debug!(
                community,
                submission = %submission.id,
                num_comments = submission.num_comments,
                "skipping low-signal submission"
            );
            tally.submissions_skipped += 1;
            continue;
        }

        let comments = source.expand_comments(submission).await?;
        let records = records_from_submission(community, submission, &comments);
        tally.comments_kept += records.len();
        rows.extend(records);
    }

    Ok((rows, tally))
}

/// Turn one submission's flattened comments into rows, dropping comments
/// whose author was removed.
#[must_use]
pub fn records_from_submission(
    community: &str,
    submission: &Submission,
    comments: &[Comment],
) -> Vec<RawComment> {
    let submission_url = format!("{PERMALINK_HOST}{}", submission.permalink);

    comments
        .iter()
        .filter_map(|comment| {
            let author = comment
                .author
                .as_deref()
                .filter(|a| *a != DELETED_AUTHOR)?;
            Some(RawComment {
                submission_id: submission.id.clone(),
                submission_title: submission.title.clone(),
                submission_url: submission_url.clone(),
                subreddit: community.to_string(),
                comment_id: comment.id.clone(),
                comment_body: comment.body.clone(),
                author: author.to_string(),
                created_utc: format_created_utc(comment.created_utc),
                score: comment.score,
                permalink: format!("{PERMALINK_HOST}{}", comment.permalink),
            })
        })
        .collect()
}

/// Epoch seconds as ISO-8601 with an explicit `+00:00` offset.
#[must_use]
pub fn format_created_utc(epoch_secs: f64) -> String {
    #[allow(clippy::cast_possible_truncation)]
    let secs = epoch_secs.floor() as i64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let nanos = ((epoch_secs - epoch_secs.floor()) * 1e9) as u32;
    DateTime::<Utc>::from_timestamp(secs, nanos)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::AutoSi, false)
}
