//! Reddit API client (client-credentials OAuth).

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use forumlens_core::RedditCredentials;
use reqwest::header::RETRY_AFTER;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::CollectorError;
use crate::pipeline::CommentSource;
use crate::rate_limit::{retry_with_backoff, RateLimiter};
use crate::types::{ClientOptions, Comment, Submission};

use super::reddit_helpers::{
    flatten_things, to_submission, Listing, MoreChildrenResponse, MoreStub, Thing,
};

/// Largest page the search endpoint serves.
const SEARCH_PAGE_MAX: usize = 100;
/// Most ids `/api/morechildren` accepts per call.
const MORE_CHILDREN_BATCH: usize = 100;
const COMMENT_PAGE_LIMIT: &str = "500";

/// Reddit OAuth token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

/// Reddit API client holding a valid access token.
///
/// Every API call waits on the shared [`RateLimiter`] and retries transient
/// failures (429, network errors) with exponential backoff.
pub struct RedditClient {
    client: reqwest::Client,
    token: String,
    api_base: String,
    limiter: RateLimiter,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl RedditClient {
    /// Build a client and exchange the client credentials for a token.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::Http`] if the HTTP client cannot be built and
    /// [`CollectorError::Auth`] if the token exchange is rejected.
    pub async fn connect(
        credentials: &RedditCredentials,
        options: ClientOptions,
    ) -> Result<Self, CollectorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(credentials.user_agent.as_str())
            .build()?;
        let limiter = RateLimiter::per_minute(options.requests_per_minute);

        let token = retry_with_backoff(options.max_retries, options.retry_backoff_base_secs, || {
            Self::fetch_token(&client, &limiter, &options.auth_url, credentials)
        })
        .await?;

        tracing::debug!(api_base = %options.api_base, "obtained forum API token");

        Ok(Self {
            client,
            token,
            api_base: options.api_base.trim_end_matches('/').to_string(),
            limiter,
            max_retries: options.max_retries,
            backoff_base_secs: options.retry_backoff_base_secs,
        })
    }

    async fn fetch_token(
        client: &reqwest::Client,
        limiter: &RateLimiter,
        auth_url: &str,
        credentials: &RedditCredentials,
    ) -> Result<String, CollectorError> {
        limiter.acquire().await;
        let response = client
            .post(auth_url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CollectorError::RateLimited {
                retry_after_secs: retry_after_secs(&response),
            });
        }
        if !status.is_success() {
            return Err(CollectorError::Auth(format!(
                "token endpoint returned status {status}"
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| CollectorError::Auth(format!("token parse error: {e}")))?;

        match (body.access_token, body.error) {
            (Some(token), _) if !token.is_empty() => Ok(token),
            (_, Some(error)) => Err(CollectorError::Auth(error)),
            _ => Err(CollectorError::Auth(
                "token response carried no access_token".to_string(),
            )),
        }
    }

    /// Top-ranked submissions in `community` matching `query`, at most `limit`.
    ///
    /// Follows the `after` cursor until the limit is reached or the listing
    /// runs out.
    ///
    /// # Errors
    ///
    /// Propagates any API error once retries are exhausted.
    pub async fn search_community(
        &self,
        community: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Submission>, CollectorError> {
        let path = format!("/r/{community}/search");
        let mut submissions = Vec::new();
        let mut after: Option<String> = None;

        while submissions.len() < limit {
            let page_size = (limit - submissions.len()).min(SEARCH_PAGE_MAX);
            let mut params: Vec<(&str, String)> = vec![
                ("q", query.to_string()),
                ("restrict_sr", "true".to_string()),
                ("sort", "top".to_string()),
                ("t", "all".to_string()),
                ("type", "link".to_string()),
                ("limit", page_size.to_string()),
                ("raw_json", "1".to_string()),
            ];
            if let Some(cursor) = &after {
                params.push(("after", cursor.clone()));
            }

            let listing: Listing = self.get_json(&path, &params, "search listing").await?;
            let page: Vec<Submission> = listing
                .data
                .children
                .iter()
                .filter_map(to_submission)
                .collect();
            if page.is_empty() {
                break;
            }
            submissions.extend(page);

            after = listing.data.after;
            if after.is_none() {
                break;
            }
        }

        submissions.truncate(limit);
        tracing::debug!(
            community,
            submissions = submissions.len(),
            "fetched search results"
        );
        Ok(submissions)
    }

    /// Every comment under `submission`, with all collapsed branches expanded.
    ///
    /// # Errors
    ///
    /// Propagates any API error once retries are exhausted.
    pub async fn fetch_comments(
        &self,
        submission: &Submission,
    ) -> Result<Vec<Comment>, CollectorError> {
        let roots = self.fetch_thread(&submission.id, None).await?;
        let (mut comments, stubs) = flatten_things(roots);

        let mut seen: HashSet<String> = comments.iter().map(|c| c.id.clone()).collect();
        let mut requested: HashSet<String> = HashSet::new();
        let mut expanded_parents: HashSet<String> = HashSet::new();
        let mut pending: VecDeque<MoreStub> = stubs.into();

        while let Some(stub) = pending.pop_front() {
            let fetched = if stub.children.is_empty() {
                // "continue this thread": re-fetch the subtree under the parent.
                let Some(parent) = stub.parent_id.strip_prefix("t1_") else {
                    continue;
                };
                if !expanded_parents.insert(parent.to_string()) {
                    continue;
                }
                self.fetch_thread(&submission.id, Some(parent)).await?
            } else {
                let ids: Vec<String> = stub
                    .children
                    .iter()
                    .filter(|id| requested.insert((*id).clone()))
                    .cloned()
                    .collect();
                let mut things = Vec::new();
                for batch in ids.chunks(MORE_CHILDREN_BATCH) {
                    things.extend(self.fetch_more_children(submission, batch).await?);
                }
                things
            };

            let (found, more) = flatten_things(fetched);
            comments.extend(found.into_iter().filter(|c| seen.insert(c.id.clone())));
            pending.extend(more);
        }

        tracing::debug!(
            submission = %submission.id,
            comments = comments.len(),
            "expanded comment tree"
        );
        Ok(comments)
    }

    /// Comment forest for a submission, optionally rooted at one comment.
    async fn fetch_thread(
        &self,
        submission_id: &str,
        root_comment: Option<&str>,
    ) -> Result<Vec<Thing>, CollectorError> {
        let path = format!("/comments/{submission_id}");
        let mut params: Vec<(&str, String)> = vec![
            ("limit", COMMENT_PAGE_LIMIT.to_string()),
            ("raw_json", "1".to_string()),
        ];
        if let Some(comment) = root_comment {
            params.push(("comment", comment.to_string()));
        }

        let listings: Vec<Listing> = self.get_json(&path, &params, "comment thread").await?;
        // [0] is the submission itself, [1] the comment forest.
        Ok(listings
            .into_iter()
            .nth(1)
            .map(|listing| listing.data.children)
            .unwrap_or_default())
    }

    async fn fetch_more_children(
        &self,
        submission: &Submission,
        ids: &[String],
    ) -> Result<Vec<Thing>, CollectorError> {
        let params: Vec<(&str, String)> = vec![
            ("api_type", "json".to_string()),
            ("link_id", submission.fullname()),
            ("children", ids.join(",")),
            ("limit_children", "false".to_string()),
            ("raw_json", "1".to_string()),
        ];

        let response: MoreChildrenResponse = self
            .get_json("/api/morechildren", &params, "morechildren")
            .await?;
        if !response.json.errors.is_empty() {
            return Err(CollectorError::Api(format!(
                "morechildren rejected: {}",
                serde_json::Value::Array(response.json.errors)
            )));
        }
        Ok(response.json.data.map(|d| d.things).unwrap_or_default())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        context: &str,
    ) -> Result<T, CollectorError> {
        let url = format!("{}{path}", self.api_base);

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                self.limiter.acquire().await;
                let response = self
                    .client
                    .get(&url)
                    .bearer_auth(&self.token)
                    .query(params)
                    .send()
                    .await?;
                self.observe_budget(&response).await;

                let status = response.status();
                if status == StatusCode::TOO_MANY_REQUESTS {
                    return Err(CollectorError::RateLimited {
                        retry_after_secs: retry_after_secs(&response),
                    });
                }
                if !status.is_success() {
                    return Err(CollectorError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                let body = response.text().await?;
                serde_json::from_str::<T>(&body).map_err(|source| CollectorError::Deserialize {
                    context: context.to_string(),
                    source,
                })
            }
        })
        .await
    }

    async fn observe_budget(&self, response: &Response) {
        let header = |name: &str| -> Option<f64> {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<f64>().ok())
        };
        self.limiter
            .observe(header("x-ratelimit-remaining"), header("x-ratelimit-reset"))
            .await;
    }
}

impl CommentSource for RedditClient {
    async fn search_submissions(
        &self,
        community: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Submission>, CollectorError> {
        self.search_community(community, query, limit).await
    }

    async fn expand_comments(
        &self,
        submission: &Submission,
    ) -> Result<Vec<Comment>, CollectorError> {
        self.fetch_comments(submission).await
    }
}

fn retry_after_secs(response: &Response) -> u64 {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(60)
}
