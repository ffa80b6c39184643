use forumlens_core::AppConfig;

pub const DEFAULT_AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
pub const DEFAULT_API_BASE: &str = "https://oauth.reddit.com";

/// A top-level post returned by a community search.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// Short id without the `t3_` prefix.
    pub id: String,
    pub title: String,
    pub permalink: String,
    pub num_comments: u64,
}

impl Submission {
    /// Fullname (`t3_<id>`) used by the comment expansion endpoint.
    #[must_use]
    pub fn fullname(&self) -> String {
        format!("t3_{}", self.id)
    }
}

/// One comment from a flattened reply tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: String,
    pub body: String,
    /// `None` when the API omits the author entirely.
    pub author: Option<String>,
    pub score: i64,
    /// Creation time in epoch seconds.
    pub created_utc: f64,
    pub permalink: String,
}

/// What to collect from each community.
#[derive(Debug, Clone)]
pub struct CollectSettings {
    pub search_query: String,
    pub submissions_limit: usize,
    /// Submissions with fewer comments than this are skipped.
    pub min_comments: u64,
}

impl CollectSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            search_query: config.search_query.clone(),
            submissions_limit: config.submissions_limit,
            min_comments: config.min_comments,
        }
    }
}

/// Transport settings for [`crate::RedditClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub auth_url: String,
    pub api_base: String,
    pub timeout_secs: u64,
    pub requests_per_minute: u32,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: 30,
            requests_per_minute: 60,
            max_retries: 3,
            retry_backoff_base_secs: 2,
        }
    }
}

impl ClientOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.request_timeout_secs,
            requests_per_minute: config.requests_per_minute,
            max_retries: config.max_retries,
            retry_backoff_base_secs: config.retry_backoff_base_secs,
            ..Self::default()
        }
    }
}
