use std::net::SocketAddr;
use std::path::PathBuf;

/// Communities walked by the collector when `FORUMLENS_COMMUNITIES` is unset.
pub const DEFAULT_COMMUNITIES: &[&str] = &[
    "BuyItForLife",
    "ProductReviews",
    "headphones",
    "MechanicalKeyboards",
    "CampingandHiking",
    "SkincareAddiction",
    "frugalmalefashion",
    "frugal",
    "gadgets",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub communities: Vec<String>,
    pub search_query: String,
    pub submissions_limit: usize,
    pub min_comments: u64,
    pub raw_output_path: PathBuf,
    pub enriched_path: PathBuf,
    pub request_timeout_secs: u64,
    pub requests_per_minute: u32,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
}

/// OAuth client credentials for the forum API.
#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl std::fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &"[redacted]")
            .field("client_secret", &"[redacted]")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
