//! Comment collection for forumlens.
//!
//! Searches each configured community for top submissions, expands their
//! comment trees through the Reddit API and writes the flattened rows to a
//! single Parquet file.

pub mod error;
pub mod output;
pub mod pipeline;
pub mod rate_limit;
pub mod types;

mod sources;

pub use error::CollectorError;
pub use output::{raw_comment_schema, write_raw_comments};
pub use pipeline::{
    collect_all, collect_community, records_from_submission, CommentSource, CommunityTally,
};
pub use rate_limit::RateLimiter;
pub use sources::RedditClient;
pub use types::{ClientOptions, CollectSettings, Comment, Submission};
