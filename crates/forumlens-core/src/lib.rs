//! Shared types and configuration for forumlens.
//!
//! The collector produces [`RawComment`] rows; an external enrichment step
//! turns them into [`EnrichedComment`] rows that the dashboard reads.

pub mod app_config;
pub mod comments;
pub mod config;
pub mod mentions;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, RedditCredentials, DEFAULT_COMMUNITIES};
pub use comments::{EnrichedComment, RawComment, DELETED_AUTHOR};
pub use config::{
    load_app_config, load_app_config_from_env, load_reddit_credentials,
    load_reddit_credentials_from_env,
};
pub use mentions::Mentions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
