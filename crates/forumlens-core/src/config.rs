use crate::app_config::{AppConfig, Environment, RedditCredentials, DEFAULT_COMMUNITIES};
use crate::ConfigError;

const DEFAULT_SEARCH_QUERY: &str = "best OR recommendation OR favorites";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Load the forum API credentials, reading `.env` first.
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnvVar`] naming the first absent credential.
pub fn load_reddit_credentials() -> Result<RedditCredentials, ConfigError> {
    dotenvy::dotenv().ok();
    load_reddit_credentials_from_env()
}

/// Load the forum API credentials from the current process environment.
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnvVar`] naming the first absent credential.
pub fn load_reddit_credentials_from_env() -> Result<RedditCredentials, ConfigError> {
    build_reddit_credentials(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("FORUMLENS_ENV", "development"))?;

    let bind_addr = or_default("FORUMLENS_BIND_ADDR", "127.0.0.1:8501")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("FORUMLENS_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("FORUMLENS_LOG_LEVEL", "info");

    let communities = match lookup("FORUMLENS_COMMUNITIES") {
        Ok(raw) => parse_communities(&raw)?,
        Err(_) => DEFAULT_COMMUNITIES.iter().map(|s| (*s).to_string()).collect(),
    };
    let search_query = or_default("FORUMLENS_SEARCH_QUERY", DEFAULT_SEARCH_QUERY);
    let submissions_limit = parse_usize("FORUMLENS_SUBMISSIONS_LIMIT", "30")?;
    let min_comments = parse_u64("FORUMLENS_MIN_COMMENTS", "5")?;

    let raw_output_path = PathBuf::from(or_default(
        "FORUMLENS_RAW_OUTPUT_PATH",
        "raw_reddit_comments.parquet",
    ));
    let enriched_path = PathBuf::from(or_default(
        "FORUMLENS_ENRICHED_PATH",
        "deduped_analysis.parquet",
    ));

    let request_timeout_secs = parse_u64("FORUMLENS_REQUEST_TIMEOUT_SECS", "30")?;
    let requests_per_minute = parse_u32("FORUMLENS_REQUESTS_PER_MINUTE", "60")?;
    if requests_per_minute == 0 {
        return Err(invalid(
            "FORUMLENS_REQUESTS_PER_MINUTE",
            "must be at least 1".to_string(),
        ));
    }
    let max_retries = parse_u32("FORUMLENS_MAX_RETRIES", "3")?;
    let retry_backoff_base_secs = parse_u64("FORUMLENS_RETRY_BACKOFF_BASE_SECS", "2")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        communities,
        search_query,
        submissions_limit,
        min_comments,
        raw_output_path,
        enriched_path,
        request_timeout_secs,
        requests_per_minute,
        max_retries,
        retry_backoff_base_secs,
    })
}

fn build_reddit_credentials<F>(lookup: F) -> Result<RedditCredentials, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    Ok(RedditCredentials {
        client_id: require("REDDIT_CLIENT_ID")?,
        client_secret: require("REDDIT_CLIENT_SECRET")?,
        user_agent: require("REDDIT_USER_AGENT")?,
    })
}

/// Split a comma-separated community list, dropping blanks.
fn parse_communities(raw: &str) -> Result<Vec<String>, ConfigError> {
    let communities: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    if communities.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "FORUMLENS_COMMUNITIES".to_string(),
            reason: "no community names given".to_string(),
        });
    }
    Ok(communities)
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "FORUMLENS_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
