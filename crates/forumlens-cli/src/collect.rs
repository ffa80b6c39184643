//! Collection command handler for the CLI.
//!
//! Called from `main` once config is loaded. Any community failure aborts the
//! run before the output file is written, so a partial file never replaces a
//! previous complete one.

use std::path::PathBuf;

use anyhow::Context;
use forumlens_collector::{ClientOptions, CollectSettings, RedditClient};
use forumlens_core::AppConfig;

/// Communities, limits and output path for one collect run, after command-line
/// overrides have been applied to the config.
#[derive(Debug, Clone)]
pub(crate) struct CollectPlan {
    pub communities: Vec<String>,
    pub settings: CollectSettings,
    pub output: PathBuf,
}

impl CollectPlan {
    pub(crate) fn resolve(
        config: &AppConfig,
        communities: Vec<String>,
        limit: Option<usize>,
        output: Option<PathBuf>,
    ) -> Self {
        let communities = if communities.is_empty() {
            config.communities.clone()
        } else {
            communities
        };

        let mut settings = CollectSettings::from_app_config(config);
        if let Some(limit) = limit {
            settings.submissions_limit = limit;
        }

        Self {
            communities,
            settings,
            output: output.unwrap_or_else(|| config.raw_output_path.clone()),
        }
    }
}

/// Search every planned community, expand comment trees and write the rows
/// to the plan's output file.
///
/// When `dry_run` is `true` the plan is printed and no request is made.
///
/// # Errors
///
/// Returns an error if credentials are missing, authentication fails, any
/// community fetch fails, or the output file cannot be written.
pub(crate) async fn run_collect(
    config: &AppConfig,
    plan: &CollectPlan,
    dry_run: bool,
) -> anyhow::Result<()> {
    if dry_run {
        println!(
            "dry-run: would collect up to {} submissions matching \"{}\" from {} communities: [{}] into {}",
            plan.settings.submissions_limit,
            plan.settings.search_query,
            plan.communities.len(),
            plan.communities.join(", "),
            plan.output.display()
        );
        return Ok(());
    }

    anyhow::ensure!(
        !plan.communities.is_empty(),
        "no communities to collect; set FORUMLENS_COMMUNITIES or pass --community"
    );

    let credentials = forumlens_core::load_reddit_credentials()?;
    let client = RedditClient::connect(&credentials, ClientOptions::from_app_config(config))
        .await
        .context("failed to authenticate with the forum API")?;

    let (rows, tallies) =
        forumlens_collector::collect_all(&client, &plan.communities, &plan.settings).await?;

    let written = forumlens_collector::write_raw_comments(&plan.output, &rows)
        .with_context(|| format!("failed to write {}", plan.output.display()))?;

    let skipped: usize = tallies.iter().map(|t| t.submissions_skipped).sum();
    tracing::info!(
        communities = tallies.len(),
        submissions_skipped = skipped,
        rows = written,
        output = %plan.output.display(),
        "collection complete"
    );
    println!("Saved {written} comments to {}", plan.output.display());

    Ok(())
}
