mod collect;
mod report;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "forumlens-cli")]
#[command(about = "Collect forum comments and report on the enriched dataset")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect comments from every configured community into a Parquet file
    Collect {
        /// Community to collect (repeatable); defaults to the configured list
        #[arg(long = "community")]
        communities: Vec<String>,

        /// Maximum submissions to fetch per community
        #[arg(long)]
        limit: Option<usize>,

        /// Output file; defaults to `FORUMLENS_RAW_OUTPUT_PATH`
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the collection plan without contacting the API
        #[arg(long)]
        dry_run: bool,
    },
    /// Print a markdown summary of the enriched dataset
    Report {
        /// Enriched file; defaults to `FORUMLENS_ENRICHED_PATH`
        #[arg(long)]
        input: Option<PathBuf>,

        /// Restrict to one community ("All" for no restriction)
        #[arg(long)]
        community: Option<String>,

        /// Sentiment label; defaults to the first label in sorted order
        #[arg(long)]
        sentiment: Option<String>,

        /// Inclusive lower bound on enthusiasm, between 0 and 1
        #[arg(long, default_value_t = 0.0)]
        min_enthusiasm: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("forumlens-cli: run with --help to list commands");
        return Ok(());
    };

    let config = forumlens_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Collect {
            communities,
            limit,
            output,
            dry_run,
        } => {
            let plan = collect::CollectPlan::resolve(&config, communities, limit, output);
            collect::run_collect(&config, &plan, dry_run).await?;
        }
        Commands::Report {
            input,
            community,
            sentiment,
            min_enthusiasm,
        } => {
            let input = input.unwrap_or_else(|| config.enriched_path.clone());
            report::run_report(&input, community.as_deref(), sentiment, min_enthusiasm)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
