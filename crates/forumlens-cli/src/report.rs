//! Markdown report over the enriched dataset.

use std::path::Path;

use anyhow::Context;
use forumlens_analytics::{summarize, CommunityFilter, Filter, Summary};

/// Load `input`, apply the filters and print the summary as markdown.
///
/// # Errors
///
/// Returns an error if the threshold is out of range or the dataset cannot be
/// loaded.
pub(crate) fn run_report(
    input: &Path,
    community: Option<&str>,
    sentiment: Option<String>,
    min_enthusiasm: f64,
) -> anyhow::Result<()> {
    let filter = Filter::new(CommunityFilter::parse(community), sentiment, min_enthusiasm)?;
    let dataset = forumlens_analytics::load_dataset(input)
        .with_context(|| format!("failed to load {}", input.display()))?;

    let summary = summarize(&dataset, &filter);
    let sentiment = filter.effective_sentiment(dataset.options()).unwrap_or("-");
    let generated = chrono::Utc::now().format("%Y-%m-%d %H:%M UTC").to_string();

    print!("{}", render_markdown(&summary, &filter, sentiment, &generated));
    Ok(())
}

/// Render `summary` as a markdown document, one line per entry.
pub(crate) fn render_markdown(
    summary: &Summary,
    filter: &Filter,
    sentiment: &str,
    generated: &str,
) -> String {
    let mean = summary
        .mean_enthusiasm
        .map_or_else(|| "n/a".to_string(), |m| format!("{m:.2}"));

    let mut lines = vec![
        "# Comment Analysis Report".to_string(),
        String::new(),
        format!("**Generated**: {generated}"),
        format!(
            "**Filter**: community {} | sentiment {sentiment} | min enthusiasm {:.2}",
            filter.community.as_str(),
            filter.min_enthusiasm
        ),
        String::new(),
        "---".to_string(),
        String::new(),
        format!(
            "Loaded {} comments from {} communities",
            summary.row_count, summary.community_count
        ),
        String::new(),
        "| Comments | Avg Enthusiasm | Mentions |".to_string(),
        "|----------|----------------|----------|".to_string(),
        format!(
            "| {} | {mean} | {} |",
            summary.row_count, summary.total_mentions
        ),
        String::new(),
        "## Top Mentions".to_string(),
        String::new(),
    ];

    if summary.top_mentions.is_empty() {
        lines.push("_none_".to_string());
    } else {
        lines.push("| Mention | Count |".to_string());
        lines.push("|---------|-------|".to_string());
        lines.extend(
            summary
                .top_mentions
                .iter()
                .map(|m| format!("| {} | {} |", cell(&m.name), m.count)),
        );
    }

    lines.push(String::new());
    lines.push("## Enthusiasm by Community".to_string());
    lines.push(String::new());
    if summary.top_communities.is_empty() {
        lines.push("_none_".to_string());
    } else {
        lines.push("| Community | Mean Enthusiasm | Comments |".to_string());
        lines.push("|-----------|-----------------|----------|".to_string());
        lines.extend(summary.top_communities.iter().map(|c| {
            format!(
                "| {} | {:.2} | {} |",
                cell(&c.community),
                c.mean_enthusiasm,
                c.comments
            )
        }));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Keep a value on one table row.
fn cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}
