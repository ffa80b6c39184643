//! Server-rendered dashboard page.
//!
//! Charts are plain horizontal bars drawn with CSS widths, so the page needs
//! no client-side script.

use forumlens_analytics::{CommunityEnthusiasm, FilterOptions, MentionCount, PreviewRow, Summary};
use maud::{html, Markup, PreEscaped, DOCTYPE};

pub const TITLE: &str = "Reddit Comments Analysis Dashboard";

const STYLES: &str = r"
body { font-family: system-ui, sans-serif; margin: 0; color: #1f2933; }
.layout { display: flex; min-height: 100vh; }
.sidebar { width: 18rem; padding: 1.5rem; background: #f0f2f6; }
.sidebar label { display: block; margin-top: 1rem; font-weight: 600; }
.sidebar select, .sidebar input { width: 100%; margin-top: 0.25rem; }
.sidebar button { margin-top: 1.5rem; }
.info { margin-top: 1.5rem; padding: 0.75rem; background: #e1effe; border-radius: 0.25rem; }
main { flex: 1; padding: 1.5rem 2.5rem; }
.metrics { display: flex; gap: 2rem; margin: 1rem 0 2rem; }
.metric-label { font-size: 0.875rem; color: #52606d; }
.metric-value { font-size: 2rem; }
.chart-row { display: flex; align-items: center; margin: 0.25rem 0; }
.chart-label { width: 12rem; text-align: right; padding-right: 0.5rem; overflow: hidden; }
.chart-bar { background: #636efa; height: 1.25rem; }
.chart-value { padding-left: 0.5rem; font-size: 0.875rem; }
.empty { color: #7b8794; font-style: italic; }
table { border-collapse: collapse; width: 100%; }
th, td { border-bottom: 1px solid #e4e7eb; padding: 0.4rem; text-align: left; vertical-align: top; }
.error { padding: 1rem; background: #fde8e8; border-radius: 0.25rem; }
";

/// Everything needed to render one pass of the dashboard.
#[derive(Debug)]
pub struct DashboardView<'a> {
    pub options: &'a FilterOptions,
    pub community: &'a str,
    pub sentiment: Option<&'a str>,
    pub min_enthusiasm: f64,
    pub summary: &'a Summary,
}

/// One bar of a horizontal bar chart.
#[derive(Debug, Clone, PartialEq)]
struct Bar {
    label: String,
    value: f64,
    display: String,
}

/// Mean enthusiasm as shown to users; an empty selection has no mean.
#[must_use]
pub fn format_mean(mean: Option<f64>) -> String {
    mean.map_or_else(|| "n/a".to_string(), |m| format!("{m:.2}"))
}

#[must_use]
pub fn render_dashboard(view: &DashboardView<'_>) -> Markup {
    let summary = view.summary;
    layout(html! {
        div.layout {
            aside.sidebar {
                (filter_form(view))
                div.info {
                    "Loaded " (summary.row_count) " comments from "
                    (summary.community_count) " communities"
                }
            }
            main {
                h1 { (TITLE) }
                div.metrics {
                    (metric("Comments", &summary.row_count.to_string()))
                    (metric("Avg Enthusiasm", &format_mean(summary.mean_enthusiasm)))
                    (metric("Unique Mentions", &summary.total_mentions.to_string()))
                }
                section {
                    h2 { "Top Mentions" }
                    (bar_chart(&mention_bars(&summary.top_mentions)))
                }
                section {
                    h2 { "Enthusiasm by Subreddit" }
                    (bar_chart(&community_bars(&summary.top_communities)))
                }
                section {
                    h2 { "Sample Comments" }
                    (preview_table(&summary.preview))
                }
            }
        }
    })
}

/// Page shown when the query string cannot be turned into a filter.
#[must_use]
pub fn render_error(message: &str) -> Markup {
    layout(html! {
        main {
            h1 { (TITLE) }
            div.error {
                p { (message) }
                a href="/" { "Reset filters" }
            }
        }
    })
}

fn layout(content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (TITLE) }
                style { (PreEscaped(STYLES)) }
            }
            body { (content) }
        }
    }
}

fn filter_form(view: &DashboardView<'_>) -> Markup {
    let threshold = format!("{:.2}", view.min_enthusiasm);
    html! {
        form method="get" action="/" {
            h2 { "Filters" }
            label for="community" { "Subreddit" }
            select #community name="community" {
                @for community in &view.options.communities {
                    option value=(community) selected[community == view.community] { (community) }
                }
            }
            label for="sentiment" { "Sentiment" }
            select #sentiment name="sentiment" {
                @for label in &view.options.sentiments {
                    @let chosen = Some(label.as_str()) == view.sentiment;
                    option value=(label) selected[chosen] { (label) }
                }
            }
            label for="min_enthusiasm" { "Min Enthusiasm: " output { (threshold) } }
            input #min_enthusiasm type="range" name="min_enthusiasm" min="0" max="1" step="0.01"
                value=(threshold);
            button type="submit" { "Apply" }
        }
    }
}

fn metric(label: &str, value: &str) -> Markup {
    html! {
        div.metric {
            div.metric-label { (label) }
            div.metric-value { (value) }
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn mention_bars(mentions: &[MentionCount]) -> Vec<Bar> {
    mentions
        .iter()
        .map(|m| Bar {
            label: m.name.clone(),
            value: m.count as f64,
            display: m.count.to_string(),
        })
        .collect()
}

fn community_bars(communities: &[CommunityEnthusiasm]) -> Vec<Bar> {
    communities
        .iter()
        .map(|c| Bar {
            label: c.community.clone(),
            value: c.mean_enthusiasm,
            display: format!("{:.2}", c.mean_enthusiasm),
        })
        .collect()
}

fn bar_chart(bars: &[Bar]) -> Markup {
    let max = bars.iter().map(|b| b.value).fold(0.0_f64, f64::max);
    html! {
        @if bars.is_empty() {
            p.empty { "No data for the current filters." }
        } @else {
            div.chart {
                @for bar in bars {
                    @let width = if max > 0.0 { bar.value / max * 100.0 } else { 0.0 };
                    div.chart-row {
                        div.chart-label title=(bar.label) { (bar.label) }
                        div.chart-bar style=(format!("width: {width:.1}%")) {}
                        span.chart-value { (bar.display) }
                    }
                }
            }
        }
    }
}

fn preview_table(rows: &[PreviewRow]) -> Markup {
    let optional = |v: Option<f64>| v.map_or_else(String::new, |v| format!("{v:.2}"));
    html! {
        @if rows.is_empty() {
            p.empty { "No comments match the current filters." }
        } @else {
            table {
                thead {
                    tr {
                        th { "cleaned" }
                        th { "enthusiasm" }
                        th { "mentions" }
                        th { "dedupe_score" }
                        th { "subreddit" }
                    }
                }
                tbody {
                    @for row in rows {
                        tr {
                            td { (row.cleaned) }
                            td { (optional(row.enthusiasm)) }
                            td { (row.mentions.to_string()) }
                            td { (optional(row.dedupe_score)) }
                            td { (row.subreddit) }
                        }
                    }
                }
            }
        }
    }
}
