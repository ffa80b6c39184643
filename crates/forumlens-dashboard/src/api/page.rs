use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use forumlens_analytics::summarize;

use crate::page::{render_dashboard, render_error, DashboardView};

use super::analytics::FilterQuery;
use super::AppState;

/// `GET /`: recompute the summary for the query-string filters and render
/// the whole page.
pub(super) async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Response {
    let filter = match query.to_filter() {
        Ok(filter) => filter,
        Err(e) => {
            tracing::debug!(error = %e, "rejected dashboard filter");
            return (
                StatusCode::BAD_REQUEST,
                Html(render_error(&e.to_string()).into_string()),
            )
                .into_response();
        }
    };

    let dataset = &state.dataset;
    let summary = summarize(dataset, &filter);
    let view = DashboardView {
        options: dataset.options(),
        community: filter.community.as_str(),
        sentiment: filter.effective_sentiment(dataset.options()),
        min_enthusiasm: filter.min_enthusiasm,
        summary: &summary,
    };

    Html(render_dashboard(&view).into_string()).into_response()
}
