use axum::{
    extract::{Query, State},
    Extension, Json,
};
use forumlens_analytics::{
    summarize, AnalyticsError, CommunityFilter, Filter, FilterOptions, Summary,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_analytics_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// Query string shared by the page and the summary endpoint.
///
/// `min_enthusiasm` is kept as text so a malformed number is reported in the
/// API error envelope instead of an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct FilterQuery {
    pub community: Option<String>,
    pub sentiment: Option<String>,
    pub min_enthusiasm: Option<String>,
}

impl FilterQuery {
    pub(crate) fn to_filter(&self) -> Result<Filter, AnalyticsError> {
        let min_enthusiasm = match self.min_enthusiasm.as_deref().map(str::trim) {
            None | Some("") => 0.0,
            Some(raw) => raw.parse::<f64>().map_err(|_| {
                AnalyticsError::InvalidFilter(format!("min_enthusiasm is not a number: {raw}"))
            })?,
        };
        Filter::new(
            CommunityFilter::parse(self.community.as_deref()),
            self.sentiment.clone(),
            min_enthusiasm,
        )
    }
}

/// The filter actually applied, after defaults are resolved.
#[derive(Debug, Serialize)]
pub(crate) struct AppliedFilter {
    pub community: String,
    pub sentiment: Option<String>,
    pub min_enthusiasm: f64,
}

impl AppliedFilter {
    pub(crate) fn resolve(filter: &Filter, options: &FilterOptions) -> Self {
        Self {
            community: filter.community.as_str().to_string(),
            sentiment: filter.effective_sentiment(options).map(ToOwned::to_owned),
            min_enthusiasm: filter.min_enthusiasm,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SummaryData {
    pub filter: AppliedFilter,
    pub summary: Summary,
}

pub(super) async fn list_filters(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<FilterOptions>> {
    Json(ApiResponse {
        data: state.dataset.options().clone(),
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn get_summary(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<ApiResponse<SummaryData>>, ApiError> {
    let filter = query
        .to_filter()
        .map_err(|e| map_analytics_error(req_id.0.clone(), &e))?;

    let summary = summarize(&state.dataset, &filter);
    tracing::debug!(
        community = filter.community.as_str(),
        rows = summary.row_count,
        "summary computed"
    );

    Ok(Json(ApiResponse {
        data: SummaryData {
            filter: AppliedFilter::resolve(&filter, state.dataset.options()),
            summary,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
