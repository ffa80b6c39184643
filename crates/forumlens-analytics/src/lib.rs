//! Read-side analytics over the enriched comment dataset.
//!
//! [`load_dataset`] reads `deduped_analysis.parquet` once, [`Filter`] selects
//! rows and [`Summary`] aggregates them for display.

pub mod cache;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod summary;

pub use cache::DatasetCache;
pub use dataset::{load_dataset, rows_from_batch, Dataset, REQUIRED_COLUMNS};
pub use error::AnalyticsError;
pub use filter::{CommunityFilter, Filter, FilterOptions, ALL_COMMUNITIES};
pub use summary::{
    summarize, CommunityEnthusiasm, MentionCount, PreviewRow, Summary, PREVIEW_ROWS, TOP_N,
};
