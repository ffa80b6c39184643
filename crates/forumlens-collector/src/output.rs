//! Parquet output for collected comments.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow_array::{ArrayRef, Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use forumlens_core::RawComment;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;

use crate::error::CollectorError;

/// Arrow schema of the raw comment file, one column per [`RawComment`] field.
#[must_use]
pub fn raw_comment_schema() -> Schema {
    let utf8 = |name: &str| Field::new(name, DataType::Utf8, false);
    Schema::new(vec![
        utf8("submission_id"),
        utf8("submission_title"),
        utf8("submission_url"),
        utf8("subreddit"),
        utf8("comment_id"),
        utf8("comment_body"),
        utf8("author"),
        utf8("created_utc"),
        Field::new("score", DataType::Int64, false),
        utf8("permalink"),
    ])
}

/// Write all rows to a single Parquet file, creating the parent directory
/// when it does not exist. Returns the number of rows written.
///
/// # Errors
///
/// Returns [`CollectorError::Io`] for filesystem failures and
/// [`CollectorError::Arrow`]/[`CollectorError::Parquet`] for encoding failures.
pub fn write_raw_comments(path: &Path, rows: &[RawComment]) -> Result<usize, CollectorError> {
    let io_err = |source: std::io::Error| CollectorError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let batch = build_batch(rows)?;
    let file = File::create(path).map_err(io_err)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::default()))
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    tracing::debug!(path = %path.display(), rows = rows.len(), "wrote raw comment file");
    Ok(rows.len())
}

fn build_batch(rows: &[RawComment]) -> Result<RecordBatch, CollectorError> {
    let column = |get: fn(&RawComment) -> &str| -> ArrayRef {
        Arc::new(StringArray::from_iter_values(rows.iter().map(get)))
    };

    let columns: Vec<ArrayRef> = vec![
        column(|r| r.submission_id.as_str()),
        column(|r| r.submission_title.as_str()),
        column(|r| r.submission_url.as_str()),
        column(|r| r.subreddit.as_str()),
        column(|r| r.comment_id.as_str()),
        column(|r| r.comment_body.as_str()),
        column(|r| r.author.as_str()),
        column(|r| r.created_utc.as_str()),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.score))),
        column(|r| r.permalink.as_str()),
    ];

    Ok(RecordBatch::try_new(
        Arc::new(raw_comment_schema()),
        columns,
    )?)
}
