//! Loading the enriched comment file into memory.
//!
//! Columns are cast to a canonical type on the way in (strings to Utf8,
//! numbers to Float64/Int64) and `mentions` is coerced once per row, so the
//! rest of the crate works on plain [`EnrichedComment`] values.

use std::fs::File;
use std::path::{Path, PathBuf};

use arrow_array::cast::AsArray;
use arrow_array::types::{Float64Type, Int64Type};
use arrow_array::{Array, ArrayRef, RecordBatch, StructArray};
use arrow_cast::cast;
use arrow_schema::DataType;
use forumlens_core::{EnrichedComment, Mentions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::AnalyticsError;
use crate::filter::FilterOptions;

/// Columns the dashboard cannot work without.
pub const REQUIRED_COLUMNS: [&str; 4] = ["subreddit", "sentiment_label", "enthusiasm", "cleaned"];

/// The enriched dataset, immutable once loaded.
#[derive(Debug)]
pub struct Dataset {
    path: PathBuf,
    rows: Vec<EnrichedComment>,
    options: FilterOptions,
}

impl Dataset {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, rows: Vec<EnrichedComment>) -> Self {
        let options = FilterOptions::from_rows(&rows);
        Self {
            path: path.into(),
            rows,
            options,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn rows(&self) -> &[EnrichedComment] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Filter choices derived from the loaded rows.
    #[must_use]
    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Number of distinct communities in the whole dataset.
    #[must_use]
    pub fn community_count(&self) -> usize {
        self.options.community_names().len()
    }
}

/// Read every record batch of the enriched Parquet file at `path`.
///
/// # Errors
///
/// Returns [`AnalyticsError::Io`] if the file cannot be opened,
/// [`AnalyticsError::MissingColumn`] if a required column is absent and
/// [`AnalyticsError::ColumnType`] if a column cannot be cast to its
/// canonical type.
pub fn load_dataset(path: &Path) -> Result<Dataset, AnalyticsError> {
    let file = File::open(path).map_err(|source| AnalyticsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    for column in REQUIRED_COLUMNS {
        if builder.schema().column_with_name(column).is_none() {
            return Err(AnalyticsError::MissingColumn(column.to_string()));
        }
    }

    let mut rows = Vec::new();
    for batch in builder.build()? {
        rows.extend(rows_from_batch(&batch?)?);
    }

    tracing::info!(path = %path.display(), rows = rows.len(), "loaded enriched dataset");
    Ok(Dataset::new(path, rows))
}

/// Decode one record batch into rows.
///
/// # Errors
///
/// Same column errors as [`load_dataset`].
pub fn rows_from_batch(batch: &RecordBatch) -> Result<Vec<EnrichedComment>, AnalyticsError> {
    let n = batch.num_rows();

    let mut subreddit = required(batch, "subreddit", string_values)?.into_iter();
    let mut sentiment = required(batch, "sentiment_label", string_values)?.into_iter();
    let mut cleaned = required(batch, "cleaned", string_values)?.into_iter();
    let mut enthusiasm = required(batch, "enthusiasm", float_values)?.into_iter();
    let mut dedupe_score = optional(batch, "dedupe_score", float_values)?.into_iter();
    let mut mentions = mentions_column(batch.column_by_name("mentions"), n).into_iter();

    let mut submission_id = optional(batch, "submission_id", string_values)?.into_iter();
    let mut submission_title = optional(batch, "submission_title", string_values)?.into_iter();
    let mut submission_url = optional(batch, "submission_url", string_values)?.into_iter();
    let mut comment_id = optional(batch, "comment_id", string_values)?.into_iter();
    let mut comment_body = optional(batch, "comment_body", string_values)?.into_iter();
    let mut author = optional(batch, "author", string_values)?.into_iter();
    let mut created_utc = optional(batch, "created_utc", string_values)?.into_iter();
    let mut score = optional(batch, "score", int_values)?.into_iter();
    let mut permalink = optional(batch, "permalink", string_values)?.into_iter();

    let mut rows = Vec::with_capacity(n);
    for _ in 0..n {
        rows.push(EnrichedComment {
            subreddit: subreddit.next().flatten().unwrap_or_default(),
            cleaned: cleaned.next().flatten().unwrap_or_default(),
            enthusiasm: enthusiasm.next().flatten(),
            sentiment_label: sentiment.next().flatten().unwrap_or_default(),
            dedupe_score: dedupe_score.next().flatten(),
            mentions: mentions.next().unwrap_or_default(),
            submission_id: submission_id.next().flatten(),
            submission_title: submission_title.next().flatten(),
            submission_url: submission_url.next().flatten(),
            comment_id: comment_id.next().flatten(),
            comment_body: comment_body.next().flatten(),
            author: author.next().flatten(),
            created_utc: created_utc.next().flatten(),
            score: score.next().flatten(),
            permalink: permalink.next().flatten(),
        });
    }
    Ok(rows)
}

type Decode<T> = fn(&ArrayRef, &str) -> Result<Vec<Option<T>>, AnalyticsError>;

fn required<T>(
    batch: &RecordBatch,
    name: &str,
    decode: Decode<T>,
) -> Result<Vec<Option<T>>, AnalyticsError> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| AnalyticsError::MissingColumn(name.to_string()))?;
    decode(column, name)
}

/// Missing optional columns decode as all-null.
fn optional<T: Clone>(
    batch: &RecordBatch,
    name: &str,
    decode: Decode<T>,
) -> Result<Vec<Option<T>>, AnalyticsError> {
    match batch.column_by_name(name) {
        Some(column) => decode(column, name),
        None => Ok(vec![None; batch.num_rows()]),
    }
}

fn cast_column(column: &ArrayRef, name: &str, to: &DataType) -> Result<ArrayRef, AnalyticsError> {
    cast(column.as_ref(), to).map_err(|e| AnalyticsError::ColumnType {
        column: name.to_string(),
        reason: e.to_string(),
    })
}

fn string_values(column: &ArrayRef, name: &str) -> Result<Vec<Option<String>>, AnalyticsError> {
    let utf8 = cast_column(column, name, &DataType::Utf8)?;
    Ok(utf8
        .as_string::<i32>()
        .iter()
        .map(|v| v.map(ToOwned::to_owned))
        .collect())
}

fn float_values(column: &ArrayRef, name: &str) -> Result<Vec<Option<f64>>, AnalyticsError> {
    let floats = cast_column(column, name, &DataType::Float64)?;
    Ok(floats.as_primitive::<Float64Type>().iter().collect())
}

fn int_values(column: &ArrayRef, name: &str) -> Result<Vec<Option<i64>>, AnalyticsError> {
    let ints = cast_column(column, name, &DataType::Int64)?;
    Ok(ints.as_primitive::<Int64Type>().iter().collect())
}

/// Coerce the `mentions` column, whatever its physical shape, into one
/// [`Mentions`] per row.
///
/// Accepted shapes are a struct of `brands`/`products` lists and a
/// JSON-encoded string. Anything else yields empty mentions.
pub(crate) fn mentions_column(column: Option<&ArrayRef>, num_rows: usize) -> Vec<Mentions> {
    let empty = || vec![Mentions::default(); num_rows];
    let Some(column) = column else {
        return empty();
    };

    match column.data_type() {
        DataType::Struct(_) => mentions_from_struct(column.as_struct(), num_rows),
        data_type if is_text(data_type) => match cast(column.as_ref(), &DataType::Utf8) {
            Ok(strings) => strings
                .as_string::<i32>()
                .iter()
                .map(|v| v.map(Mentions::from_json_str).unwrap_or_default())
                .collect(),
            Err(_) => empty(),
        },
        other => {
            tracing::warn!(data_type = %other, "unsupported mentions column, using empty mentions");
            empty()
        }
    }
}

fn mentions_from_struct(array: &StructArray, num_rows: usize) -> Vec<Mentions> {
    let (Some(brands), Some(products)) = (
        array.column_by_name("brands"),
        array.column_by_name("products"),
    ) else {
        return vec![Mentions::default(); num_rows];
    };

    (0..num_rows)
        .map(|row| {
            if array.is_null(row) {
                return Mentions::default();
            }
            match (list_strings(brands, row), list_strings(products, row)) {
                (Some(b), Some(p)) => Mentions::new(b, p),
                _ => Mentions::default(),
            }
        })
        .collect()
}

/// String items of one list cell; `None` when the cell is null or not a list.
fn list_strings(array: &ArrayRef, row: usize) -> Option<Vec<String>> {
    if array.is_null(row) {
        return None;
    }
    let items = match array.data_type() {
        DataType::List(_) => array.as_list::<i32>().value(row),
        DataType::LargeList(_) => array.as_list::<i64>().value(row),
        _ => return None,
    };

    if !is_text(items.data_type()) {
        return Some(Vec::new());
    }
    let utf8 = cast(items.as_ref(), &DataType::Utf8).ok()?;
    Some(
        utf8.as_string::<i32>()
            .iter()
            .flatten()
            .map(ToOwned::to_owned)
            .collect(),
    )
}

fn is_text(data_type: &DataType) -> bool {
    match data_type {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => true,
        DataType::Dictionary(_, values) => is_text(values),
        _ => false,
    }
}

#[cfg(test)]
#[path = "dataset_test.rs"]
pub(crate) mod tests;
