//! Load-once memoization of datasets keyed on their file path.
//!
//! Entries are never invalidated; the enriched file is treated as immutable
//! for the lifetime of the process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;

use crate::dataset::{load_dataset, Dataset};
use crate::error::AnalyticsError;

type Slot = Arc<OnceCell<Arc<Dataset>>>;

#[derive(Debug, Default)]
pub struct DatasetCache {
    slots: Mutex<HashMap<PathBuf, Slot>>,
}

impl DatasetCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the dataset at `path`, reading it from disk on first use.
    ///
    /// Concurrent first callers share one load. A failed load is not cached,
    /// so a later call retries.
    ///
    /// # Errors
    ///
    /// Propagates [`load_dataset`] errors.
    pub async fn get_or_load(&self, path: &Path) -> Result<Arc<Dataset>, AnalyticsError> {
        let slot = self.slot(path);
        let dataset = slot
            .get_or_try_init(|| async {
                let owned = path.to_path_buf();
                tokio::task::spawn_blocking(move || load_dataset(&owned))
                    .await
                    .map_err(|e| AnalyticsError::Task(e.to_string()))?
                    .map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(dataset))
    }

    /// The cached dataset for `path`, if it has been loaded.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<Arc<Dataset>> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(path).and_then(|slot| slot.get().cloned())
    }

    fn slot(&self, path: &Path) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(path.to_path_buf()).or_default())
    }
}
