//! Immutable dataset snapshot shared by every request.
//!
//! A [`DatasetContext`] is built once at startup and never mutated. The
//! server holds it in a [`SharedContext`], which hands out cheap `Arc`
//! snapshots and lets an explicit reload publish a replacement without
//! disturbing requests that are still reading the previous one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use zan_dashboard_commune_models::{Dataset, Perimeter};

use crate::loader::load_all;
use crate::registry::{PerimeterDefinition, all_definitions};

/// The datasets of every perimeter, loaded together.
#[derive(Debug)]
pub struct DatasetContext {
    datasets: BTreeMap<Perimeter, Dataset>,
    definitions: Vec<PerimeterDefinition>,
    data_dir: PathBuf,
    load_error: Option<String>,
    loaded_at: DateTime<Utc>,
}

impl DatasetContext {
    /// Loads every registered perimeter from `data_dir`.
    ///
    /// Loading is all-or-nothing: if any export fails, the error is logged
    /// and the context holds no dataset, so every request reports the data
    /// as unavailable instead of serving a partial comparison.
    #[must_use]
    pub fn load(data_dir: &Path) -> Self {
        let definitions = all_definitions();

        let (datasets, load_error) = match load_all(&definitions, data_dir) {
            Ok(loaded) => (loaded.into_iter().collect(), None),
            Err(e) => {
                log::error!("Failed to load datasets from {}: {e}", data_dir.display());
                (BTreeMap::new(), Some(e.to_string()))
            }
        };

        Self {
            datasets,
            definitions,
            data_dir: data_dir.to_path_buf(),
            load_error,
            loaded_at: Utc::now(),
        }
    }

    /// Builds a context from datasets already in memory.
    #[must_use]
    pub fn from_datasets(datasets: impl IntoIterator<Item = Dataset>) -> Self {
        Self {
            datasets: datasets.into_iter().map(|d| (d.perimeter, d)).collect(),
            definitions: all_definitions(),
            data_dir: PathBuf::new(),
            load_error: None,
            loaded_at: Utc::now(),
        }
    }

    /// The dataset of `perimeter`, if it loaded.
    #[must_use]
    pub fn dataset(&self, perimeter: Perimeter) -> Option<&Dataset> {
        self.datasets.get(&perimeter)
    }

    /// Perimeters whose dataset is available.
    #[must_use]
    pub fn loaded_perimeters(&self) -> Vec<Perimeter> {
        self.datasets.keys().copied().collect()
    }

    /// The definition of `perimeter`.
    #[must_use]
    pub fn definition(&self, perimeter: Perimeter) -> Option<&PerimeterDefinition> {
        self.definitions.iter().find(|d| d.id == perimeter)
    }

    /// Directory the datasets were read from.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Why loading failed, if it did.
    #[must_use]
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// When this snapshot was built.
    #[must_use]
    pub const fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

/// Publishes the current [`DatasetContext`] to concurrent readers.
#[derive(Debug)]
pub struct SharedContext {
    current: RwLock<Arc<DatasetContext>>,
}

impl SharedContext {
    /// Wraps an initial context.
    #[must_use]
    pub fn new(context: DatasetContext) -> Self {
        Self {
            current: RwLock::new(Arc::new(context)),
        }
    }

    /// The context to use for one request.
    #[must_use]
    pub fn snapshot(&self) -> Arc<DatasetContext> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*current)
    }

    /// Replaces the current context and returns the previous one.
    pub fn publish(&self, context: DatasetContext) -> Arc<DatasetContext> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, Arc::new(context))
    }
}

#[cfg(test)]
mod tests {
    use zan_dashboard_commune_models::{ColumnSet, CommuneRecord};

    use super::*;

    fn dataset(perimeter: Perimeter, communes: usize) -> Dataset {
        let records = (0..communes)
            .map(|i| CommuneRecord::new(format!("{perimeter}-{i}"), "26"))
            .collect();
        Dataset::new(perimeter, perimeter.to_string(), ColumnSet::complete(), records)
    }

    #[test]
    fn missing_data_dir_leaves_every_perimeter_unavailable() {
        let context = DatasetContext::load(Path::new("/nonexistent/zan-dashboard"));
        assert!(context.loaded_perimeters().is_empty());
        assert!(context.dataset(Perimeter::Scot).is_none());
        assert!(context.dataset(Perimeter::Cc).is_none());
        assert!(context.load_error().is_some());
    }

    #[test]
    fn in_memory_context_exposes_datasets() {
        let context = DatasetContext::from_datasets([dataset(Perimeter::Cc, 2)]);
        assert_eq!(context.loaded_perimeters(), vec![Perimeter::Cc]);
        assert_eq!(context.dataset(Perimeter::Cc).map(Dataset::len), Some(2));
        assert!(context.dataset(Perimeter::Scot).is_none());
        assert!(context.definition(Perimeter::Scot).is_some());
        assert!(context.load_error().is_none());
    }

    #[test]
    fn publish_swaps_without_touching_existing_snapshots() {
        let shared = SharedContext::new(DatasetContext::from_datasets([dataset(
            Perimeter::Scot,
            1,
        )]));
        let before = shared.snapshot();

        let previous = shared.publish(DatasetContext::from_datasets([
            dataset(Perimeter::Scot, 3),
            dataset(Perimeter::Cc, 1),
        ]));

        assert!(Arc::ptr_eq(&before, &previous));
        assert_eq!(before.dataset(Perimeter::Scot).map(Dataset::len), Some(1));
        let after = shared.snapshot();
        assert_eq!(after.dataset(Perimeter::Scot).map(Dataset::len), Some(3));
        assert_eq!(after.loaded_perimeters().len(), 2);
    }
}
