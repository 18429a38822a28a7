//! Ordered dataset container and transform trait

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors raised when persisting or loading a dataset
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("dataset (de)serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// An ordered, indexable collection of work items.
///
/// Items keep their insertion order; the position of an item is its stable
/// index for the whole preparation and labeling pipeline.
#[derive(Debug, Clone, Default)]
pub struct Dataset<T> {
    items: Vec<T>,
}

impl<T> Dataset<T> {
    /// Creates an empty dataset
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Creates a dataset from existing items, preserving their order
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Applies a transform, producing a new dataset
    pub fn apply(self, transform: &dyn DatasetTransform<T>) -> Dataset<T> {
        transform.transform(self)
    }
}

impl<T> IntoIterator for Dataset<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Dataset<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Serialize> Dataset<T> {
    /// Saves the dataset as a pretty-printed JSON array
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DatasetError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.items)?;
        Ok(())
    }
}

impl<T: DeserializeOwned> Dataset<T> {
    /// Loads a dataset previously written by [`Dataset::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let file = File::open(path)?;
        let items: Vec<T> = serde_json::from_reader(BufReader::new(file))?;
        Ok(Self { items })
    }
}

/// A transform from one dataset to another.
///
/// Transforms are pure: they consume the input dataset and return a new one,
/// so stages can be chained with [`Dataset::apply`].
pub trait DatasetTransform<T> {
    fn transform(&self, input: Dataset<T>) -> Dataset<T>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct KeepEven;

    impl DatasetTransform<i64> for KeepEven {
        fn transform(&self, input: Dataset<i64>) -> Dataset<i64> {
            Dataset::from_items(input.into_iter().filter(|n| n % 2 == 0))
        }
    }

    #[test]
    fn apply_chains_transforms() {
        let dataset = Dataset::from_items([1i64, 2, 3, 4]);
        let dataset = dataset.apply(&KeepEven);
        assert_eq!(dataset.items(), &[2, 4]);
    }

    #[test]
    fn indexing_preserves_order() {
        let dataset = Dataset::from_items(["a", "b", "c"]);
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.get(1), Some(&"b"));
        assert_eq!(dataset.get(3), None);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.json");

        let dataset = Dataset::from_items([10u32, 20, 30]);
        dataset.save(&path).unwrap();

        let loaded: Dataset<u32> = Dataset::load(&path).unwrap();
        assert_eq!(loaded.items(), dataset.items());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = Dataset::<u32>::load("/nonexistent/dataset.json").unwrap_err();
        assert!(matches!(err, DatasetError::Io(_)));
    }
}
