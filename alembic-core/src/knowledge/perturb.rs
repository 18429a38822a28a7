//! Perturbation transform
//!
//! Replaces a dataset with the perturbed variants of its items. The
//! variant-producing function is game-specific and may yield zero or more
//! variants per item.

use crate::domain::dataset::{Dataset, DatasetTransform};

/// Function producing the perturbed variants of one item
pub type PerturbFn<T> = Box<dyn Fn(&T) -> Vec<T> + Send + Sync>;

/// Transform enlarging a dataset with item perturbations
pub struct Perturbator<T> {
    perturb: PerturbFn<T>,
}

impl<T> Perturbator<T> {
    pub fn new(perturb: PerturbFn<T>) -> Self {
        Self { perturb }
    }
}

impl<T> DatasetTransform<T> for Perturbator<T> {
    fn transform(&self, input: Dataset<T>) -> Dataset<T> {
        let mut output = Dataset::new();
        for item in &input {
            for variant in (self.perturb)(item) {
                output.push(variant);
            }
        }
        output
    }
}
