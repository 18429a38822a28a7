//! Density clustering transform
//!
//! Reduces a dataset to one representative item per cluster: items are
//! grouped by transitive feature-space proximity (every point within
//! `eps` of a cluster member joins the cluster), then the member closest
//! to the cluster centroid is kept.

use crate::domain::dataset::{Dataset, DatasetTransform};

/// Feature-extraction function turning an item into its feature vector.
///
/// All items of a dataset must map to vectors of the same length.
pub type FeatureFn<T> = Box<dyn Fn(&T) -> Vec<f32> + Send + Sync>;

const DEFAULT_EPS: f32 = 1e-2;

/// Transform keeping only cluster centers
pub struct Clusterer<T> {
    to_features: FeatureFn<T>,
    eps: f32,
}

impl<T> Clusterer<T> {
    pub fn new(to_features: FeatureFn<T>) -> Self {
        Self {
            to_features,
            eps: DEFAULT_EPS,
        }
    }

    pub fn with_eps(mut self, eps: f32) -> Self {
        self.eps = eps;
        self
    }
}

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Assigns a cluster label to every point by flooding `eps`-neighborhoods.
///
/// With a single-point minimum there are no noise points: every item ends
/// up in exactly one cluster, labeled in discovery order.
fn label_clusters(features: &[Vec<f32>], eps: f32) -> Vec<usize> {
    let mut labels = vec![usize::MAX; features.len()];
    let mut next_label = 0;

    for seed in 0..features.len() {
        if labels[seed] != usize::MAX {
            continue;
        }

        labels[seed] = next_label;
        let mut frontier = vec![seed];
        while let Some(current) = frontier.pop() {
            for other in 0..features.len() {
                if labels[other] == usize::MAX
                    && euclidean(&features[current], &features[other]) <= eps
                {
                    labels[other] = next_label;
                    frontier.push(other);
                }
            }
        }

        next_label += 1;
    }

    labels
}

impl<T: Clone> DatasetTransform<T> for Clusterer<T> {
    fn transform(&self, input: Dataset<T>) -> Dataset<T> {
        if input.is_empty() {
            return input;
        }

        let features: Vec<Vec<f32>> = input.iter().map(|item| (self.to_features)(item)).collect();
        let labels = label_clusters(&features, self.eps);
        let cluster_count = labels.iter().max().map_or(0, |max| max + 1);

        let mut centers = Dataset::new();
        for cluster in 0..cluster_count {
            let members: Vec<usize> = (0..features.len())
                .filter(|&i| labels[i] == cluster)
                .collect();

            let dims = features[members[0]].len();
            let mut centroid = vec![0.0f32; dims];
            for &member in &members {
                for (c, value) in centroid.iter_mut().zip(&features[member]) {
                    *c += value;
                }
            }
            for value in &mut centroid {
                *value /= members.len() as f32;
            }

            let center = members
                .iter()
                .copied()
                .min_by(|&a, &b| {
                    euclidean(&features[a], &centroid)
                        .total_cmp(&euclidean(&features[b], &centroid))
                })
                .unwrap_or(members[0]);

            if let Some(item) = input.get(center) {
                centers.push(item.clone());
            }
        }

        centers
    }
}
