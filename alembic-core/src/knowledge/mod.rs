//! Knowledge-distillation dataset transforms
//!
//! Generic, game-agnostic transforms used to shape a dataset before
//! labeling: clustering down to representative items and enlarging via
//! perturbation. Each is parameterized by a game-specific function.

pub mod cluster;
pub mod perturb;

pub use cluster::Clusterer;
pub use perturb::Perturbator;
