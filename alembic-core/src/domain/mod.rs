//! Domain types
//!
//! Core business entities shared by the client, the orchestrator and the
//! game-specific collaborator crates.

pub mod chunk;
pub mod dataset;
pub mod item;
pub mod job;
pub mod output;

pub use chunk::{Chunk, ChunkBound, ChunkPlan};
pub use dataset::{Dataset, DatasetError, DatasetTransform};
pub use item::{CustomId, PromptReady};
pub use job::{BatchJob, JobId, JobStatus, RequestCounts};
pub use output::{OrderedOutput, ResultMap};
