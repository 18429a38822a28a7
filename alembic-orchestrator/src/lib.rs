//! Alembic Orchestrator
//!
//! Drives the labeling of an ordered dataset through an external
//! asynchronous batch service: splits the items into bounded chunks,
//! submits each chunk as one job, polls until a terminal status, collects
//! per-item results and reassembles them in original order.
//!
//! Chunks are processed strictly sequentially; the first failure aborts
//! the run and returns everything collected so far alongside a structured
//! error naming the chunk and failure kind.

pub mod collector;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod poller;

pub use collector::ResultCollector;
pub use config::{RequestTemplate, RunConfig};
pub use error::RunError;
pub use orchestrator::{Orchestrator, RunOutcome, RunReport};
pub use poller::{PollVerdict, Poller};
