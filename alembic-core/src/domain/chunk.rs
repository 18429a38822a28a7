//! Chunk planning
//!
//! Splits an ordered collection of work items into contiguous half-open
//! index ranges, each submitted to the external service as one job.

use serde::{Deserialize, Serialize};

/// A contiguous half-open range `[start, end)` of work-item indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Zero-based chunk sequence number
    pub seq: usize,
    /// First item index covered by this chunk (inclusive)
    pub start: usize,
    /// One past the last item index covered by this chunk
    pub end: usize,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Iterates the global item indices covered by this chunk
    pub fn indices(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// How the maximum number of items per chunk is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkBound {
    /// Fixed number of items per chunk
    Items(usize),
    /// Derived from a per-job token budget and a per-item estimate,
    /// floored at one item per chunk
    TokenBudget {
        max_tokens_per_job: u64,
        estimated_tokens_per_item: u64,
    },
}

impl ChunkBound {
    /// Resolves the bound to a concrete items-per-chunk count.
    ///
    /// Returns `None` when the bound is unusable: an explicit count below
    /// one, or a zero per-item estimate. A token budget smaller than one
    /// item's estimate still resolves, floored at 1.
    pub fn resolve(&self) -> Option<usize> {
        match *self {
            ChunkBound::Items(0) => None,
            ChunkBound::Items(n) => Some(n),
            ChunkBound::TokenBudget {
                estimated_tokens_per_item: 0,
                ..
            } => None,
            ChunkBound::TokenBudget {
                max_tokens_per_job,
                estimated_tokens_per_item,
            } => Some(((max_tokens_per_job / estimated_tokens_per_item).max(1)) as usize),
        }
    }
}

/// The ordered sequence of chunks covering `[0, total)`
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    chunks: Vec<Chunk>,
}

impl ChunkPlan {
    /// Builds the plan for `total` items with at most `per_chunk` items
    /// per chunk. `total == 0` yields an empty plan.
    ///
    /// Returns `None` when `per_chunk` is zero.
    pub fn build(total: usize, per_chunk: usize) -> Option<Self> {
        if per_chunk == 0 {
            return None;
        }

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < total {
            let end = (start + per_chunk).min(total);
            chunks.push(Chunk {
                seq: chunks.len(),
                start,
                end,
            });
            start = end;
        }

        Some(Self { chunks })
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl IntoIterator for ChunkPlan {
    type Item = Chunk;
    type IntoIter = std::vec::IntoIter<Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.into_iter()
    }
}
