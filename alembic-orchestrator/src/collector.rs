//! Result collector
//!
//! Accumulates per-item results across chunks into one global map, then
//! reorders them by original item index. The collector is exclusively
//! owned by the orchestrator's single flow; no locking is needed for the
//! sequential design.

use std::collections::hash_map::Entry;

use alembic_core::domain::{CustomId, OrderedOutput, ResultMap};

use crate::error::RunError;

/// Accumulates chunk results and produces the final ordered output
#[derive(Debug, Default)]
pub struct ResultCollector {
    merged: ResultMap,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unions a chunk's results into the global map.
    ///
    /// Chunks never overlap, so a custom id arriving twice across chunks
    /// is an internal-consistency fault, not a recoverable condition.
    pub fn merge(&mut self, chunk: usize, results: ResultMap) -> Result<(), RunError> {
        for (custom_id, lines) in results {
            match self.merged.entry(custom_id) {
                Entry::Occupied(entry) => {
                    return Err(RunError::DuplicateResult {
                        chunk,
                        custom_id: entry.key().clone(),
                    });
                }
                Entry::Vacant(entry) => {
                    entry.insert(lines);
                }
            }
        }
        Ok(())
    }

    /// Reassembles results in original item order.
    ///
    /// Slot `i` holds the lines collected for `item-i`, or the explicit
    /// missing marker. Ids that match no index in `[0, total)` are
    /// dropped. Does not consume the accumulated state: calling twice
    /// without an intervening merge yields identical output.
    pub fn finalize(&self, total: usize) -> OrderedOutput {
        let slots = (0..total)
            .map(|index| self.merged.get(&CustomId::from_index(index)).cloned())
            .collect();
        OrderedOutput::from_slots(slots)
    }

    /// Number of distinct custom ids collected so far
    pub fn len(&self) -> usize {
        self.merged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.merged.is_empty()
    }
}
