//! Run output types
//!
//! `ResultMap` accumulates raw per-item result lines keyed by custom id;
//! `OrderedOutput` is the final sequence aligned with the original item
//! order, with explicit missing slots.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::item::CustomId;

/// Raw result lines keyed by the submitted custom id.
///
/// An item may legitimately produce multiple lines; they are kept in the
/// order they were parsed from the output artifact.
pub type ResultMap = HashMap<CustomId, Vec<String>>;

/// Final per-item results in original item order.
///
/// Slot `i` holds the result lines for `item-i`, or `None` if no result
/// was ever produced for that index. Serializes as one JSON array,
/// index-aligned with the input, with `null` marking missing slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderedOutput {
    slots: Vec<Option<Vec<String>>>,
}

impl OrderedOutput {
    pub fn from_slots(slots: Vec<Option<Vec<String>>>) -> Self {
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Result lines for item `index`, or `None` for a missing slot
    pub fn get(&self, index: usize) -> Option<&[String]> {
        self.slots.get(index)?.as_deref()
    }

    /// Number of slots with no result
    pub fn missing_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_none()).count()
    }

    /// Number of slots carrying at least one result line
    pub fn filled_count(&self) -> usize {
        self.len() - self.missing_count()
    }

    /// Iterates `(item index, result lines)` over filled slots only
    pub fn filled(&self) -> impl Iterator<Item = (usize, &[String])> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_deref().map(|lines| (i, lines)))
    }

    pub fn slots(&self) -> &[Option<Vec<String>>] {
        &self.slots
    }
}
