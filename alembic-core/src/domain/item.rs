//! Work-item identity and prompt-rendering capability

use std::fmt;

use serde::{Deserialize, Serialize};

/// Capability of a work item to render itself as request-ready text.
///
/// Implemented by each game's state type; the orchestrator only ever sees
/// items through this trait.
pub trait PromptReady {
    /// The textual representation sent as the per-item user payload
    fn to_prompt_text(&self) -> String;
}

const CUSTOM_ID_PREFIX: &str = "item-";

/// Stable identifier correlating a submitted request with its result.
///
/// Derived from the item's global index as `item-<index>`; distinct indices
/// always produce distinct ids, and the index can be recovered from the id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomId(String);

impl CustomId {
    pub fn from_index(index: usize) -> Self {
        Self(format!("{CUSTOM_ID_PREFIX}{index}"))
    }

    /// Recovers the item index, or `None` for ids not produced by
    /// [`CustomId::from_index`]
    pub fn index(&self) -> Option<usize> {
        self.0.strip_prefix(CUSTOM_ID_PREFIX)?.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CustomId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trip() {
        for i in 0..100 {
            assert_eq!(CustomId::from_index(i).index(), Some(i));
        }
    }

    #[test]
    fn distinct_indices_produce_distinct_ids() {
        let a = CustomId::from_index(1);
        let b = CustomId::from_index(10);
        assert_ne!(a, b);
        assert_eq!(a.as_str(), "item-1");
        assert_eq!(b.as_str(), "item-10");
    }

    #[test]
    fn foreign_ids_do_not_decode() {
        assert_eq!(CustomId::from("state-3".to_string()).index(), None);
        assert_eq!(CustomId::from("item-".to_string()).index(), None);
        assert_eq!(CustomId::from("item-x".to_string()).index(), None);
    }
}
