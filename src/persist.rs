//! Persistence boundary: canonical content, page-size key and font size
//!
//! The core keeps no storage of its own. Hosts implement [`DocumentStore`]
//! for whatever backend they use; [`MemoryStore`] is the in-memory version
//! used by tests and the CLI.

use crate::error::PersistError;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

/// What a store keeps for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedDocument {
    pub content: String,
    pub page_size: String,
    /// Only present when the font size was chosen explicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
}

impl PersistedDocument {
    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Raw storage for persisted documents, keyed by a host-chosen id
pub trait DocumentStore {
    /// Returns `Ok(None)` when nothing is stored under `id`
    fn load(&self, id: &str) -> Result<Option<PersistedDocument>, PersistError>;

    fn save(&self, id: &str, document: &PersistedDocument) -> Result<(), PersistError>;

    /// Returns whether anything was removed
    fn remove(&self, id: &str) -> Result<bool, PersistError>;
}

/// In-memory store holding serialized JSON.
///
/// Uses `RefCell` since the core is single-threaded and the trait takes
/// `&self`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<FxHashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self, id: &str) -> Result<Option<PersistedDocument>, PersistError> {
        self.entries
            .borrow()
            .get(id)
            .map(|json| PersistedDocument::from_json(json))
            .transpose()
    }

    fn save(&self, id: &str, document: &PersistedDocument) -> Result<(), PersistError> {
        let json = document.to_json()?;
        self.entries.borrow_mut().insert(id.to_string(), json);
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<bool, PersistError> {
        Ok(self.entries.borrow_mut().remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let document = PersistedDocument {
            content: "hi".to_string(),
            page_size: "a4".to_string(),
            font_size: None,
        };
        let json = document.to_json().unwrap();
        assert_eq!(json, r#"{"content":"hi","pageSize":"a4"}"#);

        let parsed =
            PersistedDocument::from_json(r#"{"content":"x","pageSize":"legal","fontSize":10}"#)
                .unwrap();
        assert_eq!(parsed.font_size, Some(10.0));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            PersistedDocument::from_json("{"),
            Err(PersistError::Serialization(_))
        ));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(store.load("doc").unwrap().is_none());

        let document = PersistedDocument {
            content: "body".to_string(),
            page_size: "letter".to_string(),
            font_size: Some(11.0),
        };
        store.save("doc", &document).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.load("doc").unwrap(), Some(document));
        assert!(store.remove("doc").unwrap());
        assert!(!store.remove("doc").unwrap());
        assert!(store.is_empty());
    }
}
