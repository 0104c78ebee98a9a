//! Keyword List View
//!
//! Ordered snapshot of the keyword list as shown to the user. Positions
//! the user picks refer to this snapshot; they are resolved to keyword
//! values before the store is touched, and the snapshot is re-read from
//! storage after every mutation.

use tracing::debug;

use crate::error::Result;
use crate::keywords::{AddOutcome, KeywordStore};
use crate::prefs::PreferenceStore;

pub struct KeywordListView<P> {
    store: KeywordStore<P>,
    snapshot: Vec<String>,
}

impl<P: PreferenceStore> KeywordListView<P> {
    /// Create a view and load the current list
    pub fn new(store: KeywordStore<P>) -> Self {
        let mut view = Self {
            store,
            snapshot: Vec::new(),
        };
        view.refresh();
        view
    }

    /// Re-read the list from storage
    pub fn refresh(&mut self) {
        self.snapshot = self.store.load().to_vec();
        debug!("Keyword view refreshed: {} items", self.snapshot.len());
    }

    pub fn items(&self) -> &[String] {
        &self.snapshot
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.snapshot.get(index).map(String::as_str)
    }

    pub fn store(&self) -> &KeywordStore<P> {
        &self.store
    }

    /// Add a keyword typed by the user
    pub fn add(&mut self, input: &str) -> Result<AddOutcome> {
        let outcome = self.store.add(input)?;
        self.refresh();
        Ok(outcome)
    }

    /// Remove the keyword displayed at `index`.
    ///
    /// The view is refreshed even when the index turns out to be stale, so
    /// the user sees the list as it is now.
    pub fn remove(&mut self, index: usize) -> Result<String> {
        let result = self.store.remove_at(&self.snapshot, index);
        self.refresh();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpamGuardError;
    use crate::keywords::KeywordSet;
    use crate::prefs::MemoryPreferences;
    use std::sync::Arc;

    fn view_with(keywords: &[&str]) -> KeywordListView<MemoryPreferences> {
        let store = KeywordStore::new(MemoryPreferences::new());
        for k in keywords {
            store.add(k).unwrap();
        }
        KeywordListView::new(store)
    }

    #[test]
    fn test_loads_on_creation() {
        let view = view_with(&["b", "a"]);
        assert_eq!(view.len(), 2);
        assert!(view.items().contains(&"a".to_string()));
    }

    #[test]
    fn test_remove_by_position() {
        let mut view = view_with(&["a", "b", "c"]);
        assert_eq!(view.items(), ["a", "b", "c"]);

        assert_eq!(view.remove(1).unwrap(), "b");
        assert_eq!(view.items(), ["a", "c"]);

        let expected: KeywordSet = ["a", "c"].into_iter().collect();
        assert_eq!(view.store().load(), expected);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut view = view_with(&["a"]);
        let err = view.remove(5).unwrap_err();
        assert!(matches!(err, SpamGuardError::IndexOutOfRange { index: 5, len: 1 }));
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_stale_snapshot_refreshed_after_failed_remove() {
        let prefs = Arc::new(MemoryPreferences::new());
        let mut view = KeywordListView::new(KeywordStore::new(Arc::clone(&prefs)));
        let other = KeywordStore::new(Arc::clone(&prefs));

        view.add("a").unwrap();
        view.add("b").unwrap();
        other.remove("a").unwrap();

        assert!(view.remove(0).is_err());
        assert_eq!(view.items(), ["b"]);
    }

    #[test]
    fn test_add_blank_reports_empty_input() {
        let mut view = view_with(&["a"]);
        let err = view.add("   ").unwrap_err();
        assert_eq!(err.user_message(), "Please enter a keyword");
        assert_eq!(view.items(), ["a"]);
    }

    #[test]
    fn test_add_refreshes() {
        let mut view = view_with(&[]);
        assert!(view.is_empty());
        view.add(" lottery ").unwrap();
        assert_eq!(view.get(0), Some("lottery"));
    }
}
