//! Keyword Store
//!
//! The user's block-list, persisted as a string set under the
//! [`PREFS_NAMESPACE`]/[`KEYWORDS_KEY`] preference. Every mutation reads the
//! current set from storage, applies the change and writes the whole set
//! back; nothing is cached between calls, so the message receiver and the
//! list view always agree on what is stored.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, SpamGuardError};
use crate::events::{Event, EventBus};
use crate::prefs::PreferenceStore;

/// Preference namespace holding the filter state
pub const PREFS_NAMESPACE: &str = "SpamFilter";

/// Key of the keyword set inside [`PREFS_NAMESPACE`]
pub const KEYWORDS_KEY: &str = "keywords";

/// Set of spam keywords.
///
/// Every element is trimmed and non-empty. Iteration order is the sorted
/// order of the underlying set, which callers must not rely on across
/// persistence round-trips.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordSet(BTreeSet<String>);

impl KeywordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a keyword after trimming it.
    ///
    /// Returns `Ok(false)` when the keyword was already present.
    pub fn insert(&mut self, keyword: &str) -> Result<bool> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(SpamGuardError::EmptyKeyword);
        }
        Ok(self.0.insert(keyword.to_string()))
    }

    /// Remove a keyword, returns whether it was present
    pub fn remove(&mut self, keyword: &str) -> bool {
        self.0.remove(keyword.trim())
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.0.contains(keyword.trim())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }

    /// Ordered copy of the keywords, for display
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    pub fn as_set(&self) -> &BTreeSet<String> {
        &self.0
    }

    /// Build a set from persisted values, dropping entries that break the
    /// trimmed-non-empty invariant.
    fn from_persisted(values: BTreeSet<String>) -> Self {
        let total = values.len();
        let set: Self = values.into_iter().collect();
        if set.len() != total {
            warn!("Dropped {} invalid persisted keywords", total - set.len());
        }
        set
    }
}

impl<S: AsRef<str>> FromIterator<S> for KeywordSet {
    /// Collect keywords, silently skipping blank ones
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = KeywordSet::new();
        for keyword in iter {
            let _ = set.insert(keyword.as_ref());
        }
        set
    }
}

impl<'a> IntoIterator for &'a KeywordSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Result of a successful [`KeywordStore::add`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// The keyword was new and has been persisted
    Added(String),
    /// The keyword was already in the list; nothing was written
    AlreadyPresent(String),
}

impl AddOutcome {
    pub fn keyword(&self) -> &str {
        match self {
            AddOutcome::Added(k) | AddOutcome::AlreadyPresent(k) => k,
        }
    }
}

/// Repository for the persisted keyword set
pub struct KeywordStore<P> {
    prefs: P,
    event_bus: Option<Arc<EventBus>>,
}

impl<P: PreferenceStore> KeywordStore<P> {
    /// Create a store on top of a preferences backend
    pub fn new(prefs: P) -> Self {
        Self {
            prefs,
            event_bus: None,
        }
    }

    /// Publish keyword changes on `event_bus`
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Preferences backend
    pub fn prefs(&self) -> &P {
        &self.prefs
    }

    /// Read the persisted keywords.
    ///
    /// Absent or unreadable storage yields an empty set.
    pub fn load(&self) -> KeywordSet {
        self.read().unwrap_or_else(|e| {
            warn!("Keyword storage unreadable, using empty list: {}", e);
            KeywordSet::new()
        })
    }

    /// Read the persisted keywords, propagating storage errors.
    ///
    /// Mutations build on this so an unreadable store is never replaced by
    /// a set derived from nothing.
    fn read(&self) -> Result<KeywordSet> {
        match self.prefs.get_string_set(PREFS_NAMESPACE, KEYWORDS_KEY)? {
            Some(values) => Ok(KeywordSet::from_persisted(values)),
            None => {
                debug!("No keywords stored yet");
                Ok(KeywordSet::new())
            }
        }
    }

    /// Overwrite the persisted keywords
    pub fn save(&self, keywords: &KeywordSet) -> Result<()> {
        self.prefs
            .put_string_set(PREFS_NAMESPACE, KEYWORDS_KEY, keywords.as_set())?;
        debug!("Saved {} keywords", keywords.len());
        Ok(())
    }

    /// Trim and add a keyword, persisting the new set.
    ///
    /// Blank input fails with [`SpamGuardError::EmptyKeyword`] and leaves
    /// storage untouched. An unreadable store fails the add instead of
    /// overwriting the stored list.
    pub fn add(&self, keyword: &str) -> Result<AddOutcome> {
        let trimmed = keyword.trim().to_string();
        if trimmed.is_empty() {
            return Err(SpamGuardError::EmptyKeyword);
        }

        let mut keywords = self.read()?;
        if !keywords.insert(&trimmed)? {
            debug!("Keyword {:?} already present", trimmed);
            return Ok(AddOutcome::AlreadyPresent(trimmed));
        }

        self.save(&keywords)?;
        info!("Added keyword {:?}", trimmed);
        self.emit(Event::KeywordAdded { keyword: trimmed.clone() });
        Ok(AddOutcome::Added(trimmed))
    }

    /// Remove a keyword by value, returns whether it was stored
    pub fn remove(&self, keyword: &str) -> Result<bool> {
        let mut keywords = self.read()?;
        if !keywords.remove(keyword) {
            debug!("Keyword {:?} not stored", keyword);
            return Ok(false);
        }

        self.save(&keywords)?;
        info!("Removed keyword {:?}", keyword.trim());
        self.emit(Event::KeywordRemoved { keyword: keyword.trim().to_string() });
        Ok(true)
    }

    /// Remove the keyword shown at `index` of a displayed snapshot.
    ///
    /// The position is resolved against `snapshot` before touching storage.
    /// A position past the end, or one whose keyword has meanwhile vanished
    /// from storage, fails with [`SpamGuardError::IndexOutOfRange`].
    pub fn remove_at(&self, snapshot: &[String], index: usize) -> Result<String> {
        let stale = || SpamGuardError::IndexOutOfRange {
            index,
            len: snapshot.len(),
        };

        let keyword = snapshot.get(index).ok_or_else(stale)?;
        if !self.remove(keyword)? {
            return Err(stale());
        }
        Ok(keyword.clone())
    }

    /// Remove every keyword
    pub fn clear(&self) -> Result<()> {
        self.save(&KeywordSet::new())?;
        info!("Cleared keyword list");
        self.emit(Event::KeywordsCleared);
        Ok(())
    }

    fn emit(&self, event: Event) {
        if let Some(bus) = &self.event_bus {
            bus.emit(event);
        }
    }
}
