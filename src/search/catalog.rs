//! Immutable snapshots of the entry list
//!
//! Every snapshot gets a fresh [`CatalogVersion`], even when the contents are
//! equal to an earlier one. Anything derived from a snapshot (the search
//! index in particular) records the version it was derived from.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::models::Entry;

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

/// Identity of one catalog snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogVersion(u64);

impl CatalogVersion {
    fn next() -> Self {
        Self(NEXT_VERSION.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for CatalogVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A versioned, cheaply clonable entry list
#[derive(Debug, Clone)]
pub struct Catalog {
    version: CatalogVersion,
    entries: Arc<[Entry]>,
}

impl Catalog {
    #[must_use]
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            version: CatalogVersion::next(),
            entries: entries.into(),
        }
    }

    #[must_use]
    pub const fn version(&self) -> CatalogVersion {
        self.version
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by identifier
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Entries whose ids are in `ids`, in the order of `ids`
    ///
    /// Unknown ids are skipped.
    #[must_use]
    pub fn select<'a>(&'a self, ids: impl IntoIterator<Item = &'a str>) -> Vec<&'a Entry> {
        ids.into_iter().filter_map(|id| self.get(id)).collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl From<Vec<Entry>> for Catalog {
    fn from(entries: Vec<Entry>) -> Self {
        Self::new(entries)
    }
}
