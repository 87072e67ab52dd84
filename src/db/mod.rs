//! Embedded database for the local catalog and client state
//!
//! Provides a clean API for storing entries, categories and the persisted
//! store snapshot, using sled as the embedded database backend.
//!
//! Uses multiple sled trees:
//! - `entries`: entry id -> `Entry`
//! - `tags`: reverse index mapping tag -> entry ids
//! - `categories`: category id -> `Category`
//! - `saved`: user id -> saved entry ids
//! - `clicks`: click log, keyed by a monotonic id
//! - `state`: the persisted client state

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sled::{Db, IVec, Tree};

use crate::models::{Category, Entry, EntryId, EntryStatus};
use crate::store::PersistedState;

pub mod error;

pub use error::DbError;

const STATE_KEY: &[u8] = b"app-state";

/// One recorded click-through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickRecord {
    pub entry_id: EntryId,
    pub user_id: Option<String>,
    pub clicked_at: DateTime<Utc>,
}

/// Importable catalog document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

/// Database wrapper that encapsulates all database operations
pub struct Database {
    db: Db,
    entries: Tree,
    tags: Tree,
    categories: Tree,
    saved: Tree,
    clicks: Tree,
    state: Tree,
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, DbError> {
    Ok(bincode::serde::encode_to_vec(value, bincode::config::standard())?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DbError> {
    let (value, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
    Ok(value)
}

/// Atomically replace the value stored under `key`
///
/// `update` receives the decoded current value and returns the replacement,
/// or `None` to remove the key. It may run more than once under contention.
/// Returns the value left in the tree.
fn update_value<T, F>(tree: &Tree, key: &[u8], mut update: F) -> Result<Option<T>, DbError>
where
    T: Serialize + DeserializeOwned,
    F: FnMut(Option<T>) -> Result<Option<T>, DbError>,
{
    let mut failure = None;
    let stored = tree.update_and_fetch(key, |current| {
        failure = None;
        let next = current
            .map(decode::<T>)
            .transpose()
            .and_then(&mut update)
            .and_then(|next| next.as_ref().map(encode).transpose());
        match next {
            Ok(bytes) => bytes.map(IVec::from),
            Err(e) => {
                failure = Some(e);
                current.map(IVec::from)
            }
        }
    })?;

    if let Some(e) = failure {
        return Err(e);
    }
    stored.map(|bytes| decode(&bytes)).transpose()
}

impl Database {
    /// Opens or creates a database at the specified path
    ///
    /// # Examples
    /// ```no_run
    /// use linkshelf::db::Database;
    /// let db = Database::open("my_db").unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the database or one of its trees cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        Self::from_db(sled::open(path)?)
    }

    /// Opens a database that lives only as long as the handle
    ///
    /// # Errors
    ///
    /// Returns `DbError` if sled cannot create the temporary database.
    pub fn open_temporary() -> Result<Self, DbError> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> Result<Self, DbError> {
        Ok(Self {
            entries: db.open_tree("entries")?,
            tags: db.open_tree("tags")?,
            categories: db.open_tree("categories")?,
            saved: db.open_tree("saved")?,
            clicks: db.open_tree("clicks")?,
            state: db.open_tree("state")?,
            db,
        })
    }

    /// Insert or replace an entry, keeping the tag index in sync
    ///
    /// # Errors
    ///
    /// Returns `DbError::InvalidInput` if the entry fails validation, or
    /// another `DbError` if storage or encoding fails.
    pub fn put_entry(&self, entry: &Entry) -> Result<(), DbError> {
        entry
            .validate()
            .map_err(|e| DbError::InvalidInput(e.to_string()))?;

        if let Some(old) = self.get_entry(&entry.id)? {
            self.remove_from_tag_index(&entry.id, &old.tags)?;
        }

        self.entries.insert(entry.id.as_bytes(), encode(entry)?)?;
        self.add_to_tag_index(&entry.id, &entry.tags)?;
        Ok(())
    }

    /// Get an entry by id
    ///
    /// # Errors
    ///
    /// Returns `DbError` if reading or decoding fails.
    pub fn get_entry(&self, id: &str) -> Result<Option<Entry>, DbError> {
        self.entries
            .get(id.as_bytes())?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// Remove an entry; returns whether it existed
    ///
    /// # Errors
    ///
    /// Returns `DbError` if storage operations fail.
    pub fn remove_entry(&self, id: &str) -> Result<bool, DbError> {
        match self.get_entry(id)? {
            Some(entry) => {
                self.remove_from_tag_index(id, &entry.tags)?;
                self.entries.remove(id.as_bytes())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// All stored entries, in key order
    ///
    /// # Errors
    ///
    /// Returns `DbError` if iteration or decoding fails.
    pub fn list_entries(&self) -> Result<Vec<Entry>, DbError> {
        self.entries
            .iter()
            .values()
            .map(|value| decode(&value?))
            .collect()
    }

    /// Change an entry's moderation status
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` for unknown ids and `DbError::InvalidInput`
    /// if the transition is not allowed.
    pub fn set_status(&self, id: &str, status: EntryStatus) -> Result<Entry, DbError> {
        let mut entry = self
            .get_entry(id)?
            .ok_or_else(|| DbError::NotFound(id.to_string()))?;
        entry.status = entry
            .status
            .transition(status)
            .map_err(|e| DbError::InvalidInput(e.to_string()))?;
        entry.updated_at = Utc::now();
        self.put_entry(&entry)?;
        Ok(entry)
    }

    /// Ids of entries carrying `tag`
    ///
    /// # Errors
    ///
    /// Returns `DbError` if reading or decoding fails.
    pub fn find_by_tag(&self, tag: &str) -> Result<Vec<EntryId>, DbError> {
        match self.tags.get(tag.as_bytes())? {
            Some(value) => decode(&value),
            None => Ok(Vec::new()),
        }
    }

    /// All tags with the number of entries using each, sorted by tag
    ///
    /// # Errors
    ///
    /// Returns `DbError` if iteration or decoding fails.
    pub fn tag_counts(&self) -> Result<BTreeMap<String, usize>, DbError> {
        let mut counts = BTreeMap::new();
        for item in &self.tags {
            let (key, value) = item?;
            let ids: Vec<EntryId> = decode(&value)?;
            let tag = String::from_utf8(key.to_vec())
                .map_err(|e| DbError::SerializeError(e.to_string()))?;
            counts.insert(tag, ids.len());
        }
        Ok(counts)
    }

    /// Insert or replace a category
    ///
    /// # Errors
    ///
    /// Returns `DbError::InvalidInput` if another category already uses the slug.
    pub fn put_category(&self, category: &Category) -> Result<(), DbError> {
        if let Some(existing) = self.get_category_by_slug(&category.slug)?
            && existing.id != category.id
        {
            return Err(DbError::InvalidInput(format!(
                "slug '{}' already used by category {}",
                category.slug, existing.id
            )));
        }
        self.categories
            .insert(category.id.as_bytes(), encode(category)?)?;
        Ok(())
    }

    /// All categories in display order
    ///
    /// # Errors
    ///
    /// Returns `DbError` if iteration or decoding fails.
    pub fn list_categories(&self) -> Result<Vec<Category>, DbError> {
        let mut categories: Vec<Category> = self
            .categories
            .iter()
            .values()
            .map(|value| decode(&value?))
            .collect::<Result<_, _>>()?;
        Category::sort_for_display(&mut categories);
        Ok(categories)
    }

    /// Find a category by its slug
    ///
    /// # Errors
    ///
    /// Returns `DbError` if iteration or decoding fails.
    pub fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, DbError> {
        for value in self.categories.iter().values() {
            let category: Category = decode(&value?)?;
            if category.slug == slug {
                return Ok(Some(category));
            }
        }
        Ok(None)
    }

    /// Count a click on an entry and log it; returns the new click count
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` for unknown ids, or another `DbError` if
    /// storage fails.
    pub fn record_click(&self, entry_id: &str, user_id: Option<&str>) -> Result<u64, DbError> {
        let entry = update_value(&self.entries, entry_id.as_bytes(), |current: Option<Entry>| {
            let mut entry = current.ok_or_else(|| DbError::NotFound(entry_id.to_string()))?;
            entry.click_count = entry.click_count.saturating_add(1);
            Ok(Some(entry))
        })?
        .ok_or_else(|| DbError::NotFound(entry_id.to_string()))?;

        let record = ClickRecord {
            entry_id: entry_id.to_string(),
            user_id: user_id.map(str::to_string),
            clicked_at: Utc::now(),
        };
        let key = self.db.generate_id()?.to_be_bytes();
        self.clicks.insert(key, encode(&record)?)?;

        Ok(entry.click_count)
    }

    /// Click records, oldest first
    ///
    /// # Errors
    ///
    /// Returns `DbError` if iteration or decoding fails.
    pub fn clicks(&self) -> Result<Vec<ClickRecord>, DbError> {
        self.clicks
            .iter()
            .values()
            .map(|value| decode(&value?))
            .collect()
    }

    /// Saved entry ids of a user
    ///
    /// # Errors
    ///
    /// Returns `DbError` if reading or decoding fails.
    pub fn saved_links(&self, user_id: &str) -> Result<Vec<EntryId>, DbError> {
        match self.saved.get(user_id.as_bytes())? {
            Some(value) => decode(&value),
            None => Ok(Vec::new()),
        }
    }

    /// Toggle `entry_id` in the user's saved list; returns true if now saved
    ///
    /// # Errors
    ///
    /// Returns `DbError` if storage or encoding fails.
    pub fn toggle_saved(&self, user_id: &str, entry_id: &str) -> Result<bool, DbError> {
        let mut now_saved = false;
        update_value(&self.saved, user_id.as_bytes(), |current: Option<Vec<EntryId>>| {
            let mut saved = current.unwrap_or_default();
            now_saved = match saved.iter().position(|id| id == entry_id) {
                Some(pos) => {
                    saved.remove(pos);
                    false
                }
                None => {
                    saved.push(entry_id.to_string());
                    true
                }
            };
            Ok(Some(saved))
        })?;
        Ok(now_saved)
    }

    /// Store the persisted client state
    ///
    /// # Errors
    ///
    /// Returns `DbError` if encoding or storage fails.
    pub fn save_state(&self, state: &PersistedState) -> Result<(), DbError> {
        let bytes = bincode::encode_to_vec(state, bincode::config::standard())?;
        self.state.insert(STATE_KEY, bytes)?;
        Ok(())
    }

    /// Load the persisted client state, if one was saved
    ///
    /// # Errors
    ///
    /// Returns `DbError` if reading or decoding fails.
    pub fn load_state(&self) -> Result<Option<PersistedState>, DbError> {
        match self.state.get(STATE_KEY)? {
            Some(bytes) => {
                let (state, _): (PersistedState, usize) =
                    bincode::decode_from_slice(&bytes, bincode::config::standard())?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    /// Store every category and entry of `document`
    ///
    /// Entries are normalized first; an entry whose category id is known gets
    /// the category joined onto it. Returns `(categories, entries)` written.
    ///
    /// # Errors
    ///
    /// Returns `DbError` on the first entry or category that cannot be stored.
    pub fn import(&self, document: CatalogDocument) -> Result<(usize, usize), DbError> {
        for category in &document.categories {
            self.put_category(category)?;
        }

        let known: BTreeMap<&str, &Category> = document
            .categories
            .iter()
            .map(|c| (c.id.as_str(), c))
            .collect();

        for entry in document.entries.iter().cloned() {
            let mut entry = entry.normalized();
            if let Some(reference) = &entry.category
                && let Some(category) = known.get(reference.id.as_str())
            {
                entry.category = Some(category.to_ref());
            }
            self.put_entry(&entry)?;
        }

        Ok((document.categories.len(), document.entries.len()))
    }

    /// Number of stored entries
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Flush all pending writes to disk
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the flush operation fails.
    pub fn flush(&self) -> Result<(), DbError> {
        self.db.flush()?;
        Ok(())
    }

    /// Remove everything from every tree
    ///
    /// # Errors
    ///
    /// Returns `DbError` if clearing a tree fails.
    pub fn clear(&self) -> Result<(), DbError> {
        for tree in [
            &self.entries,
            &self.tags,
            &self.categories,
            &self.saved,
            &self.clicks,
            &self.state,
        ] {
            tree.clear()?;
        }
        Ok(())
    }

    /// Add entry to the tag index for all specified tags
    fn add_to_tag_index(&self, entry_id: &str, tags: &[String]) -> Result<(), DbError> {
        for tag in tags {
            update_value(&self.tags, tag.as_bytes(), |current: Option<Vec<EntryId>>| {
                let mut ids = current.unwrap_or_default();
                if !ids.iter().any(|id| id == entry_id) {
                    ids.push(entry_id.to_string());
                }
                Ok(Some(ids))
            })?;
        }
        Ok(())
    }

    /// Remove entry from the tag index; tags left without entries are dropped
    fn remove_from_tag_index(&self, entry_id: &str, tags: &[String]) -> Result<(), DbError> {
        for tag in tags {
            update_value(&self.tags, tag.as_bytes(), |current: Option<Vec<EntryId>>| {
                let mut ids = current.unwrap_or_default();
                ids.retain(|id| id != entry_id);
                Ok((!ids.is_empty()).then_some(ids))
            })?;
        }
        Ok(())
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        // Best-effort flush; callers needing durability call flush()
        let _ = self.db.flush();
    }
}
