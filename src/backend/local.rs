//! Backend over the embedded sled catalog

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    Backend, BackendError, ChangeEvent, ChangeFeed, FetchCriteria, ResourceKind, newest_first,
};
use crate::db::{CatalogDocument, Database, DbError};
use crate::models::{Category, Entry, EntryId};

/// Serves the catalog from a local [`Database`]
#[derive(Clone)]
pub struct LocalBackend {
    db: Arc<Database>,
    feed: ChangeFeed,
}

impl LocalBackend {
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            feed: ChangeFeed::new(),
        }
    }

    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Load a catalog document and notify subscribers of both kinds
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Db` if any record cannot be stored.
    pub fn import(&self, document: CatalogDocument) -> Result<(usize, usize), BackendError> {
        let counts = self.db.import(document)?;
        self.db.flush()?;
        log::info!("imported {} categories and {} entries", counts.0, counts.1);
        self.feed.publish(&ChangeEvent::all(ResourceKind::Categories));
        self.feed.publish(&ChangeEvent::all(ResourceKind::Entries));
        Ok(counts)
    }
}

fn not_found(err: DbError) -> BackendError {
    match err {
        DbError::NotFound(id) => BackendError::NotFound(id),
        other => BackendError::Db(other),
    }
}

#[async_trait]
impl Backend for LocalBackend {
    async fn fetch_entries(&self, criteria: &FetchCriteria) -> Result<Vec<Entry>, BackendError> {
        let entries = self
            .db
            .list_entries()?
            .into_iter()
            .filter(|entry| criteria.matches(entry))
            .collect();
        Ok(newest_first(entries, criteria.limit))
    }

    async fn fetch_entry(&self, id: &str) -> Result<Entry, BackendError> {
        self.db
            .get_entry(id)?
            .ok_or_else(|| BackendError::NotFound(format!("entry {id}")))
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, BackendError> {
        Ok(self.db.list_categories()?)
    }

    async fn fetch_category_by_slug(&self, slug: &str) -> Result<Category, BackendError> {
        self.db
            .get_category_by_slug(slug)?
            .ok_or_else(|| BackendError::NotFound(format!("category '{slug}'")))
    }

    async fn track_click(
        &self,
        entry_id: &str,
        user_id: Option<&str>,
    ) -> Result<(), BackendError> {
        let count = self.db.record_click(entry_id, user_id).map_err(not_found)?;
        log::debug!("entry {entry_id} now has {count} clicks");
        self.feed.publish(&ChangeEvent::new(ResourceKind::Entries, entry_id));
        Ok(())
    }

    async fn toggle_saved_link(
        &self,
        user_id: &str,
        entry_id: &str,
    ) -> Result<bool, BackendError> {
        let saved = self.db.toggle_saved(user_id, entry_id)?;
        self.feed
            .publish(&ChangeEvent::new(ResourceKind::SavedLinks, entry_id));
        Ok(saved)
    }

    async fn saved_links(&self, user_id: &str) -> Result<Vec<EntryId>, BackendError> {
        Ok(self.db.saved_links(user_id)?)
    }

    fn changes(&self) -> &ChangeFeed {
        &self.feed
    }
}
