//! Query cache in front of a [`Backend`]
//!
//! Entry lists are cached per [`FetchCriteria`], the category list as a
//! single value. Each has its own staleness window. A change notification
//! for a resource kind drops every cached value of that kind; failed
//! fetches are never stored.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;

use crate::backend::{Backend, BackendError, ChangeEvent, FetchCriteria, ResourceKind, Subscription};
use crate::config::CacheConfig;
use crate::models::{Category, Entry};

/// Cached backend reads
#[derive(Clone)]
pub struct QueryCache {
    entries: Cache<FetchCriteria, Arc<Vec<Entry>>>,
    categories: Cache<(), Arc<Vec<Category>>>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

impl QueryCache {
    /// Create a cache with the given staleness windows
    #[must_use]
    pub fn new(entries_ttl: Duration, categories_ttl: Duration, max_capacity: u64) -> Self {
        Self {
            entries: Cache::builder()
                .time_to_live(entries_ttl)
                .max_capacity(max_capacity)
                .build(),
            categories: Cache::builder()
                .time_to_live(categories_ttl)
                .max_capacity(1)
                .build(),
        }
    }

    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(
            Duration::from_secs(config.entries_ttl_secs),
            Duration::from_secs(config.categories_ttl_secs),
            config.max_capacity,
        )
    }

    /// Entries for `criteria`, from cache while fresh
    ///
    /// # Errors
    ///
    /// Propagates the backend error on a miss; nothing is cached then.
    pub async fn entries(
        &self,
        backend: &dyn Backend,
        criteria: &FetchCriteria,
    ) -> Result<Arc<Vec<Entry>>, BackendError> {
        if let Some(hit) = self.entries.get(criteria) {
            log::trace!("entries cache hit for {criteria:?}");
            return Ok(hit);
        }

        let fetched = Arc::new(backend.fetch_entries(criteria).await?);
        self.entries.insert(criteria.clone(), Arc::clone(&fetched));
        Ok(fetched)
    }

    /// All categories, from cache while fresh
    ///
    /// # Errors
    ///
    /// Propagates the backend error on a miss; nothing is cached then.
    pub async fn categories(
        &self,
        backend: &dyn Backend,
    ) -> Result<Arc<Vec<Category>>, BackendError> {
        if let Some(hit) = self.categories.get(&()) {
            return Ok(hit);
        }

        let fetched = Arc::new(backend.fetch_categories().await?);
        self.categories.insert((), Arc::clone(&fetched));
        Ok(fetched)
    }

    /// Drop every cached value of `kind`
    ///
    /// Entries embed their category, so a category change drops both.
    pub fn invalidate(&self, kind: ResourceKind) {
        log::debug!("invalidating cached {kind}");
        match kind {
            ResourceKind::Entries => self.entries.invalidate_all(),
            ResourceKind::Categories => {
                self.categories.invalidate_all();
                self.entries.invalidate_all();
            }
            ResourceKind::SavedLinks => {}
        }
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
        self.categories.invalidate_all();
    }

    /// Invalidate automatically on the backend's change notifications
    ///
    /// The cache stays connected while the returned subscriptions live.
    pub fn connect(&self, backend: &dyn Backend) -> Vec<Subscription> {
        [ResourceKind::Entries, ResourceKind::Categories]
            .into_iter()
            .map(|kind| {
                let cache = self.clone();
                backend.subscribe_to_changes(
                    kind,
                    Box::new(move |event: &ChangeEvent| cache.invalidate(event.kind)),
                )
            })
            .collect()
    }
}
