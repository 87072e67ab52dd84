//! Data source abstraction
//!
//! The browsing layer never talks to storage directly; it goes through a
//! [`Backend`]. Two implementations exist:
//!
//! - [`LocalBackend`]: the embedded sled catalog
//! - `RestBackend` (feature `remote`): the hosted REST API
//!
//! Both publish [`ChangeEvent`]s through a [`ChangeFeed`] so caches and
//! views can refresh after a mutation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::DbError;
use crate::models::{Category, Entry, EntryId, EntryStatus};

pub mod changes;
pub mod local;
#[cfg(feature = "remote")]
pub mod rest;

pub use changes::{ChangeEvent, ChangeFeed, ResourceKind, Subscription};
pub use local::LocalBackend;
#[cfg(feature = "remote")]
pub use rest::RestBackend;

/// Failures reported by a backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// The service could not be reached or answered with a server error
    #[error("Network error: {0}")]
    Network(String),

    /// Credentials were missing or rejected
    #[error("Not authorized: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The response body did not have the expected shape
    #[error("Malformed response: {0}")]
    Decode(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl BackendError {
    /// Whether retrying the same call later could succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Which entries to fetch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchCriteria {
    /// Category id
    pub category: Option<String>,
    /// Restrict to featured (`Some(true)`) or non-featured entries
    pub featured: Option<bool>,
    pub status: EntryStatus,
    pub limit: Option<usize>,
}

impl Default for FetchCriteria {
    fn default() -> Self {
        Self {
            category: None,
            featured: None,
            status: EntryStatus::Approved,
            limit: None,
        }
    }
}

impl FetchCriteria {
    /// Approved entries of every category
    #[must_use]
    pub fn approved() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn featured(limit: usize) -> Self {
        Self {
            featured: Some(true),
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Whether `entry` satisfies the criteria, ignoring `limit`
    #[must_use]
    pub fn matches(&self, entry: &Entry) -> bool {
        entry.status == self.status
            && self
                .category
                .as_deref()
                .is_none_or(|id| entry.category_id() == Some(id))
            && self.featured.is_none_or(|featured| entry.featured == featured)
    }
}

/// Source of catalog data and sink for user actions
#[async_trait]
pub trait Backend: Send + Sync {
    /// Entries matching `criteria`, newest first
    async fn fetch_entries(&self, criteria: &FetchCriteria) -> Result<Vec<Entry>, BackendError>;

    async fn fetch_entry(&self, id: &str) -> Result<Entry, BackendError>;

    /// Categories ordered by their display index
    async fn fetch_categories(&self) -> Result<Vec<Category>, BackendError>;

    async fn fetch_category_by_slug(&self, slug: &str) -> Result<Category, BackendError>;

    /// Record a click-through on `entry_id`
    async fn track_click(
        &self,
        entry_id: &str,
        user_id: Option<&str>,
    ) -> Result<(), BackendError>;

    /// Flip the saved flag; returns true if the entry is now saved
    async fn toggle_saved_link(&self, user_id: &str, entry_id: &str)
    -> Result<bool, BackendError>;

    /// Saved entry ids of `user_id`
    async fn saved_links(&self, user_id: &str) -> Result<Vec<EntryId>, BackendError>;

    /// Feed this backend publishes change notifications on
    fn changes(&self) -> &ChangeFeed;

    /// Register `callback` for changes of `kind`; dropping the handle unsubscribes
    fn subscribe_to_changes(
        &self,
        kind: ResourceKind,
        callback: Box<dyn Fn(&ChangeEvent) + Send + Sync>,
    ) -> Subscription {
        self.changes().subscribe(kind, callback)
    }
}

/// Sort newest first, stable, and apply the limit
pub(crate) fn newest_first(mut entries: Vec<Entry>, limit: Option<usize>) -> Vec<Entry> {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    entries
}
