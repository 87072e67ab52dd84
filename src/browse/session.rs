//! Browsing session
//!
//! A [`BrowseSession`] owns the store and the current catalog snapshot, and
//! routes user interactions to the backend. The data flow is one-way:
//!
//! ```text
//! interaction ─→ store command ─→ pipeline(catalog, filters) ─→ visible list
//!                     │
//!                     └─→ backend call (async, best effort)
//! ```
//!
//! Each [`Interaction`] is consumed by exactly one handler. Saving or
//! sharing an entry never also counts as a click-through on it.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::backend::{Backend, BackendError, FetchCriteria, Subscription};
use crate::browse::actions::{
    self, ActionOutcome, ClipboardSink, ShareOutcome, SystemClipboard, SystemOpener, UrlOpener,
};
use crate::cache::QueryCache;
use crate::db::{Database, DbError};
use crate::models::{Category, Entry, EntryId};
use crate::search::{Catalog, FilterPipeline, SearchOptions};
use crate::store::{AppStore, PersistedState};

/// Browse session error type
pub type Result<T> = std::result::Result<T, BrowseError>;

/// Errors that can occur during a browse session
#[derive(Debug, thiserror::Error)]
pub enum BrowseError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Unknown entry: {0}")]
    UnknownEntry(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),
}

/// A user gesture on one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// Follow the entry's link
    Activate(EntryId),
    ToggleSave(EntryId),
    Share(EntryId),
}

/// What a handled [`Interaction`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionOutcome {
    Opened(ActionOutcome),
    Saved(SaveOutcome),
    Shared(ShareOutcome),
}

/// Result of toggling a saved entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Whether the entry is saved now
    pub saved: bool,
    /// Whether the backend confirmed the new state
    pub synced: bool,
}

/// Store, catalog and backend wired together
pub struct BrowseSession {
    backend: Arc<dyn Backend>,
    cache: QueryCache,
    store: AppStore,
    pipeline: FilterPipeline,
    catalog: Catalog,
    source: Option<Arc<Vec<Entry>>>,
    opener: Box<dyn UrlOpener>,
    clipboard: Box<dyn ClipboardSink>,
    pending: Vec<JoinHandle<()>>,
    subscriptions: Vec<Subscription>,
}

impl BrowseSession {
    /// New session over `backend`, starting from `store`
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, store: AppStore) -> Self {
        let cache = QueryCache::default();
        let subscriptions = cache.connect(backend.as_ref());
        Self {
            backend,
            cache,
            store,
            pipeline: FilterPipeline::default(),
            catalog: Catalog::default(),
            source: None,
            opener: Box::new(SystemOpener),
            clipboard: Box::new(SystemClipboard),
            pending: Vec::new(),
            subscriptions,
        }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: QueryCache) -> Self {
        self.subscriptions = cache.connect(self.backend.as_ref());
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn with_search_options(mut self, options: SearchOptions) -> Self {
        self.pipeline = FilterPipeline::new(options);
        self
    }

    #[must_use]
    pub fn with_opener(mut self, opener: Box<dyn UrlOpener>) -> Self {
        self.opener = opener;
        self
    }

    #[must_use]
    pub fn with_clipboard(mut self, clipboard: Box<dyn ClipboardSink>) -> Self {
        self.clipboard = clipboard;
        self
    }

    /// Write the persisted part of the state to `db` after every change to it
    #[must_use]
    pub fn persist_to(mut self, db: Arc<Database>) -> Self {
        self.store.subscribe(move |state, command| {
            if !command.touches_persisted() {
                return;
            }
            if let Err(e) = db.save_state(&PersistedState::from_state(state)) {
                log::warn!("failed to persist client state: {e}");
            }
        });
        self
    }

    #[must_use]
    pub const fn store(&self) -> &AppStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut AppStore {
        &mut self.store
    }

    #[must_use]
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Current catalog snapshot; empty until [`refresh`](Self::refresh)
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Pull the approved entries, replacing the catalog if they changed
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::Backend` if the fetch fails; the previous
    /// catalog is kept.
    pub async fn refresh(&mut self) -> Result<&Catalog> {
        let fetched = self
            .cache
            .entries(self.backend.as_ref(), &FetchCriteria::default())
            .await?;

        let unchanged = self
            .source
            .as_ref()
            .is_some_and(|source| Arc::ptr_eq(source, &fetched));
        if !unchanged {
            self.catalog = Catalog::new(fetched.as_ref().clone());
            self.source = Some(fetched);
        }
        Ok(&self.catalog)
    }

    /// Catalog entries after the store's filters and sort order
    pub fn visible(&mut self) -> Vec<Entry> {
        self.pipeline
            .run(&self.catalog, &self.store.state().search_filters)
    }

    /// Categories with link counts derived from the current catalog
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::Backend` if the categories cannot be fetched.
    pub async fn categories(&self) -> Result<Vec<Category>> {
        let categories = self.cache.categories(self.backend.as_ref()).await?;
        Ok(Category::with_link_counts(
            categories.as_ref().clone(),
            self.catalog.entries(),
        ))
    }

    /// Map category slugs (or ids) to category ids
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::UnknownCategory` for the first value that names
    /// no category.
    pub async fn resolve_categories(&self, names: &[String]) -> Result<BTreeSet<String>> {
        if names.is_empty() {
            return Ok(BTreeSet::new());
        }
        let categories = self.cache.categories(self.backend.as_ref()).await?;
        names
            .iter()
            .map(|name| {
                categories
                    .iter()
                    .find(|c| c.slug == *name || c.id == *name)
                    .map(|c| c.id.clone())
                    .ok_or_else(|| BrowseError::UnknownCategory(name.clone()))
            })
            .collect()
    }

    /// Look up an entry, falling back to the backend when not in the catalog
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::UnknownEntry` if neither has it.
    pub async fn entry(&self, id: &str) -> Result<Entry> {
        if let Some(entry) = self.catalog.get(id) {
            return Ok(entry.clone());
        }
        match self.backend.fetch_entry(id).await {
            Ok(entry) => Ok(entry),
            Err(BackendError::NotFound(_)) => Err(BrowseError::UnknownEntry(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Saved entries present in the catalog, in id order
    #[must_use]
    pub fn saved_entries(&self) -> Vec<&Entry> {
        self.catalog
            .select(self.store.state().saved_links.iter().map(String::as_str))
    }

    /// Recently viewed entries present in the catalog, most recent first
    #[must_use]
    pub fn recent_entries(&self) -> Vec<&Entry> {
        self.catalog
            .select(self.store.state().recently_viewed.iter().map(String::as_str))
    }

    /// Handle one interaction
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::UnknownEntry` if the entry does not exist.
    pub async fn handle(&mut self, interaction: Interaction) -> Result<InteractionOutcome> {
        match interaction {
            Interaction::Activate(id) => self.click_through(&id).await.map(InteractionOutcome::Opened),
            Interaction::ToggleSave(id) => self.toggle_save(&id).await.map(InteractionOutcome::Saved),
            Interaction::Share(id) => self.share(&id).await.map(InteractionOutcome::Shared),
        }
    }

    /// Record the view, report the click, then open the link
    ///
    /// Click tracking runs in the background and never delays or blocks
    /// opening the URL.
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::UnknownEntry` if the entry does not exist.
    pub async fn click_through(&mut self, id: &str) -> Result<ActionOutcome> {
        let entry = self.entry(id).await?;

        self.store.add_to_recently_viewed(entry.id.clone());
        self.track_click(&entry.id);
        Ok(actions::execute_open_url(self.opener.as_ref(), &entry.url))
    }

    fn track_click(&mut self, id: &str) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::debug!("no async runtime, click on {id} not tracked");
            return;
        };

        let backend = Arc::clone(&self.backend);
        let id = id.to_string();
        let user_id = self.store.state().user_id().map(str::to_string);
        self.pending.retain(|handle| !handle.is_finished());
        self.pending.push(runtime.spawn(async move {
            if let Err(e) = backend.track_click(&id, user_id.as_deref()).await {
                log::debug!("click tracking for {id} failed: {e}");
            }
        }));
    }

    /// Wait for background work such as click tracking to finish
    pub async fn settle(&mut self) {
        for handle in self.pending.drain(..) {
            if let Err(e) = handle.await {
                log::debug!("background task ended abnormally: {e}");
            }
        }
    }

    /// Flip the saved flag locally, then reconcile with the backend
    ///
    /// Without a signed-in user the change stays local. When the backend
    /// call fails the local state is kept and the outcome reports it as
    /// unsynced.
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::UnknownEntry` if the entry does not exist.
    pub async fn toggle_save(&mut self, id: &str) -> Result<SaveOutcome> {
        let entry = self.entry(id).await?;
        self.store.toggle_saved_link(entry.id.clone());
        let local = self.store.state().is_saved(&entry.id);

        let Some(user_id) = self.store.state().user_id().map(str::to_string) else {
            return Ok(SaveOutcome {
                saved: local,
                synced: false,
            });
        };

        match self.backend.toggle_saved_link(&user_id, &entry.id).await {
            Ok(remote) => {
                if remote != local {
                    log::debug!("saved state of {} corrected by backend", entry.id);
                    self.store.toggle_saved_link(entry.id.clone());
                }
                Ok(SaveOutcome {
                    saved: remote,
                    synced: true,
                })
            }
            Err(e) => {
                log::warn!("could not sync saved state of {}: {e}", entry.id);
                Ok(SaveOutcome {
                    saved: local,
                    synced: false,
                })
            }
        }
    }

    /// Align the local saved set with the backend's list for the current user
    ///
    /// Returns the number of ids that changed.
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::Backend` if the saved list cannot be fetched.
    pub async fn sync_saved(&mut self) -> Result<usize> {
        let Some(user_id) = self.store.state().user_id().map(str::to_string) else {
            return Ok(0);
        };

        let remote: BTreeSet<EntryId> = self.backend.saved_links(&user_id).await?.into_iter().collect();
        let local = self.store.state().saved_links.clone();

        let changed: Vec<EntryId> = local.symmetric_difference(&remote).cloned().collect();
        for id in &changed {
            self.store.toggle_saved_link(id.clone());
        }
        Ok(changed.len())
    }

    /// Share an entry via the clipboard, falling back to plain text
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::UnknownEntry` if the entry does not exist.
    pub async fn share(&self, id: &str) -> Result<ShareOutcome> {
        let entry = self.entry(id).await?;
        Ok(actions::execute_share(self.clipboard.as_ref(), &entry))
    }
}
