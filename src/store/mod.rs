//! Client state store
//!
//! One explicit container for everything the client owns: theme, the live
//! [`SearchFilters`](crate::models::SearchFilters), view preferences, the
//! saved-entry set, the recently-viewed list, panel toggles and the current
//! user. It is passed around by reference rather than living in a global.
//!
//! All writes go through [`AppStore::dispatch`] with a [`StoreCommand`]. Each
//! command is reduced to a complete new [`AppState`] before it replaces the
//! old one, so readers never see a half-applied update. Subscribers are
//! notified after every command, in dispatch order.
//!
//! Only a subset of the state survives a restart; see [`persist`].

pub mod command;
pub mod persist;
pub mod state;

pub use command::StoreCommand;
pub use persist::PersistedState;
pub use state::{AppState, RECENTLY_VIEWED_LIMIT};

use crate::models::{EntryId, SearchFiltersPatch, User, ViewModePatch};

/// Handle returned by [`AppStore::subscribe`]
pub type SubscriptionId = u64;

type Listener = Box<dyn FnMut(&AppState, &StoreCommand)>;

/// The state container
pub struct AppStore {
    state: AppState,
    revision: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AppStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppStore")
            .field("state", &self.state)
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl AppStore {
    /// Store with default state
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(AppState::default())
    }

    /// Store rehydrated from a persisted snapshot
    #[must_use]
    pub fn from_persisted(persisted: PersistedState) -> Self {
        Self::with_state(persisted.into_state())
    }

    fn with_state(state: AppState) -> Self {
        Self {
            state,
            revision: 0,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Number of commands applied so far
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// The part of the state that is kept across sessions
    #[must_use]
    pub fn persisted(&self) -> PersistedState {
        PersistedState::from_state(&self.state)
    }

    /// Apply `command` and notify subscribers
    pub fn dispatch(&mut self, command: StoreCommand) {
        self.state = self.state.reduce(&command);
        self.revision += 1;
        log::trace!("store r{}: {command:?}", self.revision);

        for (_, listener) in &mut self.listeners {
            listener(&self.state, &command);
        }
    }

    /// Register `listener` to run after every applied command
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&AppState, &StoreCommand) + 'static,
    {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener; returns false if `id` was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    pub fn set_dark_mode(&mut self, dark_mode: bool) {
        self.dispatch(StoreCommand::SetDarkMode(dark_mode));
    }

    pub fn set_search_filters(&mut self, patch: SearchFiltersPatch) {
        self.dispatch(StoreCommand::SetSearchFilters(patch));
    }

    pub fn clear_filters(&mut self) {
        self.dispatch(StoreCommand::ClearFilters);
    }

    pub fn set_view_mode(&mut self, patch: ViewModePatch) {
        self.dispatch(StoreCommand::SetViewMode(patch));
    }

    pub fn set_user(&mut self, user: Option<User>) {
        self.dispatch(StoreCommand::SetUser(user));
    }

    pub fn set_sidebar_open(&mut self, open: bool) {
        self.dispatch(StoreCommand::SetSidebarOpen(open));
    }

    pub fn set_command_palette_open(&mut self, open: bool) {
        self.dispatch(StoreCommand::SetCommandPaletteOpen(open));
    }

    pub fn toggle_command_palette(&mut self) {
        self.dispatch(StoreCommand::ToggleCommandPalette);
    }

    pub fn toggle_saved_link(&mut self, id: impl Into<EntryId>) {
        self.dispatch(StoreCommand::ToggleSavedLink(id.into()));
    }

    pub fn add_to_recently_viewed(&mut self, id: impl Into<EntryId>) {
        self.dispatch(StoreCommand::AddToRecentlyViewed(id.into()));
    }
}
