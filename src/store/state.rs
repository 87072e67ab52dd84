//! Store state and its reducer

use std::collections::BTreeSet;

use super::command::StoreCommand;
use crate::models::{EntryId, SearchFilters, User, ViewMode};

/// Maximum length of the recently-viewed list
pub const RECENTLY_VIEWED_LIMIT: usize = 10;

/// Everything the client owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub dark_mode: bool,
    pub search_filters: SearchFilters,
    pub view_mode: ViewMode,
    pub user: Option<User>,
    pub sidebar_open: bool,
    pub command_palette_open: bool,
    pub saved_links: BTreeSet<EntryId>,
    /// Most recent first, no duplicates
    pub recently_viewed: Vec<EntryId>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dark_mode: true,
            search_filters: SearchFilters::default(),
            view_mode: ViewMode::default(),
            user: None,
            sidebar_open: false,
            command_palette_open: false,
            saved_links: BTreeSet::new(),
            recently_viewed: Vec::new(),
        }
    }
}

impl AppState {
    /// The state after applying `command`
    #[must_use]
    pub fn reduce(&self, command: &StoreCommand) -> Self {
        let mut next = self.clone();
        match command {
            StoreCommand::SetDarkMode(dark_mode) => next.dark_mode = *dark_mode,
            StoreCommand::SetSearchFilters(patch) => next.search_filters.merge(patch.clone()),
            StoreCommand::ClearFilters => next.search_filters = SearchFilters::default(),
            StoreCommand::SetViewMode(patch) => next.view_mode = next.view_mode.merged(*patch),
            StoreCommand::SetUser(user) => next.user.clone_from(user),
            StoreCommand::SetSidebarOpen(open) => next.sidebar_open = *open,
            StoreCommand::SetCommandPaletteOpen(open) => next.command_palette_open = *open,
            StoreCommand::ToggleCommandPalette => {
                next.command_palette_open = !next.command_palette_open;
            }
            StoreCommand::ToggleSavedLink(id) => {
                if !next.saved_links.remove(id) {
                    next.saved_links.insert(id.clone());
                }
            }
            StoreCommand::AddToRecentlyViewed(id) => {
                next.recently_viewed = push_recent(&self.recently_viewed, id);
            }
        }
        next
    }

    #[must_use]
    pub fn is_saved(&self, id: &str) -> bool {
        self.saved_links.contains(id)
    }

    /// Id of the signed-in user, if any
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }
}

/// `id` followed by `recent` without `id`, truncated to the limit
pub(crate) fn push_recent(recent: &[EntryId], id: &str) -> Vec<EntryId> {
    std::iter::once(id.to_string())
        .chain(recent.iter().filter(|r| r.as_str() != id).cloned())
        .take(RECENTLY_VIEWED_LIMIT)
        .collect()
}
