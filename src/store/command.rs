//! Commands accepted by the store

use crate::models::{EntryId, SearchFiltersPatch, User, ViewModePatch};

/// One state mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCommand {
    /// Replace the theme flag
    SetDarkMode(bool),
    /// Shallow-merge into the current filters
    SetSearchFilters(SearchFiltersPatch),
    /// Reset filters to their defaults
    ClearFilters,
    /// Shallow-merge into the view mode
    SetViewMode(ViewModePatch),
    SetUser(Option<User>),
    SetSidebarOpen(bool),
    SetCommandPaletteOpen(bool),
    ToggleCommandPalette,
    /// Add the id if absent, remove it if present
    ToggleSavedLink(EntryId),
    /// Move the id to the front of the recent list
    AddToRecentlyViewed(EntryId),
}

impl StoreCommand {
    /// Whether applying this command changes the persisted subset of the state
    #[must_use]
    pub const fn touches_persisted(&self) -> bool {
        matches!(
            self,
            Self::SetDarkMode(_)
                | Self::SetViewMode(_)
                | Self::ToggleSavedLink(_)
                | Self::AddToRecentlyViewed(_)
        )
    }
}
