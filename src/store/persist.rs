//! Persisted subset of the store
//!
//! Only the theme, view mode, saved entries and recently-viewed list survive
//! a restart. Filters, panel flags and the user session are rebuilt fresh.
//!
//! The schema uses plain sequences throughout; set semantics for the saved
//! entries are restored (and enforced) on load.

use std::collections::BTreeSet;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use super::state::{AppState, RECENTLY_VIEWED_LIMIT, push_recent};
use crate::models::{EntryId, ViewMode};

/// Current persisted schema version
pub const SCHEMA_VERSION: u32 = 1;

/// What is written to disk between sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct PersistedState {
    #[serde(default = "schema_version")]
    pub version: u32,
    pub dark_mode: bool,
    pub view_mode: ViewMode,
    /// Saved entry ids, in ascending order
    #[serde(default)]
    pub saved_links: Vec<EntryId>,
    /// Most recent first
    #[serde(default)]
    pub recently_viewed: Vec<EntryId>,
}

const fn schema_version() -> u32 {
    SCHEMA_VERSION
}

impl Default for PersistedState {
    fn default() -> Self {
        Self::from_state(&AppState::default())
    }
}

impl PersistedState {
    /// Extract the persisted fields from `state`
    #[must_use]
    pub fn from_state(state: &AppState) -> Self {
        Self {
            version: SCHEMA_VERSION,
            dark_mode: state.dark_mode,
            view_mode: state.view_mode,
            saved_links: state.saved_links.iter().cloned().collect(),
            recently_viewed: state.recently_viewed.clone(),
        }
    }

    /// Rebuild a full state, everything else at its default
    ///
    /// Duplicate saved ids collapse into one; the recent list is deduplicated
    /// (first occurrence wins) and cut to the limit.
    #[must_use]
    pub fn into_state(self) -> AppState {
        let saved_links: BTreeSet<EntryId> = self.saved_links.into_iter().collect();

        let mut recently_viewed: Vec<EntryId> = Vec::new();
        for id in self.recently_viewed.iter().rev() {
            recently_viewed = push_recent(&recently_viewed, id);
        }
        recently_viewed.truncate(RECENTLY_VIEWED_LIMIT);

        AppState {
            dark_mode: self.dark_mode,
            view_mode: self.view_mode,
            saved_links,
            recently_viewed,
            ..AppState::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Density, Layout, SearchFiltersPatch, User, ViewModePatch};
    use crate::store::AppStore;

    #[test]
    fn test_round_trip_keeps_only_persisted_fields() {
        let mut store = AppStore::new();
        store.set_dark_mode(false);
        store.set_view_mode(ViewModePatch {
            layout: Some(Layout::List),
            density: Some(Density::Compact),
        });
        store.toggle_saved_link("b");
        store.toggle_saved_link("a");
        store.add_to_recently_viewed("x");
        store.set_search_filters(SearchFiltersPatch::query("neon"));
        store.set_sidebar_open(true);
        store.set_user(Some(User::new("u1", "u1@example.com")));

        let bytes =
            bincode::encode_to_vec(store.persisted(), bincode::config::standard()).unwrap();
        let (decoded, _): (PersistedState, usize) =
            bincode::decode_from_slice(&bytes, bincode::config::standard()).unwrap();
        let restored = AppStore::from_persisted(decoded);

        assert_eq!(restored.state().saved_links, store.state().saved_links);
        assert_eq!(restored.state().view_mode, store.state().view_mode);
        assert_eq!(restored.state().recently_viewed, vec!["x"]);
        assert!(!restored.state().dark_mode);
        assert!(restored.state().search_filters.is_unfiltered());
        assert!(!restored.state().sidebar_open);
        assert!(restored.state().user.is_none());
    }

    #[test]
    fn test_saved_links_persist_as_sequence() {
        let mut store = AppStore::new();
        store.toggle_saved_link("b");
        store.toggle_saved_link("a");
        let json = serde_json::to_value(store.persisted()).unwrap();
        assert_eq!(json["saved_links"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_load_enforces_set_and_list_invariants() {
        let persisted = PersistedState {
            saved_links: vec!["a".into(), "a".into(), "b".into()],
            recently_viewed: (0..15)
                .map(|i| format!("id-{}", i % 12))
                .collect(),
            ..PersistedState::default()
        };
        let state = persisted.into_state();
        assert_eq!(state.saved_links.len(), 2);
        assert_eq!(state.recently_viewed.len(), RECENTLY_VIEWED_LIMIT);
        assert_eq!(state.recently_viewed[0], "id-0");
        let unique: std::collections::HashSet<_> = state.recently_viewed.iter().collect();
        assert_eq!(unique.len(), state.recently_viewed.len());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let persisted: PersistedState = serde_json::from_str(
            r#"{"dark_mode": true, "view_mode": {"type": "grid", "density": "compact"}}"#,
        )
        .unwrap();
        assert_eq!(persisted.version, SCHEMA_VERSION);
        assert!(persisted.saved_links.is_empty());
    }
}
