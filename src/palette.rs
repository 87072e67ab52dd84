//! Command palette (global search overlay)
//!
//! The palette shows the catalog in groups: quick actions, categories,
//! featured, recently viewed, saved and all resources. An empty query lists
//! every group in its natural order; a query keeps only items that fuzzy
//! match it and orders each group by match quality. Matching uses nucleo
//! over titles, domains and category names.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use nucleo::{
    Config, Nucleo,
    pattern::{CaseMatching, Normalization},
};

use crate::models::{Category, Entry, EntryId, SearchFiltersPatch};
use crate::search::Catalog;
use crate::store::{AppState, AppStore};

const FEATURED_LIMIT: usize = 5;
const RECENT_LIMIT: usize = 5;
const SAVED_LIMIT: usize = 5;
const ALL_LIMIT: usize = 10;

/// One selectable row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteItem {
    Entry { id: EntryId, title: String, domain: String },
    Category { id: String, name: String },
    /// Apply the typed text as the listing query
    QuickSearch(String),
}

impl PaletteItem {
    fn from_entry(entry: &Entry) -> Self {
        Self::Entry {
            id: entry.id.clone(),
            title: entry.title.clone(),
            domain: entry.domain.clone(),
        }
    }

    fn from_category(category: &Category) -> Self {
        Self::Category {
            id: category.id.clone(),
            name: category.name.clone(),
        }
    }

    /// Text matched against the query
    fn haystack(&self) -> String {
        match self {
            Self::Entry { title, domain, .. } => format!("{title} {domain}"),
            Self::Category { name, .. } => name.clone(),
            Self::QuickSearch(query) => query.clone(),
        }
    }
}

impl fmt::Display for PaletteItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry { title, domain, .. } => write!(f, "{title} ({domain})"),
            Self::Category { name, .. } => f.write_str(name),
            Self::QuickSearch(query) => write!(f, "Search for \"{query}\""),
        }
    }
}

/// Palette section headings, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteGroup {
    QuickActions,
    Categories,
    Featured,
    Recent,
    Saved,
    AllResources,
}

impl PaletteGroup {
    #[must_use]
    pub const fn heading(self) -> &'static str {
        match self {
            Self::QuickActions => "Quick Actions",
            Self::Categories => "Categories",
            Self::Featured => "Featured",
            Self::Recent => "Recent",
            Self::Saved => "Saved",
            Self::AllResources => "All Resources",
        }
    }
}

/// A non-empty group of items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteSection {
    pub group: PaletteGroup,
    pub items: Vec<PaletteItem>,
}

/// What the caller should do after an item was chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteSelection {
    /// Click through to this entry
    OpenEntry(EntryId),
    /// The store's filters were updated; re-render the listing
    FiltersChanged,
}

/// Fuzzy-matchable palette contents for one catalog snapshot
pub struct CommandPalette {
    nucleo: Nucleo<u32>,
    items: Vec<PaletteItem>,
    entry_slots: HashMap<EntryId, usize>,
    category_slots: Vec<usize>,
    last_query: String,
}

impl fmt::Debug for CommandPalette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandPalette")
            .field("items", &self.items.len())
            .field("last_query", &self.last_query)
            .finish_non_exhaustive()
    }
}

impl CommandPalette {
    /// Index every catalog entry and category
    #[must_use]
    pub fn new(catalog: &Catalog, categories: &[Category]) -> Self {
        let mut items = Vec::with_capacity(catalog.len() + categories.len());
        let mut entry_slots = HashMap::with_capacity(catalog.len());
        for entry in catalog.entries() {
            entry_slots.insert(entry.id.clone(), items.len());
            items.push(PaletteItem::from_entry(entry));
        }
        let category_slots = categories
            .iter()
            .map(|category| {
                items.push(PaletteItem::from_category(category));
                items.len() - 1
            })
            .collect();

        let nucleo: Nucleo<u32> = Nucleo::new(Config::DEFAULT, Arc::new(|| {}), None, 1);
        let injector = nucleo.injector();
        for (idx, item) in items.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let _ = injector.push(idx as u32, |_, cols| {
                cols[0] = item.haystack().into();
            });
        }

        Self {
            nucleo,
            items,
            entry_slots,
            category_slots,
            last_query: String::new(),
        }
    }

    /// Rank of every item matching `query`, best first
    fn ranks(&mut self, query: &str) -> HashMap<usize, usize> {
        self.nucleo.pattern.reparse(
            0,
            query,
            CaseMatching::Smart,
            Normalization::Smart,
            query.starts_with(self.last_query.as_str()),
        );
        self.last_query = query.to_string();

        while self.nucleo.tick(10).running {}

        self.nucleo
            .snapshot()
            .matched_items(..)
            .enumerate()
            .map(|(rank, item)| (*item.data as usize, rank))
            .collect()
    }

    /// Grouped palette contents for `query`
    ///
    /// Groups without items are left out.
    pub fn sections(&mut self, query: &str, state: &AppState, catalog: &Catalog) -> Vec<PaletteSection> {
        let query = query.trim();
        let ranks = if query.is_empty() {
            None
        } else {
            Some(self.ranks(query))
        };

        let pick = |slots: Vec<usize>, limit: usize| -> Vec<PaletteItem> {
            let mut slots: Vec<usize> = match &ranks {
                None => slots,
                Some(ranks) => {
                    let mut kept: Vec<usize> =
                        slots.into_iter().filter(|s| ranks.contains_key(s)).collect();
                    kept.sort_by_key(|s| ranks[s]);
                    kept
                }
            };
            slots.truncate(limit);
            slots.into_iter().map(|s| self.items[s].clone()).collect()
        };

        let entry_slots = |entries: Vec<&Entry>| -> Vec<usize> {
            entries
                .into_iter()
                .filter_map(|e| self.entry_slots.get(&e.id).copied())
                .collect()
        };

        let featured: Vec<&Entry> = catalog.entries().iter().filter(|e| e.featured).collect();
        let recent = catalog.select(state.recently_viewed.iter().map(String::as_str));
        let saved = catalog.select(state.saved_links.iter().map(String::as_str));
        let all: Vec<&Entry> = catalog.entries().iter().collect();

        let mut sections = Vec::new();
        if !query.is_empty() {
            sections.push(PaletteSection {
                group: PaletteGroup::QuickActions,
                items: vec![PaletteItem::QuickSearch(query.to_string())],
            });
        }

        let groups = [
            (PaletteGroup::Categories, pick(self.category_slots.clone(), usize::MAX)),
            (PaletteGroup::Featured, pick(entry_slots(featured), FEATURED_LIMIT)),
            (PaletteGroup::Recent, pick(entry_slots(recent), RECENT_LIMIT)),
            (PaletteGroup::Saved, pick(entry_slots(saved), SAVED_LIMIT)),
            (PaletteGroup::AllResources, pick(entry_slots(all), ALL_LIMIT)),
        ];
        sections.extend(
            groups
                .into_iter()
                .filter(|(_, items)| !items.is_empty())
                .map(|(group, items)| PaletteSection { group, items }),
        );
        sections
    }
}

/// Apply a chosen item to the store and close the palette
///
/// Categories replace the category filter; quick search replaces the query.
pub fn select(item: &PaletteItem, store: &mut AppStore) -> PaletteSelection {
    store.set_command_palette_open(false);
    match item {
        PaletteItem::Entry { id, .. } => PaletteSelection::OpenEntry(id.clone()),
        PaletteItem::Category { id, .. } => {
            store.set_search_filters(SearchFiltersPatch::categories([id.clone()]));
            PaletteSelection::FiltersChanged
        }
        PaletteItem::QuickSearch(query) => {
            store.set_search_filters(SearchFiltersPatch::query(query.clone()));
            PaletteSelection::FiltersChanged
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_catalog;

    fn fixture() -> (Catalog, Vec<Category>) {
        let document = sample_catalog();
        (Catalog::new(document.entries), document.categories)
    }

    fn groups(sections: &[PaletteSection]) -> Vec<PaletteGroup> {
        sections.iter().map(|s| s.group).collect()
    }

    #[test]
    fn test_empty_query_lists_groups() {
        let (catalog, categories) = fixture();
        let mut palette = CommandPalette::new(&catalog, &categories);
        let mut store = AppStore::new();
        store.add_to_recently_viewed("neon");

        let sections = palette.sections("", store.state(), &catalog);
        assert_eq!(
            groups(&sections),
            vec![
                PaletteGroup::Categories,
                PaletteGroup::Featured,
                PaletteGroup::Recent,
                PaletteGroup::AllResources
            ]
        );
        let featured = &sections[1].items;
        assert_eq!(featured.len(), 2);
    }

    #[test]
    fn test_query_filters_and_adds_quick_action() {
        let (catalog, categories) = fixture();
        let mut palette = CommandPalette::new(&catalog, &categories);
        let store = AppStore::new();

        let sections = palette.sections("neon", store.state(), &catalog);
        assert_eq!(sections[0].group, PaletteGroup::QuickActions);
        assert_eq!(sections[0].items, vec![PaletteItem::QuickSearch("neon".into())]);

        let all = sections
            .iter()
            .find(|s| s.group == PaletteGroup::AllResources)
            .unwrap();
        assert!(matches!(&all.items[0], PaletteItem::Entry { id, .. } if id == "neon"));
        assert!(!sections.iter().any(|s| s.group == PaletteGroup::Categories));
    }

    #[test]
    fn test_query_matches_categories() {
        let (catalog, categories) = fixture();
        let mut palette = CommandPalette::new(&catalog, &categories);
        let store = AppStore::new();

        let sections = palette.sections("hosting", store.state(), &catalog);
        let cats = sections
            .iter()
            .find(|s| s.group == PaletteGroup::Categories)
            .unwrap();
        assert_eq!(
            cats.items,
            vec![PaletteItem::Category {
                id: "cat-host".into(),
                name: "Hosting".into()
            }]
        );
    }

    #[test]
    fn test_select_updates_store() {
        let mut store = AppStore::new();
        store.set_command_palette_open(true);

        let outcome = select(
            &PaletteItem::Category {
                id: "cat-db".into(),
                name: "Databases".into(),
            },
            &mut store,
        );
        assert_eq!(outcome, PaletteSelection::FiltersChanged);
        assert!(store.state().search_filters.categories.contains("cat-db"));
        assert!(!store.state().command_palette_open);

        select(&PaletteItem::QuickSearch("postgres".into()), &mut store);
        assert_eq!(store.state().search_filters.query, "postgres");

        let outcome = select(
            &PaletteItem::Entry {
                id: "neon".into(),
                title: "Neon".into(),
                domain: "neon.tech".into(),
            },
            &mut store,
        );
        assert_eq!(outcome, PaletteSelection::OpenEntry("neon".into()));
    }
}
