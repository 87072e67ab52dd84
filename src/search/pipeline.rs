//! Filter and sort pipeline
//!
//! Steps run in a fixed order:
//!
//! 1. text search against the *full* catalog (when the query has usable tokens)
//! 2. category filter (entry's category id in the selected set)
//! 3. tag filter (at least one selected tag)
//! 4. featured-only
//! 5. verified-only
//! 6. stable sort by the requested key
//!
//! The pipeline never mutates the catalog. [`FilterPipeline`] keeps the
//! search index between runs and rebuilds it whenever the catalog version
//! changes; [`apply`] is the one-shot form.

use std::cmp::Ordering;
use std::sync::Arc;

use super::catalog::Catalog;
use super::collate;
use super::index::{SearchIndex, SearchOptions};
use super::matcher::{ApproximateMatcher, FuzzyMatcher};
use crate::models::{Entry, SearchFilters, SortBy};

/// Filter and sort `entries` according to `filters`
///
/// Builds a throwaway index when the query needs one. Callers that filter
/// the same list repeatedly should keep a [`FilterPipeline`] instead.
#[must_use]
pub fn apply(entries: &[Entry], filters: &SearchFilters) -> Vec<Entry> {
    let catalog = Catalog::new(entries.to_vec());
    FilterPipeline::default().run(&catalog, filters)
}

/// Reusable pipeline holding the index for the latest catalog
pub struct FilterPipeline {
    options: SearchOptions,
    matcher: Arc<dyn FuzzyMatcher>,
    index: Option<SearchIndex>,
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new(SearchOptions::default())
    }
}

impl FilterPipeline {
    #[must_use]
    pub fn new(options: SearchOptions) -> Self {
        Self::with_matcher(options, Arc::new(ApproximateMatcher::new(options.threshold)))
    }

    /// Use a different fuzzy matcher for text search
    #[must_use]
    pub fn with_matcher(options: SearchOptions, matcher: Arc<dyn FuzzyMatcher>) -> Self {
        Self {
            options,
            matcher,
            index: None,
        }
    }

    /// Index for `catalog`, rebuilt if the cached one belongs to another version
    pub fn index_for(&mut self, catalog: &Catalog) -> &SearchIndex {
        let stale = self
            .index
            .as_ref()
            .is_some_and(|index| index.version() != catalog.version());
        if stale {
            log::debug!("catalog changed to {}, rebuilding search index", catalog.version());
            self.index = None;
        }

        self.index.get_or_insert_with(|| {
            SearchIndex::with_matcher(catalog, self.options, Arc::clone(&self.matcher))
        })
    }

    /// Produce the filtered, sorted view of `catalog`
    pub fn run(&mut self, catalog: &Catalog, filters: &SearchFilters) -> Vec<Entry> {
        self.run_refs(catalog, filters).into_iter().cloned().collect()
    }

    /// Like [`run`](Self::run), borrowing from the catalog
    pub fn run_refs<'a>(&mut self, catalog: &'a Catalog, filters: &SearchFilters) -> Vec<&'a Entry> {
        let query = filters.trimmed_query();

        let mut working: Vec<&Entry> = if query.is_empty() {
            catalog.entries().iter().collect()
        } else {
            match self.index_for(catalog).search(catalog, query) {
                Ok(outcome) => outcome.entries(catalog),
                Err(e) => {
                    log::warn!("text search skipped: {e}");
                    catalog.entries().iter().collect()
                }
            }
        };

        if !filters.categories.is_empty() {
            working.retain(|e| e.category_id().is_some_and(|id| filters.categories.contains(id)));
        }

        if !filters.tags.is_empty() {
            working.retain(|e| e.has_any_tag(filters.tags.iter()));
        }

        if filters.featured {
            working.retain(|e| e.featured);
        }

        if filters.verified {
            working.retain(|e| e.verified);
        }

        sort_entries(&mut working, filters.sort_by);
        working
    }
}

/// Stable sort of `entries` by `sort_by`
pub fn sort_entries(entries: &mut [&Entry], sort_by: SortBy) {
    let compare: fn(&&Entry, &&Entry) -> Ordering = match sort_by {
        SortBy::Popular => |a, b| b.click_count.cmp(&a.click_count),
        SortBy::Rating => |a, b| b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal),
        SortBy::Alphabetical => |a, b| collate::compare(&a.title, &b.title),
        SortBy::Newest => |a, b| b.created_at.cmp(&a.created_at),
    };
    entries.sort_by(compare);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryRef, SearchFiltersPatch};
    use chrono::{Duration, TimeZone, Utc};

    fn at(day: i64) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day)
    }

    fn category(id: &str) -> CategoryRef {
        CategoryRef {
            id: id.to_string(),
            name: id.to_uppercase(),
            slug: id.to_string(),
            color: None,
        }
    }

    fn two_entries() -> Vec<Entry> {
        vec![
            Entry::new("1", "Vercel", "https://vercel.com")
                .with_click_count(100)
                .with_featured(true),
            Entry::new("2", "Supabase", "https://supabase.com")
                .with_click_count(50)
                .with_featured(false),
        ]
    }

    fn ids(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_featured_popular_example() {
        let filters = SearchFilters {
            featured: true,
            sort_by: SortBy::Popular,
            ..SearchFilters::default()
        };
        let entries = two_entries();
        let result = apply(&entries, &filters);
        assert_eq!(result, vec![entries[0].clone()]);
    }

    #[test]
    fn test_typo_query_example() {
        let filters = SearchFilters {
            query: "Suprabase".to_string(),
            ..SearchFilters::default()
        };
        assert_eq!(ids(&apply(&two_entries(), &filters)), vec!["2"]);

        let filters = SearchFilters {
            query: "zzz".to_string(),
            ..SearchFilters::default()
        };
        assert!(apply(&two_entries(), &filters).is_empty());
    }

    #[test]
    fn test_empty_input() {
        let filters = SearchFilters {
            query: "anything".to_string(),
            featured: true,
            ..SearchFilters::default()
        };
        assert!(apply(&[], &filters).is_empty());
    }

    #[test]
    fn test_unfiltered_only_reorders() {
        let entries = vec![
            Entry::new("a", "a", "https://a.dev").with_created_at(at(1)),
            Entry::new("b", "b", "https://b.dev").with_created_at(at(3)),
            Entry::new("c", "c", "https://c.dev").with_created_at(at(2)),
        ];
        let result = apply(&entries, &SearchFilters::default());
        assert_eq!(result.len(), entries.len());
        assert_eq!(ids(&result), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_category_filter_sound_and_complete() {
        let entries = vec![
            Entry::new("1", "a", "https://a.dev").with_category(category("dev")),
            Entry::new("2", "b", "https://b.dev").with_category(category("design")),
            Entry::new("3", "c", "https://c.dev"),
            Entry::new("4", "d", "https://d.dev").with_category(category("ai")),
        ];
        let mut filters = SearchFilters::default();
        filters.merge(SearchFiltersPatch::categories(["dev", "ai"]));

        let result = apply(&entries, &filters);
        assert!(
            result
                .iter()
                .all(|e| e.category_id().is_some_and(|id| filters.categories.contains(id)))
        );
        let mut got = ids(&result);
        got.sort_unstable();
        assert_eq!(got, vec!["1", "4"]);
    }

    #[test]
    fn test_tags_use_or_semantics() {
        let entries = vec![
            Entry::new("1", "a", "https://a.dev").with_tags(["ai"]),
            Entry::new("2", "b", "https://b.dev").with_tags(["db"]),
            Entry::new("3", "c", "https://c.dev").with_tags(["css"]),
        ];
        let mut filters = SearchFilters::default();
        filters.merge(SearchFiltersPatch::tags(["ai", "db"]));
        filters.sort_by = SortBy::Alphabetical;

        assert_eq!(ids(&apply(&entries, &filters)), vec!["1", "2"]);
    }

    #[test]
    fn test_verified_filter() {
        let entries = vec![
            Entry::new("1", "a", "https://a.dev").with_verified(true),
            Entry::new("2", "b", "https://b.dev"),
        ];
        let filters = SearchFilters {
            verified: true,
            ..SearchFilters::default()
        };
        assert_eq!(ids(&apply(&entries, &filters)), vec!["1"]);
    }

    #[test]
    fn test_alphabetical_is_locale_aware() {
        let entries = vec![
            Entry::new("1", "banana", "https://a.dev"),
            Entry::new("2", "Apple", "https://b.dev"),
            Entry::new("3", "cherry", "https://c.dev"),
        ];
        let filters = SearchFilters {
            sort_by: SortBy::Alphabetical,
            ..SearchFilters::default()
        };
        let titles: Vec<_> = apply(&entries, &filters)
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["Apple", "banana", "cherry"]);
    }

    #[test]
    fn test_sorts_are_stable() {
        let entries = vec![
            Entry::new("1", "a", "https://a.dev").with_click_count(5).with_rating(4.0),
            Entry::new("2", "b", "https://b.dev").with_click_count(9).with_rating(4.0),
            Entry::new("3", "c", "https://c.dev").with_click_count(5).with_rating(4.0),
        ];
        let popular = SearchFilters {
            sort_by: SortBy::Popular,
            ..SearchFilters::default()
        };
        assert_eq!(ids(&apply(&entries, &popular)), vec!["2", "1", "3"]);

        let rating = SearchFilters {
            sort_by: SortBy::Rating,
            ..SearchFilters::default()
        };
        assert_eq!(ids(&apply(&entries, &rating)), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_signed_zero_ratings_tie() {
        let mut negative = Entry::new("1", "a", "https://a.dev");
        negative.rating = -0.0;
        let entries = vec![negative, Entry::new("2", "b", "https://b.dev").with_rating(0.0)];
        let rating = SearchFilters {
            sort_by: SortBy::Rating,
            ..SearchFilters::default()
        };
        assert_eq!(ids(&apply(&entries, &rating)), vec!["1", "2"]);
    }

    #[test]
    fn test_search_runs_against_full_catalog() {
        let entries = vec![
            Entry::new("1", "Neon", "https://neon.tech").with_tags(["db"]),
            Entry::new("2", "Neon docs", "https://neon.tech/docs").with_tags(["docs"]),
        ];
        let filters = SearchFilters {
            query: "neon".to_string(),
            tags: ["docs".to_string()].into(),
            ..SearchFilters::default()
        };
        assert_eq!(ids(&apply(&entries, &filters)), vec!["2"]);
    }

    #[test]
    fn test_index_rebuilt_for_new_catalog() {
        let mut pipeline = FilterPipeline::default();
        let first = Catalog::new(two_entries());
        let v1 = pipeline.index_for(&first).version();
        assert_eq!(v1, first.version());
        assert_eq!(pipeline.index_for(&first).version(), v1);

        let second = Catalog::new(vec![Entry::new("3", "Neon", "https://neon.tech")]);
        let filters = SearchFilters {
            query: "neon".to_string(),
            ..SearchFilters::default()
        };
        let result = pipeline.run(&second, &filters);
        assert_eq!(ids(&result), vec!["3"]);
        assert_eq!(pipeline.index_for(&second).version(), second.version());
    }
}
