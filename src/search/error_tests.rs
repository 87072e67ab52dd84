//! Unit tests for search error types

#[cfg(test)]
mod tests {
    use crate::models::Entry;
    use crate::search::{Catalog, SearchError, SearchIndex, SearchOptions};

    #[test]
    fn test_stale_index_display() {
        let old = Catalog::new(vec![Entry::new("1", "a", "https://a.dev")]);
        let new = Catalog::new(vec![Entry::new("1", "a", "https://a.dev")]);
        let index = SearchIndex::build(&old, SearchOptions::default());

        let err = index.search(&new, "abc").unwrap_err();
        assert_eq!(
            err,
            SearchError::StaleIndex {
                index: old.version(),
                catalog: new.version()
            }
        );
        let message = err.to_string();
        assert!(message.contains(&old.version().to_string()));
        assert!(message.contains(&new.version().to_string()));
    }

    #[test]
    fn test_error_is_std_error() {
        fn assert_error<E: std::error::Error>(_: &E) {}
        let catalog = Catalog::new(Vec::new());
        let err = SearchError::StaleIndex {
            index: catalog.version(),
            catalog: catalog.version(),
        };
        assert_error(&err);
    }
}
