//! Search-specific error types
//!
//! Filtering itself never fails: bad sort keys fall back to `newest` and
//! queries that are too short skip text matching. The only hard error is
//! asking an index about a catalog it was not built from.

use thiserror::Error;

use super::catalog::CatalogVersion;

/// Search-specific errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    /// The index was built for a different catalog version
    #[error("Search index built for catalog {index} queried with catalog {catalog}")]
    StaleIndex {
        index: CatalogVersion,
        catalog: CatalogVersion,
    },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
