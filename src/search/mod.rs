//! Client-side search over the cached catalog
//!
//! Two layers compose here:
//!
//! 1. **Fuzzy Search Index** ([`index`]): a weighted, edit-distance tolerant
//!    matcher over title, description, tags and category name. It is built for
//!    one [`Catalog`] version and refuses to answer for any other.
//! 2. **Filter/Sort Pipeline** ([`pipeline`]): text search, then category,
//!    tag, featured and verified filters, then a stable sort.
//!
//! ```
//! use linkshelf::models::{Entry, SearchFilters, SortBy};
//! use linkshelf::search::apply;
//!
//! let entries = vec![
//!     Entry::new("1", "Vercel", "https://vercel.com").with_click_count(100),
//!     Entry::new("2", "Supabase", "https://supabase.com").with_click_count(50),
//! ];
//! let filters = SearchFilters { sort_by: SortBy::Popular, ..SearchFilters::default() };
//! let view = apply(&entries, &filters);
//! assert_eq!(view[0].id, "1");
//! ```

pub mod catalog;
pub mod collate;
pub mod error;
pub mod index;
pub mod matcher;
pub mod pipeline;

pub use catalog::{Catalog, CatalogVersion};
pub use error::SearchError;
pub use index::{FieldWeights, ScoredMatch, SearchIndex, SearchOptions, SearchOutcome};
pub use matcher::{ApproximateMatcher, FuzzyMatcher};
pub use pipeline::{FilterPipeline, apply};
