//! Entity model for the link directory
//!
//! Plain data types shared by every other module:
//!
//! - **`Entry`**: a curated resource (tool, API, service) with its tags and counters
//! - **`Category`**: a named grouping with a display order
//! - **`User`**: the signed-in profile, as returned by the hosted backend
//! - **`SearchFilters`**: the transient filter/sort specification driving the pipeline
//! - **`ViewMode`**: persisted layout preferences
//!
//! Entries and categories are owned by the backend and only cached here.
//! Filters, view preferences and the saved/recent collections are owned by
//! the [`AppStore`](crate::store::AppStore).

pub mod category;
pub mod entry;
pub mod error;
pub mod filters;
pub mod user;
pub mod view;

pub use category::Category;
pub use entry::{CategoryRef, Entry, EntryId, EntryStatus};
pub use error::ModelError;
pub use filters::{SearchFilters, SearchFiltersPatch, SortBy};
pub use user::{User, UserRole};
pub use view::{Density, Layout, ViewMode, ViewModePatch};
