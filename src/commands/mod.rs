//! Command implementations
//!
//! Each command is a module with an execute function that takes parsed CLI
//! args and runs against a [`BrowseSession`]. Results go to the writer they
//! are given; warnings go to stderr unless quiet.

use crate::backend::BackendError;
use crate::browse::{BrowseError, BrowseSession};
use crate::output::Style;

pub mod catalog;
pub mod completions;
pub mod entry;
pub mod import;
pub mod palette;
pub mod prefs;

pub use catalog::{categories, list, recent, saved};
pub use completions::execute as completions;
pub use entry::{open, save, share};
pub use import::execute as import;
pub use palette::execute as palette;
pub use prefs::{theme, view};

type Result<T> = std::result::Result<T, crate::ShelfError>;

/// Presentation settings from the session's store
#[must_use]
pub fn style(session: &BrowseSession, quiet: bool) -> Style {
    let state = session.store().state();
    Style {
        view: state.view_mode,
        dark_mode: state.dark_mode,
        quiet,
    }
}

/// Load the catalog, degrading to an empty listing when the backend is away
///
/// Network failures leave the previous (possibly empty) catalog in place.
/// A rejected session signs the user out. Neither is fatal.
///
/// # Errors
///
/// Returns any other backend or database failure.
pub async fn refresh(session: &mut BrowseSession, quiet: bool) -> Result<()> {
    match session.refresh().await {
        Ok(_) => Ok(()),
        Err(BrowseError::Backend(e)) if e.is_transient() => {
            log::warn!("catalog refresh failed: {e}");
            if !quiet {
                eprintln!("Catalog unavailable ({e}); try again later.");
            }
            Ok(())
        }
        Err(BrowseError::Backend(BackendError::Auth(reason))) => {
            log::warn!("backend rejected the session: {reason}");
            session.store_mut().set_user(None);
            if !quiet {
                eprintln!("Signed out: {reason}");
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
