//! View and theme commands
//!
//! Both update persisted preferences through the store; with no arguments
//! they print the current value.

use std::io::Write;

use crate::browse::BrowseSession;
use crate::models::ViewModePatch;

use super::Result;

/// Execute the view command
///
/// # Errors
/// Returns an error if output cannot be written
pub fn view(
    session: &mut BrowseSession,
    patch: Option<ViewModePatch>,
    quiet: bool,
    out: &mut dyn Write,
) -> Result<()> {
    if let Some(patch) = patch {
        session.store_mut().set_view_mode(patch);
        if quiet {
            return Ok(());
        }
    }

    let view = session.store().state().view_mode;
    writeln!(
        out,
        "layout: {}, density: {}",
        view.layout.as_str(),
        view.density.as_str()
    )?;
    Ok(())
}

/// Execute the theme command
///
/// # Errors
/// Returns an error if output cannot be written
pub fn theme(
    session: &mut BrowseSession,
    dark_mode: Option<bool>,
    quiet: bool,
    out: &mut dyn Write,
) -> Result<()> {
    if let Some(dark_mode) = dark_mode {
        session.store_mut().set_dark_mode(dark_mode);
        if quiet {
            return Ok(());
        }
    }

    let name = if session.store().state().dark_mode {
        "dark"
    } else {
        "light"
    };
    writeln!(out, "theme: {name}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::backend::{Backend, LocalBackend};
    use crate::db::Database;
    use crate::models::{Density, Layout};
    use crate::store::AppStore;
    use crate::testing::{TestDb, headless_session};

    #[test]
    fn test_view_merges_patch() {
        let (mut session, _, _) = headless_session();
        let mut out = Vec::new();
        view(
            &mut session,
            Some(ViewModePatch {
                layout: Some(Layout::List),
                density: None,
            }),
            false,
            &mut out,
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "layout: list, density: comfortable\n"
        );
        assert_eq!(session.store().state().view_mode.density, Density::Comfortable);
    }

    #[test]
    fn test_theme_persists_through_session() {
        let test_db = TestDb::temporary();
        let db = Arc::new(Database::open(test_db.path().join("shelf")).unwrap());
        let backend: Arc<dyn Backend> = Arc::new(LocalBackend::new(Arc::clone(&db)));
        let mut session =
            BrowseSession::new(backend, AppStore::new()).persist_to(Arc::clone(&db));

        let mut out = Vec::new();
        theme(&mut session, Some(true), true, &mut out).unwrap();
        assert!(out.is_empty());

        let persisted = db.load_state().unwrap().unwrap();
        assert!(persisted.dark_mode);
    }
}
