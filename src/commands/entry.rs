//! Open, save and share commands

use std::io::Write;

use crate::browse::{ActionOutcome, BrowseSession, ShareOutcome};

use super::Result;

/// Execute the open command - record the visit, then open the link
///
/// A browser that fails to launch is reported but not an error; the URL is
/// printed instead.
///
/// # Errors
/// Returns an error if the entry does not exist
pub async fn open(
    session: &mut BrowseSession,
    id: &str,
    quiet: bool,
    out: &mut dyn Write,
) -> Result<()> {
    match session.click_through(id).await? {
        ActionOutcome::Success(message) => {
            if !quiet {
                writeln!(out, "{message}")?;
            }
        }
        ActionOutcome::Failed(message) => {
            eprintln!("{message}");
            let entry = session.entry(id).await?;
            writeln!(out, "{}", entry.url)?;
        }
    }
    Ok(())
}

/// Execute the save command - toggle the saved flag
///
/// # Errors
/// Returns an error if the entry does not exist
pub async fn save(
    session: &mut BrowseSession,
    id: &str,
    quiet: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let outcome = session.toggle_save(id).await?;
    if quiet {
        return Ok(());
    }

    let verb = if outcome.saved { "Saved" } else { "Removed from saved:" };
    writeln!(out, "{verb} {id}")?;
    if !outcome.synced && session.store().state().user_id().is_some() {
        writeln!(out, "(kept locally; the backend could not be reached)")?;
    }
    Ok(())
}

/// Execute the share command - clipboard first, printed text otherwise
///
/// # Errors
/// Returns an error if the entry does not exist
pub async fn share(
    session: &BrowseSession,
    id: &str,
    quiet: bool,
    out: &mut dyn Write,
) -> Result<()> {
    match session.share(id).await? {
        ShareOutcome::Copied(text) => {
            if !quiet {
                writeln!(out, "Copied to clipboard:\n{text}")?;
            }
        }
        ShareOutcome::Fallback(text) => writeln!(out, "{text}")?,
    }
    Ok(())
}
