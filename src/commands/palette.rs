//! Palette command - grouped quick-jump over the catalog
//!
//! Without `--interactive` the palette is printed once (or a numbered row is
//! chosen with `--pick`). Interactive mode reads keys in raw mode: typing
//! edits the query, arrows move, Enter chooses, and the global shortcuts
//! (ctrl-k, esc) close the palette.

use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{self, Clear, ClearType},
};

use crate::browse::BrowseSession;
use crate::keybinds::{KeyRoute, KeyRouter};
use crate::models::Entry;
use crate::output::{self, OutputFormat};
use crate::palette::{self, CommandPalette, PaletteItem, PaletteSection, PaletteSelection};
use crate::ShelfError;

use super::{Result, entry, refresh, style};

fn flatten(sections: &[PaletteSection]) -> Vec<PaletteItem> {
    sections
        .iter()
        .flat_map(|section| section.items.iter().cloned())
        .collect()
}

/// Execute the palette command
///
/// # Errors
/// Returns an error if `pick` is out of range, the terminal cannot be
/// driven, or acting on the chosen item fails
pub async fn execute(
    session: &mut BrowseSession,
    query: Option<&str>,
    pick: Option<usize>,
    interactive: bool,
    router: &KeyRouter,
    quiet: bool,
    out: &mut dyn Write,
) -> Result<()> {
    refresh(session, quiet).await?;
    let categories = match session.categories().await {
        Ok(categories) => categories,
        Err(e) => {
            log::warn!("palette without categories: {e}");
            Vec::new()
        }
    };

    let mut palette = CommandPalette::new(session.catalog(), &categories);
    session.store_mut().set_command_palette_open(true);
    let query = query.unwrap_or_default();

    let chosen = if interactive {
        run_interactive(&mut palette, session, router, query)?
    } else {
        let sections = palette.sections(query, session.store().state(), session.catalog());
        match pick {
            Some(number) => {
                let item = flatten(&sections)
                    .into_iter()
                    .nth(number.saturating_sub(1))
                    .filter(|_| number > 0)
                    .ok_or_else(|| ShelfError::InvalidInput(format!("No palette row {number}")))?;
                Some(item)
            }
            None => {
                writeln!(out, "{}", output::render_palette(&sections, None))?;
                return Ok(());
            }
        }
    };

    match chosen {
        Some(item) => choose(session, &item, quiet, out).await,
        None => {
            session.store_mut().set_command_palette_open(false);
            Ok(())
        }
    }
}

/// Apply `item` and carry out the resulting action
async fn choose(
    session: &mut BrowseSession,
    item: &PaletteItem,
    quiet: bool,
    out: &mut dyn Write,
) -> Result<()> {
    match palette::select(item, session.store_mut()) {
        PaletteSelection::OpenEntry(id) => entry::open(session, &id, quiet, out).await,
        PaletteSelection::FiltersChanged => {
            let entries = session.visible();
            let refs: Vec<&Entry> = entries.iter().collect();
            let style = style(session, quiet);
            let text = output::render_entries(
                &refs,
                OutputFormat::Text,
                &style,
                &session.store().state().saved_links,
            )?;
            if !text.is_empty() {
                writeln!(out, "{text}")?;
            }
            Ok(())
        }
    }
}

fn run_interactive(
    palette: &mut CommandPalette,
    session: &mut BrowseSession,
    router: &KeyRouter,
    initial: &str,
) -> Result<Option<PaletteItem>> {
    terminal::enable_raw_mode()?;
    let result = interactive_loop(palette, session, router, initial);
    let restored = terminal::disable_raw_mode();
    let chosen = result?;
    restored?;
    Ok(chosen)
}

fn interactive_loop(
    palette: &mut CommandPalette,
    session: &mut BrowseSession,
    router: &KeyRouter,
    initial: &str,
) -> Result<Option<PaletteItem>> {
    let mut stdout = io::stdout();
    let mut query = initial.to_string();
    let mut cursor = 0usize;

    loop {
        let sections = palette.sections(&query, session.store().state(), session.catalog());
        let items = flatten(&sections);
        cursor = cursor.min(items.len().saturating_sub(1));
        draw(&mut stdout, &query, &sections, cursor)?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if let KeyRoute::Global(action) = router.dispatch(&key, session.store_mut()) {
            log::debug!("palette shortcut {action:?}");
            if !session.store().state().command_palette_open {
                return Ok(None);
            }
            continue;
        }

        match key.code {
            KeyCode::Enter => return Ok(items.get(cursor).cloned()),
            KeyCode::Up => cursor = cursor.saturating_sub(1),
            KeyCode::Down => cursor += 1,
            KeyCode::Backspace => {
                query.pop();
                cursor = 0;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(None);
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                query.push(c);
                cursor = 0;
            }
            _ => {}
        }
    }
}

fn draw(
    stdout: &mut io::Stdout,
    query: &str,
    sections: &[PaletteSection],
    cursor: usize,
) -> io::Result<()> {
    execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
    let body = output::render_palette(sections, Some(cursor));
    write!(stdout, "> {query}\r\n\r\n{}\r\n", body.replace('\n', "\r\n"))?;
    stdout.flush()
}
