//! Output formatting for CLI display
//!
//! Entries render according to the stored [`ViewMode`]: `grid` prints a
//! card-like block per entry, `list` one detailed line, `compact` just the
//! title and domain. `json` and `csv` ignore the view mode.

use std::collections::BTreeSet;

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use serde::Serialize;
use thiserror::Error;

use crate::models::{Category, Density, Entry, EntryId, Layout, ViewMode};
use crate::palette::PaletteSection;

/// Errors while rendering structured output
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Output format for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Presentation settings taken from the store and config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub view: ViewMode,
    pub dark_mode: bool,
    pub quiet: bool,
}

impl Style {
    fn title(&self, text: &str) -> ColoredString {
        if self.dark_mode {
            text.bright_white().bold()
        } else {
            text.black().bold()
        }
    }

    fn muted(&self, text: &str) -> ColoredString {
        if self.dark_mode {
            text.bright_black()
        } else {
            text.dimmed()
        }
    }
}

fn badges(entry: &Entry, saved: bool) -> String {
    let mut out = String::new();
    if entry.featured {
        out.push_str(&format!(" {}", "★".yellow()));
    }
    if entry.verified {
        out.push_str(&format!(" {}", "✓".green()));
    }
    if saved {
        out.push_str(&format!(" {}", "♥".red()));
    }
    out
}

/// Format one entry as text
#[must_use]
pub fn entry_text(entry: &Entry, style: &Style, saved: bool) -> String {
    if style.quiet {
        return entry.id.clone();
    }

    let title = style.title(&entry.title);
    let domain = style.muted(&entry.domain);
    let badges = badges(entry, saved);

    match style.view.layout {
        Layout::Compact => format!("  {title}  {domain}{badges}"),
        Layout::List => {
            let category = entry.category_name().unwrap_or("uncategorized");
            let tags = if entry.tags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", entry.tags.join(", "))
            };
            format!(
                "  {title}{badges}  {domain}  {}{}  {} clicks  {:.1}/5  ({})",
                category.cyan(),
                tags,
                entry.click_count,
                entry.rating,
                style.muted(&entry.id)
            )
        }
        Layout::Grid => {
            let mut lines = vec![format!("  {title}{badges}"), format!("    {}", entry.url.blue())];
            if style.view.density == Density::Comfortable && !entry.description_text().is_empty() {
                lines.push(format!("    {}", entry.description_text()));
            }
            let mut meta = Vec::new();
            if let Some(category) = entry.category_name() {
                meta.push(category.cyan().to_string());
            }
            if !entry.tags.is_empty() {
                meta.push(entry.tags.iter().map(|t| format!("#{t}")).collect::<Vec<_>>().join(" "));
            }
            meta.push(format!("{} clicks", entry.click_count));
            meta.push(format!("{:.1}/5", entry.rating));
            lines.push(format!("    {}", meta.join("  ·  ")));
            lines.push(format!("    {}", style.muted(&format!("id: {}", entry.id))));
            lines.join("\n")
        }
    }
}

/// Format a category with its entry count
#[must_use]
pub fn category_text(category: &Category, quiet: bool) -> String {
    if quiet {
        return category.slug.clone();
    }
    let count = category
        .link_count
        .map_or_else(String::new, |n| format!(" ({n} link(s))"));
    let featured = if category.featured {
        format!(" {}", "★".yellow())
    } else {
        String::new()
    };
    format!(
        "  {}{featured}  {}{count}",
        category.name.bold(),
        category.slug.bright_black()
    )
}

#[derive(Serialize)]
struct EntryRow<'a> {
    id: &'a str,
    title: &'a str,
    url: &'a str,
    domain: &'a str,
    category: &'a str,
    tags: String,
    click_count: u64,
    rating: f32,
    featured: bool,
    verified: bool,
    saved: bool,
    created_at: String,
}

impl<'a> EntryRow<'a> {
    fn new(entry: &'a Entry, saved: bool) -> Self {
        Self {
            id: &entry.id,
            title: &entry.title,
            url: &entry.url,
            domain: &entry.domain,
            category: entry.category_name().unwrap_or_default(),
            tags: entry.tags.join(";"),
            click_count: entry.click_count,
            rating: entry.rating,
            featured: entry.featured,
            verified: entry.verified,
            saved,
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

/// Render a list of entries in `format`
///
/// # Errors
///
/// Returns `OutputError` if JSON or CSV serialization fails.
pub fn render_entries(
    entries: &[&Entry],
    format: OutputFormat,
    style: &Style,
    saved: &BTreeSet<EntryId>,
) -> Result<String, OutputError> {
    match format {
        OutputFormat::Text => {
            if entries.is_empty() {
                return Ok(if style.quiet {
                    String::new()
                } else {
                    "  No resources found".to_string()
                });
            }
            let separator = if style.view.layout == Layout::Grid {
                "\n\n"
            } else {
                "\n"
            };
            Ok(entries
                .iter()
                .map(|e| entry_text(e, style, saved.contains(&e.id)))
                .collect::<Vec<_>>()
                .join(separator))
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(entries)?),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            for entry in entries {
                writer.serialize(EntryRow::new(entry, saved.contains(&entry.id)))?;
            }
            let bytes = writer.into_inner().map_err(|e| e.into_error())?;
            Ok(String::from_utf8(bytes)?)
        }
    }
}

/// Render categories in `format`
///
/// # Errors
///
/// Returns `OutputError` if JSON or CSV serialization fails.
pub fn render_categories(
    categories: &[Category],
    format: OutputFormat,
    quiet: bool,
) -> Result<String, OutputError> {
    match format {
        OutputFormat::Text => Ok(categories
            .iter()
            .map(|c| category_text(c, quiet))
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(categories)?),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.write_record(["id", "name", "slug", "order_index", "link_count"])?;
            for c in categories {
                writer.write_record([
                    c.id.clone(),
                    c.name.clone(),
                    c.slug.clone(),
                    c.order_index.to_string(),
                    c.link_count.map_or_else(String::new, |n| n.to_string()),
                ])?;
            }
            let bytes = writer.into_inner().map_err(|e| e.into_error())?;
            Ok(String::from_utf8(bytes)?)
        }
    }
}

/// Render palette sections with numbered rows
///
/// Numbers run across sections so a row can be picked by number. The row at
/// `selected` (counting from zero) is marked.
#[must_use]
pub fn render_palette(sections: &[PaletteSection], selected: Option<usize>) -> String {
    let mut lines = Vec::new();
    let mut row = 0;
    for section in sections {
        lines.push(section.group.heading().bold().underline().to_string());
        for item in &section.items {
            let marker = if selected == Some(row) { ">" } else { " " };
            let number = (row + 1).to_string();
            let text = if selected == Some(row) {
                item.to_string().reversed().to_string()
            } else {
                item.to_string()
            };
            lines.push(format!("{marker} {:>2}. {text}", number.bright_black()));
            row += 1;
        }
    }
    lines.join("\n")
}
