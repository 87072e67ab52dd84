//! Listing commands - list, saved, recent and categories

use std::collections::BTreeSet;
use std::io::Write;

use crate::browse::BrowseSession;
use crate::cli::ListArgs;
use crate::models::Entry;
use crate::output::{self, OutputFormat};

use super::{Result, refresh, style};

fn write_entries(
    session: &BrowseSession,
    entries: &[&Entry],
    format: OutputFormat,
    quiet: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let style = style(session, quiet);
    let saved = &session.store().state().saved_links;
    let text = output::render_entries(entries, format, &style, saved)?;
    if !text.is_empty() {
        writeln!(out, "{text}")?;
    }
    Ok(())
}

/// Execute the list command
///
/// # Errors
/// Returns an error if a category cannot be resolved or rendering fails
pub async fn list(
    session: &mut BrowseSession,
    args: &ListArgs,
    quiet: bool,
    out: &mut dyn Write,
) -> Result<()> {
    refresh(session, quiet).await?;

    let mut patch = args.filters_patch();
    // Without a catalog there is nothing to filter, and nothing to resolve against
    patch.categories = Some(if session.catalog().is_empty() {
        BTreeSet::new()
    } else {
        session.resolve_categories(&args.categories).await?
    });
    session.store_mut().set_search_filters(patch);

    let entries = session.visible();
    let refs: Vec<&Entry> = entries.iter().collect();
    write_entries(session, &refs, args.format, quiet, out)
}

/// Execute the saved command
///
/// With a signed-in user the saved set is first aligned with the backend.
///
/// # Errors
/// Returns an error if rendering fails
pub async fn saved(
    session: &mut BrowseSession,
    format: OutputFormat,
    quiet: bool,
    out: &mut dyn Write,
) -> Result<()> {
    refresh(session, quiet).await?;
    match session.sync_saved().await {
        Ok(0) => {}
        Ok(changed) => log::info!("{changed} saved link(s) updated from backend"),
        Err(e) => log::warn!("could not sync saved links: {e}"),
    }

    let entries = session.saved_entries();
    write_entries(session, &entries, format, quiet, out)
}

/// Execute the recent command
///
/// # Errors
/// Returns an error if rendering fails
pub async fn recent(
    session: &mut BrowseSession,
    format: OutputFormat,
    quiet: bool,
    out: &mut dyn Write,
) -> Result<()> {
    refresh(session, quiet).await?;
    let entries = session.recent_entries();
    write_entries(session, &entries, format, quiet, out)
}

/// Execute the categories command
///
/// # Errors
/// Returns an error if categories cannot be fetched or rendering fails
pub async fn categories(
    session: &mut BrowseSession,
    format: OutputFormat,
    quiet: bool,
    out: &mut dyn Write,
) -> Result<()> {
    refresh(session, quiet).await?;
    let categories = session.categories().await?;

    if categories.is_empty() && format == OutputFormat::Text {
        if !quiet {
            writeln!(out, "No categories found.")?;
        }
        return Ok(());
    }

    let text = output::render_categories(&categories, format, quiet)?;
    writeln!(out, "{text}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::headless_session;

    fn text(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_list_quiet_prints_ids_in_order() {
        let (mut session, _, _) = headless_session();
        let args = ListArgs {
            sort: Some("popular".into()),
            ..ListArgs::default()
        };
        let mut out = Vec::new();
        list(&mut session, &args, true, &mut out).await.unwrap();
        assert_eq!(text(out), "vercel\nsupabase\nneon\n");
    }

    #[tokio::test]
    async fn test_list_resolves_category_slug() {
        let (mut session, _, _) = headless_session();
        let args = ListArgs {
            categories: vec!["hosting".into()],
            ..ListArgs::default()
        };
        let mut out = Vec::new();
        list(&mut session, &args, true, &mut out).await.unwrap();
        assert_eq!(text(out), "vercel\n");
        assert!(
            session
                .store()
                .state()
                .search_filters
                .categories
                .contains("cat-host")
        );
    }

    #[tokio::test]
    async fn test_list_unknown_category_is_an_error() {
        let (mut session, _, _) = headless_session();
        let args = ListArgs {
            categories: vec!["nope".into()],
            ..ListArgs::default()
        };
        let mut out = Vec::new();
        assert!(list(&mut session, &args, true, &mut out).await.is_err());
    }

    #[tokio::test]
    async fn test_list_json_with_tag_filter() {
        let (mut session, _, _) = headless_session();
        let args = ListArgs {
            tags: vec!["auth".into()],
            format: OutputFormat::Json,
            ..ListArgs::default()
        };
        let mut out = Vec::new();
        list(&mut session, &args, false, &mut out).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&text(out)).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["id"], "supabase");
    }

    #[tokio::test]
    async fn test_saved_lists_local_saves() {
        let (mut session, _, _) = headless_session();
        session.store_mut().toggle_saved_link("neon");
        session.store_mut().toggle_saved_link("gone");

        let mut out = Vec::new();
        saved(&mut session, OutputFormat::Text, true, &mut out).await.unwrap();
        assert_eq!(text(out), "neon\n");
    }

    #[tokio::test]
    async fn test_categories_csv() {
        let (mut session, _, _) = headless_session();
        let mut out = Vec::new();
        categories(&mut session, OutputFormat::Csv, false, &mut out)
            .await
            .unwrap();
        let csv = text(out);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "id,name,slug,order_index,link_count");
        assert_eq!(lines[1], "cat-db,Databases,databases,1,2");
        assert_eq!(lines[2], "cat-host,Hosting,hosting,2,1");
    }
}
