//! Command-line interface definitions and parsing
//!
//! This module defines the CLI structure for linkshelf using the `clap` crate.
//!
//! # Commands
//!
//! - **list**: Filtered, sorted listing of the catalog (default)
//! - **open** / **save** / **share**: Act on one entry
//! - **saved** / **recent**: The user's saved and recently viewed entries
//! - **categories**: Categories with link counts
//! - **palette**: Grouped quick-jump over the catalog, optionally interactive
//! - **view** / **theme**: Persisted display preferences
//! - **import**: Load a catalog document into the local database
//! - **completions**: Shell completion scripts
//!
//! # Examples
//!
//! ```
//! use linkshelf::cli::{Cli, Commands};
//! use clap::Parser;
//!
//! let cli = Cli::parse_from(["linkshelf", "list", "postgres", "-t", "database"]);
//! assert!(matches!(cli.get_command(), Commands::List { .. }));
//! ```

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use crate::models::{Density, Layout, SearchFiltersPatch, SortBy, ViewModePatch};
use crate::output::OutputFormat;

/// Layout names accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutArg {
    Grid,
    List,
    #[value(alias = "masonry")]
    Compact,
}

impl From<LayoutArg> for Layout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Grid => Self::Grid,
            LayoutArg::List => Self::List,
            LayoutArg::Compact => Self::Compact,
        }
    }
}

/// Density names accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DensityArg {
    Comfortable,
    Compact,
}

impl From<DensityArg> for Density {
    fn from(arg: DensityArg) -> Self {
        match arg {
            DensityArg::Comfortable => Self::Comfortable,
            DensityArg::Compact => Self::Compact,
        }
    }
}

/// Listing filters shared by `list` and the default command
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
pub struct ListArgs {
    /// Fuzzy query over title, description, tags and category
    #[arg(value_name = "QUERY")]
    pub query: Option<String>,

    /// Category slug or id (repeatable; any of them matches)
    #[arg(short = 'c', long = "category", value_name = "SLUG")]
    pub categories: Vec<String>,

    /// Tag (repeatable; any of them matches)
    #[arg(short = 't', long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Only featured entries
    #[arg(long = "featured")]
    pub featured: bool,

    /// Only verified entries
    #[arg(long = "verified")]
    pub verified: bool,

    /// Sort order: newest, popular, rating or alphabetical
    #[arg(short = 's', long = "sort", value_name = "KEY")]
    pub sort: Option<String>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl ListArgs {
    /// Filter update for the store
    ///
    /// Categories are left out; they are resolved against the backend first.
    /// Unknown sort keys fall back to `newest`.
    #[must_use]
    pub fn filters_patch(&self) -> SearchFiltersPatch {
        SearchFiltersPatch {
            query: Some(self.query.clone().unwrap_or_default()),
            categories: None,
            tags: Some(self.tags.iter().cloned().collect()),
            featured: Some(self.featured),
            verified: Some(self.verified),
            sort_by: Some(
                self.sort
                    .as_deref()
                    .map_or(SortBy::Newest, SortBy::parse_lenient),
            ),
        }
    }
}

/// Main CLI structure for parsing command-line arguments
#[derive(Parser, Debug)]
#[command(name = "linkshelf")]
#[command(about = "A curated link directory", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Suppress informational output (only print results)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List catalog entries (default)
    #[command(visible_alias = "ls")]
    List {
        #[command(flatten)]
        args: ListArgs,
    },

    /// Open an entry's link and record the visit
    #[command(visible_alias = "o")]
    Open {
        /// Entry id
        id: String,
    },

    /// Save an entry, or unsave it if already saved
    Save {
        /// Entry id
        id: String,
    },

    /// List saved entries
    Saved {
        #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List recently viewed entries
    Recent {
        #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Copy an entry's title, description and link to the clipboard
    Share {
        /// Entry id
        id: String,
    },

    /// List categories
    #[command(visible_alias = "cats")]
    Categories {
        #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the command palette
    #[command(visible_alias = "p")]
    Palette {
        /// Initial query
        query: Option<String>,

        /// Read keys from the terminal (ctrl-k toggles, esc closes)
        #[arg(short = 'i', long = "interactive")]
        interactive: bool,

        /// Choose the numbered row instead of printing the palette
        #[arg(long = "pick", value_name = "N", conflicts_with = "interactive")]
        pick: Option<usize>,
    },

    /// Change how listings are laid out
    View {
        #[arg(long = "layout", value_enum)]
        layout: Option<LayoutArg>,

        #[arg(long = "density", value_enum)]
        density: Option<DensityArg>,
    },

    /// Switch between dark and light output
    #[command(group(ArgGroup::new("mode").args(["dark", "light"])))]
    Theme {
        #[arg(long = "dark")]
        dark: bool,

        #[arg(long = "light")]
        light: bool,
    },

    /// Import a JSON catalog (`{"categories": [...], "entries": [...]}`)
    Import {
        /// Path to the catalog document
        path: PathBuf,
    },

    /// Print a shell completion script
    Completions {
        shell: Shell,
    },
}

impl Commands {
    /// View update for the `view` command; `None` when nothing was given
    #[must_use]
    pub fn get_view_patch(&self) -> Option<ViewModePatch> {
        match self {
            Self::View { layout, density } if layout.is_some() || density.is_some() => {
                Some(ViewModePatch {
                    layout: layout.map(Into::into),
                    density: density.map(Into::into),
                })
            }
            _ => None,
        }
    }

    /// Requested theme for the `theme` command; `None` means show the current one
    #[must_use]
    pub const fn get_dark_mode(&self) -> Option<bool> {
        match self {
            Self::Theme { dark: true, .. } => Some(true),
            Self::Theme { light: true, .. } => Some(false),
            _ => None,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the command, defaulting to an unfiltered list if none specified
    #[must_use]
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::List {
            args: ListArgs::default(),
        })
    }
}
