//! Browse module - listing and acting on catalog entries
//!
//! UI-agnostic controller logic shared by every front end: the CLI commands
//! and the command palette both go through a [`BrowseSession`].
//!
//! - `session`: store, catalog, cache and backend wired together
//! - `actions`: side effects (opening URLs, clipboard) behind small traits

pub mod actions;
pub mod session;

pub use actions::{
    ActionOutcome, ClipboardSink, ShareOutcome, SystemClipboard, SystemOpener, UrlOpener,
    share_text,
};
pub use session::{BrowseError, BrowseSession, Interaction, InteractionOutcome, SaveOutcome};
