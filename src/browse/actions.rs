//! Side effects triggered from a listing
//!
//! Opening URLs and copying to the clipboard go through small traits so the
//! session can be driven headless in tests. Functions here return plain data
//! about what happened and leave presentation to the caller.

use crate::models::Entry;

/// Opens a URL in the user's browser
pub trait UrlOpener {
    /// # Errors
    ///
    /// Returns a description of the failure if the URL could not be handed off.
    fn open(&self, url: &str) -> Result<(), String>;
}

/// Places text on a clipboard
pub trait ClipboardSink {
    /// # Errors
    ///
    /// Returns a description of the failure if the clipboard is unavailable.
    fn copy(&self, text: &str) -> Result<(), String>;
}

/// Default opener using the platform handler
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl UrlOpener for SystemOpener {
    fn open(&self, url: &str) -> Result<(), String> {
        open::that(url).map_err(|e| e.to_string())
    }
}

/// Default clipboard backed by the system clipboard
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn copy(&self, text: &str) -> Result<(), String> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| format!("Clipboard unavailable: {e}"))?;
        clipboard
            .set_text(text)
            .map_err(|e| format!("Clipboard error: {e}"))
    }
}

/// Result of a single action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Action completed
    Success(String),

    /// Action could not be completed; nothing else was affected
    Failed(String),
}

impl ActionOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Success(msg) | Self::Failed(msg) => msg,
        }
    }
}

/// Where shared text ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    /// Copied to the clipboard
    Copied(String),
    /// Clipboard failed; the caller should print the text instead
    Fallback(String),
}

impl ShareOutcome {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Copied(text) | Self::Fallback(text) => text,
        }
    }
}

/// Text shared for an entry: title, optional description, then the URL
#[must_use]
pub fn share_text(entry: &Entry) -> String {
    match entry.description.as_deref().map(str::trim) {
        Some(description) if !description.is_empty() => {
            format!("{}\n{}\n{}", entry.title, description, entry.url)
        }
        _ => format!("{}\n{}", entry.title, entry.url),
    }
}

/// Open `url`, reporting failure as an outcome
#[must_use]
pub fn execute_open_url(opener: &dyn UrlOpener, url: &str) -> ActionOutcome {
    match opener.open(url) {
        Ok(()) => ActionOutcome::Success(format!("Opened {url}")),
        Err(e) => ActionOutcome::Failed(format!("Failed to open {url}: {e}")),
    }
}

/// Share `entry` through the clipboard, degrading to a printable fallback
#[must_use]
pub fn execute_share(clipboard: &dyn ClipboardSink, entry: &Entry) -> ShareOutcome {
    let text = share_text(entry);
    match clipboard.copy(&text) {
        Ok(()) => ShareOutcome::Copied(text),
        Err(e) => {
            log::debug!("share falling back to output: {e}");
            ShareOutcome::Fallback(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingClipboard {
        copied: RefCell<Vec<String>>,
        fail: bool,
    }

    impl ClipboardSink for RecordingClipboard {
        fn copy(&self, text: &str) -> Result<(), String> {
            if self.fail {
                return Err("no display".into());
            }
            self.copied.borrow_mut().push(text.to_string());
            Ok(())
        }
    }

    struct FailingOpener;

    impl UrlOpener for FailingOpener {
        fn open(&self, _url: &str) -> Result<(), String> {
            Err("no browser".into())
        }
    }

    #[test]
    fn test_share_text_with_and_without_description() {
        let bare = Entry::new("1", "Neon", "https://neon.tech");
        assert_eq!(share_text(&bare), "Neon\nhttps://neon.tech");

        let described = bare.with_description("Serverless postgres");
        assert_eq!(
            share_text(&described),
            "Neon\nServerless postgres\nhttps://neon.tech"
        );
    }

    #[test]
    fn test_share_copies_to_clipboard() {
        let clipboard = RecordingClipboard::default();
        let entry = Entry::new("1", "Neon", "https://neon.tech");

        let outcome = execute_share(&clipboard, &entry);
        assert!(matches!(outcome, ShareOutcome::Copied(_)));
        assert_eq!(clipboard.copied.borrow().len(), 1);
    }

    #[test]
    fn test_share_falls_back_without_error() {
        let clipboard = RecordingClipboard {
            fail: true,
            ..RecordingClipboard::default()
        };
        let entry = Entry::new("1", "Neon", "https://neon.tech");

        let outcome = execute_share(&clipboard, &entry);
        assert_eq!(outcome, ShareOutcome::Fallback(share_text(&entry)));
    }

    #[test]
    fn test_open_failure_is_reported() {
        let outcome = execute_open_url(&FailingOpener, "https://neon.tech");
        assert!(!outcome.is_success());
        assert!(outcome.message().contains("no browser"));
    }
}
