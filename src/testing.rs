//! Testing utilities for linkshelf
//!
//! This module provides a `TestDb` wrapper for temporary database management
//! and a small fixed catalog shared by the unit tests.
//!
//! Only available when compiled with `cfg(test)`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{Duration, TimeZone, Utc};
use tempfile::TempDir;

use crate::backend::LocalBackend;
use crate::browse::{BrowseSession, ClipboardSink, UrlOpener};
use crate::db::{CatalogDocument, Database};
use crate::models::{Category, Entry, EntryStatus};
use crate::store::AppStore;

/// Wrapper for a test database living in its own temporary directory
///
/// The directory (and everything sled wrote) is removed when the wrapper
/// goes out of scope.
pub struct TestDb {
    // Field order matters: the database must close before its directory goes
    db: Database,
    dir: TempDir,
}

impl TestDb {
    /// Open a fresh database in a new temporary directory
    ///
    /// # Panics
    /// Panics if the directory or the database cannot be created.
    #[must_use]
    pub fn temporary() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db = Database::open(dir.path().join("db")).expect("Failed to open test database");
        Self { db, dir }
    }

    /// Get a reference to the underlying database
    #[must_use]
    pub const fn db(&self) -> &Database {
        &self.db
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Two categories and four entries with fixed timestamps
///
/// - `supabase` (databases, featured, approved, newest)
/// - `neon` (databases, approved)
/// - `vercel` (hosting, featured, verified, approved, most clicked)
/// - `pending-tool` (no category, pending)
#[must_use]
pub fn sample_catalog() -> CatalogDocument {
    let base = Utc
        .with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp");

    let databases = Category::new("cat-db", "Databases", "databases").with_order_index(1);
    let hosting = Category::new("cat-host", "Hosting", "hosting").with_order_index(2);

    let entries = vec![
        Entry::new("supabase", "Supabase", "https://supabase.com")
            .with_description("Open source Firebase alternative")
            .with_tags(["database", "postgres", "auth"])
            .with_category(databases.to_ref())
            .with_click_count(50)
            .with_rating(4.8)
            .with_featured(true)
            .with_status(EntryStatus::Approved)
            .with_created_at(base + Duration::days(3)),
        Entry::new("neon", "Neon", "https://neon.tech")
            .with_description("Serverless postgres with branching")
            .with_tags(["database", "postgres"])
            .with_category(databases.to_ref())
            .with_click_count(20)
            .with_rating(4.5)
            .with_status(EntryStatus::Approved)
            .with_created_at(base + Duration::days(1)),
        Entry::new("vercel", "Vercel", "https://vercel.com")
            .with_description("Frontend cloud for deploying web apps")
            .with_tags(["hosting", "deploy"])
            .with_category(hosting.to_ref())
            .with_click_count(100)
            .with_rating(4.7)
            .with_featured(true)
            .with_verified(true)
            .with_status(EntryStatus::Approved)
            .with_created_at(base + Duration::days(2)),
        Entry::new("pending-tool", "Pending Tool", "https://pending.dev")
            .with_created_at(base),
    ];

    CatalogDocument {
        categories: vec![databases, hosting],
        entries,
    }
}

/// A temporary database pre-loaded with [`sample_catalog`]
///
/// # Panics
/// Panics if the catalog cannot be imported.
#[must_use]
pub fn seeded_db() -> TestDb {
    let test_db = TestDb::temporary();
    test_db
        .db()
        .import(sample_catalog())
        .expect("Failed to import sample catalog");
    test_db
}

/// Opener that records URLs instead of launching a browser
#[derive(Clone, Default)]
pub struct RecordingOpener {
    pub opened: Arc<Mutex<Vec<String>>>,
}

impl UrlOpener for RecordingOpener {
    fn open(&self, url: &str) -> Result<(), String> {
        self.opened
            .lock()
            .map_err(|e| e.to_string())?
            .push(url.to_string());
        Ok(())
    }
}

/// Clipboard that is never available
pub struct NoClipboard;

impl ClipboardSink for NoClipboard {
    fn copy(&self, _text: &str) -> Result<(), String> {
        Err("headless".into())
    }
}

/// Session over a temporary seeded local backend, with no side effects
///
/// The catalog is not loaded yet; call `refresh` first.
///
/// # Panics
/// Panics if the temporary database cannot be created or seeded.
#[must_use]
pub fn headless_session() -> (BrowseSession, Arc<LocalBackend>, RecordingOpener) {
    let db = Database::open_temporary().expect("Failed to open temporary database");
    let backend = Arc::new(LocalBackend::new(Arc::new(db)));
    backend
        .import(sample_catalog())
        .expect("Failed to import sample catalog");
    let opener = RecordingOpener::default();
    let session = BrowseSession::new(Arc::clone(&backend) as Arc<dyn crate::backend::Backend>, AppStore::new())
        .with_opener(Box::new(opener.clone()))
        .with_clipboard(Box::new(NoClipboard));
    (session, backend, opener)
}
