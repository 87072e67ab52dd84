//! Import command - load a JSON catalog into the local database

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::backend::LocalBackend;
use crate::db::CatalogDocument;
use crate::ShelfError;

use super::Result;

/// Parse a catalog document
///
/// # Errors
/// Returns `ShelfError::InvalidInput` if the text is not a catalog document
pub fn parse_document(text: &str) -> Result<CatalogDocument> {
    serde_json::from_str(text)
        .map_err(|e| ShelfError::InvalidInput(format!("Not a catalog document: {e}")))
}

/// Execute the import command
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or a record
/// cannot be stored
pub fn execute(
    backend: &LocalBackend,
    path: &Path,
    quiet: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let text = fs::read_to_string(path).map_err(|e| {
        ShelfError::InvalidInput(format!("Cannot read '{}': {e}", path.display()))
    })?;
    let document = parse_document(&text)?;
    let (categories, entries) = backend.import(document)?;

    if !quiet {
        writeln!(
            out,
            "Imported {categories} categories and {entries} entries from {}",
            path.display()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::backend::Backend;
    use crate::db::Database;
    use crate::testing::TestDb;

    const DOCUMENT: &str = r#"{
        "categories": [
            {"id": "c1", "name": "APIs", "slug": "apis", "order_index": 1}
        ],
        "entries": [
            {
                "id": "httpbin",
                "title": "httpbin",
                "url": "https://www.httpbin.org",
                "category": {"id": "c1", "name": "APIs", "slug": "apis"},
                "tags": ["http", "testing", "http"],
                "rating": 7.5,
                "status": "approved",
                "created_at": "2024-05-01T10:00:00Z",
                "updated_at": "2024-05-01T10:00:00Z"
            }
        ]
    }"#;

    #[tokio::test]
    async fn test_import_file() {
        let test_db = TestDb::temporary();
        let path = test_db.path().join("catalog.json");
        fs::write(&path, DOCUMENT).unwrap();

        let db = Arc::new(Database::open(test_db.path().join("shelf")).unwrap());
        let backend = LocalBackend::new(db);
        let mut out = Vec::new();
        execute(&backend, &path, false, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Imported 1 categories and 1 entries"));

        let entry = backend.fetch_entry("httpbin").await.unwrap();
        assert_eq!(entry.domain, "httpbin.org");
        assert_eq!(entry.tags, vec!["http", "testing"]);
        assert!((entry.rating - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rejects_malformed_document() {
        assert!(matches!(
            parse_document("{\"entries\": 3}"),
            Err(ShelfError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let test_db = TestDb::temporary();
        let db = Arc::new(Database::open(test_db.path().join("shelf")).unwrap());
        let backend = LocalBackend::new(db);
        let mut out = Vec::new();
        let result = execute(&backend, &test_db.path().join("absent.json"), false, &mut out);
        assert!(matches!(result, Err(ShelfError::InvalidInput(_))));
    }
}
