//! Embedded SQL migrations and runner.
//!
//! Migrations are stored as `&str` constants and executed in order.  A
//! `schema_migrations` table tracks which versions have been applied.

use rusqlite::Connection;
use iv_core::{Error, Result};

/// V1: the `images` document collection.
const V1_INITIAL: &str = r#"
CREATE TABLE images (
    id         TEXT PRIMARY KEY,
    doc        TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX idx_images_created ON images(created_at);
"#;

/// V2: fold single-image documents (`imageUrl`) into the multi-image shape.
///
/// A folded document gets `imageKeys` equal to its new `imageUrls`, so both
/// arrays start out index-aligned.
const V2_FOLD_LEGACY_IMAGE_URL: &str = r#"
UPDATE images
SET doc = json_remove(
        json_set(
            doc,
            '$.imageUrls', json_array(json_extract(doc, '$.imageUrl')),
            '$.imageKeys', json_array(json_extract(doc, '$.imageUrl'))
        ),
        '$.imageUrl'
    )
WHERE json_type(doc, '$.imageUrl') = 'text'
  AND json_type(doc, '$.imageUrls') IS NULL
  AND IFNULL(json_type(doc, '$.imageKeys'), '') <> 'array';

UPDATE images
SET doc = json_remove(
        json_set(doc, '$.imageUrls', json_array(json_extract(doc, '$.imageUrl'))),
        '$.imageUrl'
    )
WHERE json_type(doc, '$.imageUrl') = 'text'
  AND json_type(doc, '$.imageUrls') IS NULL;

UPDATE images
SET doc = json_remove(doc, '$.imageUrl')
WHERE json_type(doc, '$.imageUrl') IS NOT NULL
  AND json_type(doc, '$.imageUrls') = 'array';
"#;

/// Ordered list of (version, sql) pairs.
const MIGRATIONS: &[(i64, &str)] = &[(1, V1_INITIAL), (2, V2_FOLD_LEGACY_IMAGE_URL)];

/// Run all pending migrations on `conn`.
///
/// Creates the `schema_migrations` tracking table if it does not exist,
/// then applies each outstanding migration inside a transaction.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    run_migrations_up_to(conn, i64::MAX)
}

fn run_migrations_up_to(conn: &Connection, max_version: i64) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .map_err(|e| Error::database(format!("Failed to create schema_migrations: {e}")))?;

    for &(version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v <= max_version) {
        let already: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM schema_migrations WHERE version = ?1",
                [version],
                |row| row.get(0),
            )
            .map_err(|e| Error::database(e.to_string()))?;

        if already {
            continue;
        }

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| Error::database(e.to_string()))?;

        tx.execute_batch(sql)
            .map_err(|e| Error::database(format!("Migration V{version} failed: {e}")))?;

        tx.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            [version],
        )
        .map_err(|e| Error::database(e.to_string()))?;

        tx.commit().map_err(|e| Error::database(e.to_string()))?;
    }

    Ok(())
}
