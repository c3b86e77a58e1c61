//! Collection registry and schema versioning.
//!
//! Upgrades are purely additive: opening at a higher version creates the
//! collections and indexes that version introduced and never touches
//! existing tables or rows.

use core::fmt;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 2;

/// One of the named record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Saved books.
    Books,
    /// Saved business plans.
    BusinessPlans,
    /// Reading progress, one record per content item.
    ReadingProgress,
    /// Reader notes.
    Notes,
    /// Highlighted passages.
    Highlights,
}

impl Collection {
    /// Every collection, in creation order.
    pub const ALL: [Collection; 5] = [
        Collection::Books,
        Collection::ReadingProgress,
        Collection::Notes,
        Collection::Highlights,
        Collection::BusinessPlans,
    ];

    /// Stable collection name.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Books => "books",
            Collection::BusinessPlans => "business-plans",
            Collection::ReadingProgress => "reading-progress",
            Collection::Notes => "notes",
            Collection::Highlights => "highlights",
        }
    }

    /// Backing SQLite table.
    pub(crate) fn table(&self) -> &'static str {
        match self {
            Collection::Books => "books",
            Collection::BusinessPlans => "business_plans",
            Collection::ReadingProgress => "reading_progress",
            Collection::Notes => "notes",
            Collection::Highlights => "highlights",
        }
    }

    /// Whether the collection carries a non-unique index on `content_id`.
    pub fn has_content_index(&self) -> bool {
        matches!(
            self,
            Collection::ReadingProgress | Collection::Notes | Collection::Highlights
        )
    }

    /// Schema version that introduced the collection.
    pub fn since_version(&self) -> u32 {
        match self {
            Collection::BusinessPlans => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Initialize or upgrade the schema to `requested`.
///
/// Returns the version the database is at afterwards.
pub fn initialize(conn: &Connection, requested: u32) -> Result<u32> {
    if requested == 0 || requested > SCHEMA_VERSION {
        return Err(Error::UnsupportedVersion {
            requested,
            supported: SCHEMA_VERSION,
        });
    }

    let stored = get_schema_version(conn)?;

    if stored > requested {
        return Err(Error::VersionTooNew { stored, requested });
    }

    if stored < requested {
        let tx = conn.unchecked_transaction()?;
        create_collections(&tx, requested)?;
        set_schema_version(&tx, requested)?;
        tx.commit()?;

        if stored == 0 {
            info!("Created schema version {}", requested);
        } else {
            info!("Upgraded schema from version {} to {}", stored, requested);
        }
    }

    Ok(requested)
}

/// Get the current schema version, 0 for a fresh database.
pub(crate) fn get_schema_version(conn: &Connection) -> Result<u32> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: u32 = conn.query_row("SELECT version FROM schema_version", [], |row| row.get(0))?;

    Ok(version)
}

fn set_schema_version(conn: &Connection, version: u32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?)",
        [version],
    )?;
    Ok(())
}

/// Create every collection introduced up to `version` that does not exist yet.
fn create_collections(conn: &Connection, version: u32) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL
        );",
    )?;

    for collection in Collection::ALL {
        if collection.since_version() > version {
            continue;
        }

        let table = collection.table();
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id TEXT PRIMARY KEY,
                content_id TEXT NOT NULL,
                body TEXT NOT NULL
            );"
        ))?;

        if collection.has_content_index() {
            conn.execute_batch(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_content_id ON {table}(content_id);"
            ))?;
        }

        debug!("Ensured collection {}", collection);
    }

    Ok(())
}

/// Names of the collections that exist in the database.
pub(crate) fn existing_collections(conn: &Connection) -> Result<Vec<Collection>> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table'")?;
    let tables = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Collection::ALL
        .into_iter()
        .filter(|c| tables.iter().any(|t| t == c.table()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_names(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type='index' AND name LIKE 'idx_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_initialize_fresh_database() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(initialize(&conn, SCHEMA_VERSION).unwrap(), SCHEMA_VERSION);

        let collections = existing_collections(&conn).unwrap();
        assert_eq!(collections.len(), Collection::ALL.len());

        let indexes = index_names(&conn);
        assert!(indexes.contains(&"idx_notes_content_id".to_string()));
        assert!(indexes.contains(&"idx_highlights_content_id".to_string()));
        assert!(indexes.contains(&"idx_reading_progress_content_id".to_string()));
        assert!(!indexes.contains(&"idx_books_content_id".to_string()));
    }

    #[test]
    fn test_schema_version_tracking() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 0);

        initialize(&conn, SCHEMA_VERSION).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_version_one_has_no_business_plans() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn, 1).unwrap();

        let collections = existing_collections(&conn).unwrap();
        assert!(collections.contains(&Collection::Books));
        assert!(!collections.contains(&Collection::BusinessPlans));
    }

    #[test]
    fn test_upgrade_is_additive() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn, 1).unwrap();
        conn.execute(
            "INSERT INTO books (id, content_id, body) VALUES ('b1', 'b1', '{}')",
            [],
        )
        .unwrap();

        initialize(&conn, 2).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
        assert!(existing_collections(&conn)
            .unwrap()
            .contains(&Collection::BusinessPlans));
        assert_eq!(get_schema_version(&conn).unwrap(), 2);
    }

    #[test]
    fn test_newer_stored_version_is_blocked() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn, 2).unwrap();

        let err = initialize(&conn, 1).unwrap_err();
        assert!(matches!(
            err,
            Error::VersionTooNew {
                stored: 2,
                requested: 1
            }
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(matches!(
            initialize(&conn, 0),
            Err(Error::UnsupportedVersion { .. })
        ));
        assert!(matches!(
            initialize(&conn, SCHEMA_VERSION + 1),
            Err(Error::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_collection_display_uses_name() {
        assert_eq!(Collection::BusinessPlans.to_string(), "business-plans");
        assert_eq!(Collection::ReadingProgress.to_string(), "reading-progress");
    }
}
