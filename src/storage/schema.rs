//! Database schema definitions
//!
//! This module contains the SQL schema for the page metadata database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per crawled URL; hash is the SHA-512 of the stored content
CREATE TABLE IF NOT EXISTS pages (
    url TEXT PRIMARY KEY,
    hash BLOB NOT NULL,
    title TEXT,
    crawled_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pages_hash ON pages(hash);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
