//! Database schema definitions
//!
//! This module contains the SQL schema for the company database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Discovered companies, at most one row per distinct website
CREATE TABLE IF NOT EXISTS companies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    website TEXT NOT NULL UNIQUE,
    phones TEXT NOT NULL DEFAULT '[]',
    emails TEXT NOT NULL DEFAULT '[]',
    address TEXT,
    description TEXT,
    crawled_at TEXT NOT NULL,
    source_url TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_companies_name ON companies(name);
"#;

/// Initializes the database schema
///
/// Safe to call on every open; all statements are idempotent.
pub fn initialize_schema(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
