//! SQLite schema for the catalog.
//!
//! Applied idempotently every time a store is opened.

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

use crate::catalog::CatalogResult;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS contents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    content_type TEXT NOT NULL CHECK (content_type IN ('story', 'video', 'game')),
    age_min INTEGER NOT NULL,
    age_max INTEGER NOT NULL,
    media_url TEXT,
    thumbnail_url TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    order_index INTEGER NOT NULL,
    created_at_ms INTEGER NOT NULL,
    updated_at_ms INTEGER NOT NULL,
    CHECK (age_min <= age_max)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_contents_scope_order
    ON contents(content_type, order_index);
CREATE INDEX IF NOT EXISTS idx_contents_ages ON contents(age_min, age_max);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    order_index INTEGER NOT NULL,
    created_at_ms INTEGER NOT NULL,
    updated_at_ms INTEGER NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_order ON categories(order_index);

CREATE TABLE IF NOT EXISTS age_groups (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    label TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    age_min INTEGER NOT NULL,
    age_max INTEGER NOT NULL,
    created_at_ms INTEGER NOT NULL,
    updated_at_ms INTEGER NOT NULL,
    CHECK (age_min <= age_max)
);

CREATE TABLE IF NOT EXISTS settings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    key TEXT NOT NULL UNIQUE,
    value TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    created_at_ms INTEGER NOT NULL,
    updated_at_ms INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS content_categories (
    content_id INTEGER NOT NULL REFERENCES contents(id) ON DELETE CASCADE,
    category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    PRIMARY KEY (content_id, category_id)
);

CREATE INDEX IF NOT EXISTS idx_content_categories_category
    ON content_categories(category_id);

CREATE TABLE IF NOT EXISTS content_age_groups (
    content_id INTEGER NOT NULL REFERENCES contents(id) ON DELETE CASCADE,
    age_group_id INTEGER NOT NULL REFERENCES age_groups(id) ON DELETE CASCADE,
    PRIMARY KEY (content_id, age_group_id)
);

CREATE INDEX IF NOT EXISTS idx_content_age_groups_age_group
    ON content_age_groups(age_group_id);
"#;

/// Lowercases with full Unicode case mapping; SQLite's `lower()` only folds ASCII
pub const UNICODE_LOWER: &str = "unicode_lower";

/// Install the connection-local SQL functions used by queries
pub fn register_functions(conn: &Connection) -> CatalogResult<()> {
    conn.create_scalar_function(
        UNICODE_LOWER,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )?;
    Ok(())
}

/// Configure the connection and create any missing tables
pub fn migrate(conn: &Connection) -> CatalogResult<()> {
    register_functions(conn)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Switch a file-backed database to WAL journaling
pub fn enable_wal(conn: &Connection) -> CatalogResult<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 6);
    }

    #[test]
    fn test_unicode_lower_folds_non_ascii() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        let (folded, null): (String, Option<String>) = conn
            .query_row(
                "SELECT unicode_lower('ÉCOLE Ünd Straße'), unicode_lower(NULL)",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(folded, "école ünd straße");
        assert_eq!(null, None);
    }
}
