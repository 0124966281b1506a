//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: Initial schema
    r#"
    CREATE TABLE IF NOT EXISTS videos (
        id               TEXT PRIMARY KEY,
        creator_id       TEXT NOT NULL,
        creator_handle   INTEGER NOT NULL,
        created_at       DATETIME NOT NULL,

        -- Current cumulative counters
        views            INTEGER NOT NULL DEFAULT 0,
        likes            INTEGER NOT NULL DEFAULT 0,
        comments         INTEGER NOT NULL DEFAULT 0,
        reports          INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS video_snapshots (
        id               TEXT PRIMARY KEY,
        video_id         TEXT NOT NULL REFERENCES videos(id),
        observed_at      DATETIME NOT NULL,

        -- Cumulative counters at observed_at
        views            INTEGER NOT NULL DEFAULT 0,
        likes            INTEGER NOT NULL DEFAULT 0,
        comments         INTEGER NOT NULL DEFAULT 0,
        reports          INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_videos_created_at
        ON videos(created_at);
    CREATE INDEX IF NOT EXISTS idx_videos_creator_handle
        ON videos(creator_handle);
    CREATE INDEX IF NOT EXISTS idx_snapshots_video_observed
        ON video_snapshots(video_id, observed_at);
    CREATE INDEX IF NOT EXISTS idx_snapshots_observed_at
        ON video_snapshots(observed_at);
    "#,
];

/// Run any pending migrations on the connection.
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    debug_assert_eq!(MIGRATIONS.len() as i32, SCHEMA_VERSION);
    Ok(())
}
