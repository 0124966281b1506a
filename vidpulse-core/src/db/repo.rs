//! Database repository layer
//!
//! Provides the collaborator queries the aggregation engine consumes, plus
//! the insert operations data-loading tools use. Timestamps are stored as
//! RFC 3339 text in UTC, which compares correctly as text in SQL.

use crate::error::{Error, Result};
use crate::store::{CounterBounds, CreatedVideo};
use crate::types::{CounterSnapshot, PlatformTotals, Video};
use chrono::{DateTime, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params, Connection};
use std::path::PathBuf;
use std::sync::Mutex;

/// Database handle with a single pooled connection
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable foreign keys and WAL mode for better concurrency
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    // ============================================
    // Insert operations (data loading)
    // ============================================

    /// Insert or update a video
    pub fn upsert_video(&self, video: &Video) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO videos (id, creator_id, creator_handle, created_at,
                                views, likes, comments, reports)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                views = excluded.views,
                likes = excluded.likes,
                comments = excluded.comments,
                reports = excluded.reports
            "#,
            params![
                video.id,
                video.creator_id,
                video.creator_handle,
                video.created_at.to_rfc3339(),
                video.views,
                video.likes,
                video.comments,
                video.reports,
            ],
        )?;
        Ok(())
    }

    /// Insert a counter snapshot. Snapshots are append-only.
    pub fn insert_snapshot(&self, snapshot: &CounterSnapshot) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO video_snapshots (id, video_id, observed_at,
                                         views, likes, comments, reports)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                snapshot.id,
                snapshot.video_id,
                snapshot.observed_at.to_rfc3339(),
                snapshot.views,
                snapshot.likes,
                snapshot.comments,
                snapshot.reports,
            ],
        )?;
        Ok(())
    }

    // ============================================
    // Collaborator queries
    // ============================================

    /// Maximum year among video creation instants, `None` on an empty table.
    pub fn max_creation_year(&self) -> Result<Option<i32>> {
        let conn = self.conn.lock().unwrap();
        let year: Option<i32> = conn.query_row(
            "SELECT MAX(CAST(substr(created_at, 1, 4) AS INTEGER)) FROM videos",
            [],
            |row| row.get(0),
        )?;
        Ok(year)
    }

    /// Videos created inside the closed range, optionally for one creator.
    pub fn videos_created_between(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        creator_handle: Option<i64>,
    ) -> Result<Vec<CreatedVideo>> {
        let conn = self.conn.lock().unwrap();

        let mut sql = String::from(
            "SELECT id, creator_handle, created_at FROM videos
             WHERE created_at >= ?1 AND created_at <= ?2",
        );
        let start_text = window_start.to_rfc3339();
        let end_text = window_end.to_rfc3339();
        let mut sql_params: Vec<Box<dyn ToSql>> =
            vec![Box::new(start_text), Box::new(end_text)];

        if let Some(handle) = creator_handle {
            sql.push_str(" AND creator_handle = ?3");
            sql_params.push(Box::new(handle));
        }
        sql.push_str(" ORDER BY created_at ASC, id ASC");

        let params_refs: Vec<&dyn ToSql> = sql_params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let videos = stmt
            .query_map(params_refs.as_slice(), |row| {
                let created_at_text: String = row.get(2)?;
                Ok(CreatedVideo {
                    video_id: row.get(0)?,
                    creator_handle: row.get(1)?,
                    created_at: parse_timestamp(2, created_at_text)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(videos)
    }

    /// Last cumulative views/likes at or before `start` and `end` per video,
    /// restricted to snapshots inside the closed counter window.
    pub fn counter_bounds(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        creator_handle: Option<i64>,
    ) -> Result<Vec<CounterBounds>> {
        let conn = self.conn.lock().unwrap();

        // ?1 = start, ?2 = end, ?3 = window start, ?4 = window end.
        // "Last value at or before the instant" is the newest qualifying
        // snapshot, not the maximum value; corrected (lower) samples must
        // win so the aggregator's clamp can observe them.
        let mut sql = String::from(
            r#"
            SELECT v.id,
                COALESCE((SELECT s.views FROM video_snapshots s
                          WHERE s.video_id = v.id
                            AND s.observed_at >= ?3 AND s.observed_at <= ?4
                            AND s.observed_at <= ?1
                          ORDER BY s.observed_at DESC, s.id DESC LIMIT 1), 0),
                COALESCE((SELECT s.views FROM video_snapshots s
                          WHERE s.video_id = v.id
                            AND s.observed_at >= ?3 AND s.observed_at <= ?4
                            AND s.observed_at <= ?2
                          ORDER BY s.observed_at DESC, s.id DESC LIMIT 1), 0),
                COALESCE((SELECT s.likes FROM video_snapshots s
                          WHERE s.video_id = v.id
                            AND s.observed_at >= ?3 AND s.observed_at <= ?4
                            AND s.observed_at <= ?1
                          ORDER BY s.observed_at DESC, s.id DESC LIMIT 1), 0),
                COALESCE((SELECT s.likes FROM video_snapshots s
                          WHERE s.video_id = v.id
                            AND s.observed_at >= ?3 AND s.observed_at <= ?4
                            AND s.observed_at <= ?2
                          ORDER BY s.observed_at DESC, s.id DESC LIMIT 1), 0)
            FROM videos v
            WHERE EXISTS (SELECT 1 FROM video_snapshots s
                          WHERE s.video_id = v.id
                            AND s.observed_at >= ?3 AND s.observed_at <= ?4)
            "#,
        );

        let mut sql_params: Vec<Box<dyn ToSql>> = vec![
            Box::new(start.to_rfc3339()),
            Box::new(end.to_rfc3339()),
            Box::new(window_start.to_rfc3339()),
            Box::new(window_end.to_rfc3339()),
        ];

        if let Some(handle) = creator_handle {
            sql.push_str(" AND v.creator_handle = ?5");
            sql_params.push(Box::new(handle));
        }
        sql.push_str(" ORDER BY v.id ASC");

        let params_refs: Vec<&dyn ToSql> = sql_params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let bounds = stmt
            .query_map(params_refs.as_slice(), |row| {
                Ok(CounterBounds {
                    video_id: row.get(0)?,
                    views_at_start: row.get(1)?,
                    views_at_end: row.get(2)?,
                    likes_at_start: row.get(3)?,
                    likes_at_end: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(bounds)
    }

    /// Distinct creator handles with a video created inside the closed range.
    pub fn creators_with_videos(
        &self,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<i64>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT creator_handle FROM videos
             WHERE created_at >= ?1 AND created_at <= ?2
             ORDER BY creator_handle ASC",
        )?;
        let handles = stmt
            .query_map(
                params![range_start.to_rfc3339(), range_end.to_rfc3339()],
                |row| row.get(0),
            )?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(handles)
    }

    /// Whole-platform cumulative totals in a single query.
    pub fn platform_totals(&self) -> Result<PlatformTotals> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            r#"
            SELECT
                (SELECT COUNT(*) FROM videos),
                (SELECT COUNT(DISTINCT creator_id) FROM videos),
                (SELECT COUNT(*) FROM video_snapshots),
                (SELECT COALESCE(SUM(views), 0) FROM videos),
                (SELECT COALESCE(SUM(likes), 0) FROM videos),
                (SELECT COALESCE(SUM(comments), 0) FROM videos),
                (SELECT COALESCE(SUM(reports), 0) FROM videos)
            "#,
            [],
            |row| {
                Ok(PlatformTotals {
                    videos: row.get(0)?,
                    creators: row.get(1)?,
                    snapshots: row.get(2)?,
                    views: row.get(3)?,
                    likes: row.get(4)?,
                    comments: row.get(5)?,
                    reports: row.get(6)?,
                })
            },
        )
        .map_err(Error::from)
    }
}

/// Parse a stored RFC 3339 timestamp back into UTC.
fn parse_timestamp(column: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}
