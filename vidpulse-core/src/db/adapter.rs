//! Async adapter exposing the SQLite repository as a [`CounterStore`]
//!
//! SQLite access is blocking, so every call hops onto the tokio blocking
//! pool via `spawn_blocking`. Storage failures of any kind (including a
//! lost blocking task) surface as `StorageUnavailable`; retrying is the
//! caller's concern, never this layer's.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::store::{CounterBounds, CounterStore, CreatedVideo};
use crate::types::PlatformTotals;

use super::repo::Database;

/// [`CounterStore`] implementation backed by the embedded SQLite database.
#[derive(Clone)]
pub struct SqliteCounterStore {
    db: Arc<Database>,
}

impl SqliteCounterStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn run_blocking<T, F>(&self, query: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || query(&db))
            .await
            .map_err(|e| Error::StorageUnavailable(e.to_string()))?
            .map_err(|e| Error::StorageUnavailable(e.to_string()))
    }
}

#[async_trait]
impl CounterStore for SqliteCounterStore {
    async fn max_creation_year(&self) -> Result<Option<i32>> {
        self.run_blocking(|db| db.max_creation_year()).await
    }

    async fn videos_created_between(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        creator_handle: Option<i64>,
    ) -> Result<Vec<CreatedVideo>> {
        self.run_blocking(move |db| {
            db.videos_created_between(window_start, window_end, creator_handle)
        })
        .await
    }

    async fn counter_bounds(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        creator_handle: Option<i64>,
    ) -> Result<Vec<CounterBounds>> {
        self.run_blocking(move |db| {
            db.counter_bounds(start, end, window_start, window_end, creator_handle)
        })
        .await
    }

    async fn creators_with_videos(
        &self,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<i64>> {
        self.run_blocking(move |db| db.creators_with_videos(range_start, range_end))
            .await
    }

    async fn platform_totals(&self) -> Result<PlatformTotals> {
        self.run_blocking(|db| db.platform_totals()).await
    }
}
