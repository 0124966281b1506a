//! Integration tests for the vidpulse aggregation engine
//!
//! These tests exercise the full pipeline (facade -> SQLite store ->
//! delta aggregation -> rollup -> cache) against an in-memory database.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use vidpulse_core::config::CacheConfig;
use vidpulse_core::store::{CounterBounds, CreatedVideo};
use vidpulse_core::{
    CounterSnapshot, CounterStore, Database, EngineConfig, Error, PeriodRequest, PlatformTotals,
    Result, SqliteCounterStore, StatsEngine, Video,
};

// ============================================
// Helpers
// ============================================

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn date(s: &str) -> chrono::NaiveDate {
    s.parse().unwrap()
}

fn video(id: &str, handle: i64, created_at: &str) -> Video {
    Video {
        id: id.to_string(),
        creator_id: format!("creator-{handle}"),
        creator_handle: handle,
        created_at: ts(created_at),
        views: 0,
        likes: 0,
        comments: 0,
        reports: 0,
    }
}

fn snapshot(id: &str, video_id: &str, observed_at: &str, views: i64, likes: i64) -> CounterSnapshot {
    CounterSnapshot {
        id: id.to_string(),
        video_id: video_id.to_string(),
        observed_at: ts(observed_at),
        views,
        likes,
        comments: 0,
        reports: 0,
    }
}

/// Seed the standard fixture: one creator-5 video with November growth,
/// one creator-7 video created in September without snapshots.
fn seeded_db() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.migrate().unwrap();

    db.upsert_video(&video("v-growth", 5, "2023-08-15T12:00:00Z")).unwrap();
    db.insert_snapshot(&snapshot("s1", "v-growth", "2023-11-01T00:00:00Z", 100, 10)).unwrap();
    db.insert_snapshot(&snapshot("s2", "v-growth", "2023-11-05T00:00:00Z", 150, 14)).unwrap();

    db.upsert_video(&video("v-september", 7, "2023-09-01T09:00:00Z")).unwrap();

    db
}

async fn engine_over(db: Database) -> StatsEngine {
    let store = Arc::new(SqliteCounterStore::new(Arc::new(db)));
    StatsEngine::init(store, EngineConfig::default())
        .await
        .unwrap()
}

/// Store wrapper that counts every query reaching real storage, so tests
/// can prove cache hits never touch the backend.
struct CountingStore {
    inner: SqliteCounterStore,
    queries: AtomicUsize,
}

impl CountingStore {
    fn new(db: Database) -> Self {
        Self {
            inner: SqliteCounterStore::new(Arc::new(db)),
            queries: AtomicUsize::new(0),
        }
    }

    fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CounterStore for CountingStore {
    async fn max_creation_year(&self) -> Result<Option<i32>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.max_creation_year().await
    }

    async fn videos_created_between(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        creator_handle: Option<i64>,
    ) -> Result<Vec<CreatedVideo>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner
            .videos_created_between(window_start, window_end, creator_handle)
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
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner
            .counter_bounds(start, end, window_start, window_end, creator_handle)
            .await
    }

    async fn creators_with_videos(
        &self,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<i64>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.creators_with_videos(range_start, range_end).await
    }

    async fn platform_totals(&self) -> Result<PlatformTotals> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.platform_totals().await
    }
}

// ============================================
// Period scenarios
// ============================================

#[tokio::test]
async fn test_new_video_without_snapshots_counts_as_new() {
    // Scenario: a video created 2023-09-01 with no counter-window
    // snapshots still shows up as new for September
    let engine = engine_over(seeded_db()).await;

    let stats = engine
        .period_stats(PeriodRequest::Month {
            year: 2023,
            month: 9,
        })
        .await
        .unwrap();

    assert!(stats.has_data);
    assert_eq!(stats.new_videos, 1);
    assert_eq!(stats.views_gained, 0);
    assert_eq!(stats.likes_gained, 0);
    assert_eq!(stats.regime.as_str(), "creation_only");
    assert_eq!(stats.top_creators.len(), 1);
    assert_eq!(stats.top_creators[0].creator_handle, 7);
}

#[tokio::test]
async fn test_custom_period_counter_gain() {
    // Scenario: snapshots at 100 and 150 views across the period yield a
    // 50-view gain; the snapshot sitting exactly on the period start is
    // the baseline
    let engine = engine_over(seeded_db()).await;

    let stats = engine
        .period_stats(PeriodRequest::Custom {
            start: date("2023-11-01"),
            end: date("2023-11-05"),
        })
        .await
        .unwrap();

    assert!(stats.has_data);
    assert_eq!(stats.views_gained, 50);
    assert_eq!(stats.likes_gained, 4);
    assert_eq!(stats.new_videos, 0);
    assert_eq!(stats.engagement_rate, 8.0);
    assert_eq!(stats.regime.as_str(), "counter_only");
    assert_eq!(stats.active_creators, 1);
}

#[tokio::test]
async fn test_period_outside_both_windows_has_no_data() {
    // Scenario: January is outside both windows; distinct from an error
    let engine = engine_over(seeded_db()).await;

    let stats = engine
        .period_stats(PeriodRequest::Custom {
            start: date("2023-01-01"),
            end: date("2023-01-31"),
        })
        .await
        .unwrap();

    assert!(!stats.has_data);
    assert_eq!(stats.regime.as_str(), "none");
    assert_eq!(stats.views_gained, 0);
    assert_eq!(stats.start, ts("2023-01-01T00:00:00Z"));
    assert_eq!(stats.end, ts("2023-02-01T00:00:00Z"));
    assert_eq!(stats.filters.year, 2023);
}

#[tokio::test]
async fn test_out_of_range_creator_handle_rejected() {
    // Scenario: handle 20 is outside the valid 1..=19 range
    let engine = engine_over(seeded_db()).await;

    let err = engine
        .creator_stats(20, PeriodRequest::AllTime)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidOwnerHandle {
            handle: 20,
            max: 19
        }
    ));
}

#[tokio::test]
async fn test_reversed_custom_range_rejected() {
    let engine = engine_over(seeded_db()).await;

    let err = engine
        .period_stats(PeriodRequest::Custom {
            start: date("2023-11-05"),
            end: date("2023-11-01"),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRange { .. }));
}

#[tokio::test]
async fn test_cache_evicts_first_inserted_key() {
    // Scenario: capacity 2, TTL 300s; after three inserts the first key is
    // gone and the two most recent are served without re-query
    let store = Arc::new(CountingStore::new(seeded_db()));
    let config = EngineConfig {
        cache: CacheConfig {
            capacity: 2,
            ttl_secs: 300,
        },
        ..EngineConfig::default()
    };
    let engine = StatsEngine::init(store.clone(), config).await.unwrap();

    let months: Vec<PeriodRequest> = (9..=11)
        .map(|month| PeriodRequest::Month { year: 2023, month })
        .collect();
    for request in &months {
        engine.period_stats(*request).await.unwrap();
    }
    let after_fill = store.query_count();

    // The two most recent keys are cached
    engine.period_stats(months[1]).await.unwrap();
    engine.period_stats(months[2]).await.unwrap();
    assert_eq!(store.query_count(), after_fill);

    // The first-inserted key was evicted and recomputes
    engine.period_stats(months[0]).await.unwrap();
    assert!(store.query_count() > after_fill);
}

// ============================================
// Properties
// ============================================

#[tokio::test]
async fn test_idempotent_and_cached() {
    let store = Arc::new(CountingStore::new(seeded_db()));
    let engine = StatsEngine::init(store.clone(), EngineConfig::default())
        .await
        .unwrap();

    let request = PeriodRequest::Custom {
        start: date("2023-11-01"),
        end: date("2023-11-05"),
    };
    let first = engine.period_stats(request).await.unwrap();
    let after_first = store.query_count();
    let second = engine.period_stats(request).await.unwrap();

    // Byte-identical results, no storage traffic for the second call
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(store.query_count(), after_first);
}

#[tokio::test]
async fn test_corrected_sample_clamps_to_zero() {
    // A later snapshot below an earlier one must never produce a negative
    // gain
    let db = Database::open_in_memory().unwrap();
    db.migrate().unwrap();
    db.upsert_video(&video("v1", 3, "2023-08-20T00:00:00Z")).unwrap();
    db.insert_snapshot(&snapshot("s1", "v1", "2023-11-01T12:00:00Z", 100, 10)).unwrap();
    db.insert_snapshot(&snapshot("s2", "v1", "2023-11-10T12:00:00Z", 80, 20)).unwrap();

    let engine = engine_over(db).await;
    let stats = engine
        .period_stats(PeriodRequest::Custom {
            start: date("2023-11-02"),
            end: date("2023-11-15"),
        })
        .await
        .unwrap();

    assert!(stats.has_data);
    assert_eq!(stats.views_gained, 0);
    assert_eq!(stats.likes_gained, 10);
    assert!(stats.engagement_rate >= 0.0);
}

#[tokio::test]
async fn test_creation_window_is_a_hard_filter() {
    // A December-created video is outside the creation window: it neither
    // counts as new nor contributes gains, even with November snapshots
    let db = seeded_db();
    db.upsert_video(&video("v-december", 2, "2023-12-01T00:00:00Z")).unwrap();
    db.insert_snapshot(&snapshot("sx", "v-december", "2023-12-10T00:00:00Z", 500, 50)).unwrap();

    let engine = engine_over(db).await;
    let stats = engine.period_stats(PeriodRequest::AllTime).await.unwrap();

    assert!(stats.has_data);
    assert!(stats
        .top_creators
        .iter()
        .all(|c| c.creator_handle != 2));
    // Only the growth video contributes counters
    assert_eq!(stats.views_gained, 150);
}

#[tokio::test]
async fn test_init_fails_on_empty_store() {
    let db = Database::open_in_memory().unwrap();
    db.migrate().unwrap();
    let store = Arc::new(SqliteCounterStore::new(Arc::new(db)));

    let err = StatsEngine::init(store, EngineConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotInitialized));
}

// ============================================
// Facade surface
// ============================================

#[tokio::test]
async fn test_all_time_leaderboard_and_info() {
    let db = seeded_db();
    db.upsert_video(&video("v-big", 9, "2023-10-01T00:00:00Z")).unwrap();
    db.insert_snapshot(&snapshot("sb1", "v-big", "2023-11-02T00:00:00Z", 0, 0)).unwrap();
    db.insert_snapshot(&snapshot("sb2", "v-big", "2023-12-20T00:00:00Z", 900, 90)).unwrap();

    let engine = engine_over(db).await;
    let stats = engine.period_stats(PeriodRequest::AllTime).await.unwrap();

    assert!(stats.has_data);
    assert_eq!(stats.regime.as_str(), "mixed");
    // All three creation-window videos are new over the full span
    assert_eq!(stats.new_videos, 3);
    assert_eq!(stats.active_creators, 3);
    let handles: Vec<i64> = stats
        .top_creators
        .iter()
        .map(|c| c.creator_handle)
        .collect();
    assert_eq!(handles, vec![9, 5, 7]);

    let info = engine.engine_info();
    assert_eq!(info.data_year, 2023);
    assert_eq!(info.creation_window.0, ts("2023-08-01T00:00:00Z"));
    assert_eq!(info.counter_window.1, ts("2023-12-31T23:59:59Z"));
    assert!(info.cache_size >= 1);

    let handles = engine.available_creator_handles().await.unwrap();
    assert_eq!(handles, vec![5, 7, 9]);
}

#[tokio::test]
async fn test_creator_scoped_stats() {
    let engine = engine_over(seeded_db()).await;

    let stats = engine
        .creator_stats(5, PeriodRequest::AllTime)
        .await
        .unwrap();
    assert!(stats.has_data);
    assert_eq!(stats.views_gained, 150);
    assert_eq!(stats.new_videos, 1);
    assert_eq!(stats.filters.creator_handle, Some(5));

    // Creator 7 has a new video but no counter growth
    let stats = engine
        .creator_stats(7, PeriodRequest::AllTime)
        .await
        .unwrap();
    assert!(stats.has_data);
    assert_eq!(stats.views_gained, 0);
    assert_eq!(stats.new_videos, 1);

    // Creator 1 owns nothing at all
    let stats = engine
        .creator_stats(1, PeriodRequest::AllTime)
        .await
        .unwrap();
    assert!(!stats.has_data);
}

#[tokio::test]
async fn test_platform_totals_and_clear_cache() {
    let db = seeded_db();
    db.upsert_video(&Video {
        views: 250,
        likes: 25,
        comments: 3,
        reports: 1,
        ..video("v-totals", 4, "2023-09-10T00:00:00Z")
    })
    .unwrap();

    let store = Arc::new(CountingStore::new(db));
    let engine = StatsEngine::init(store.clone(), EngineConfig::default())
        .await
        .unwrap();

    let totals = engine.platform_totals().await.unwrap();
    assert_eq!(totals.videos, 3);
    assert_eq!(totals.creators, 3);
    assert_eq!(totals.snapshots, 2);
    assert_eq!(totals.views, 250);
    assert_eq!(totals.comments, 3);

    let after_first = store.query_count();
    engine.platform_totals().await.unwrap();
    assert_eq!(store.query_count(), after_first, "memoized");

    engine.clear_cache();
    engine.platform_totals().await.unwrap();
    assert_eq!(store.query_count(), after_first + 1);
}
