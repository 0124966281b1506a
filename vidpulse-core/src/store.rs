//! Storage adapter seam for the aggregation engine
//!
//! The engine never talks to a database directly; it consumes the
//! [`CounterStore`] trait. Every method may suspend the calling task while
//! awaiting storage I/O. Failures surface as
//! [`Error::StorageUnavailable`](crate::Error::StorageUnavailable) and are
//! never retried at this layer.
//!
//! The two period queries (creation-window and counter-window) run without
//! a shared transaction; a narrow read-skew under concurrent writes is an
//! accepted property of the design.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::PlatformTotals;

/// A video row from the creation-window query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedVideo {
    pub video_id: String,
    pub creator_handle: i64,
    pub created_at: DateTime<Utc>,
}

/// Per-video cumulative counter values at the two period boundaries.
///
/// Each value is the last observation at or before the corresponding
/// instant, restricted to snapshots inside the counter window; 0 when no
/// qualifying snapshot exists. Only videos with at least one qualifying
/// snapshot are reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterBounds {
    pub video_id: String,
    pub views_at_start: i64,
    pub views_at_end: i64,
    pub likes_at_start: i64,
    pub likes_at_end: i64,
}

/// Read-only queries the storage backend must provide.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Maximum year among video creation instants, or `None` for an empty
    /// store. Used once at startup to derive the data period.
    async fn max_creation_year(&self) -> Result<Option<i32>>;

    /// Videos whose creation instant falls in the closed range
    /// `[window_start, window_end]`, optionally restricted to one creator.
    async fn videos_created_between(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        creator_handle: Option<i64>,
    ) -> Result<Vec<CreatedVideo>>;

    /// Last cumulative views/likes at or before `start` and at or before
    /// `end`, per video, considering only snapshots inside the closed
    /// counter window `[window_start, window_end]`.
    async fn counter_bounds(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        creator_handle: Option<i64>,
    ) -> Result<Vec<CounterBounds>>;

    /// Distinct creator handles with at least one video created inside the
    /// closed range, ascending.
    async fn creators_with_videos(
        &self,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<i64>>;

    /// Whole-platform cumulative totals.
    async fn platform_totals(&self) -> Result<PlatformTotals>;
}
