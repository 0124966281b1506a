//! Core domain types for vidpulse
//!
//! These types model a video platform whose data arrives in two fixed,
//! disjoint calendar sub-ranges per year: videos are *created* during the
//! creation window, and counter *snapshots* are sampled during the counter
//! window. All aggregation in this crate is expressed against that model.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Video** | A content item with a creation instant and cumulative counters |
//! | **Creator** | A content owner, addressed by a stable small-integer handle (1..=N) |
//! | **CounterSnapshot** | A timestamped observation of one video's cumulative counters |
//! | **DataPeriod** | The two per-year sub-windows (creation + counter) plus the data year |
//! | **PeriodRequest** | A caller-supplied period descriptor (day/week/month/custom/all-time) |
//! | **DataRegime** | How a resolved period overlaps the two windows |
//! | **Gain** | The clamped-non-negative increase of a counter between two instants |
//!
//! Counters are *intended* to be non-decreasing, but samples can be corrected
//! or reordered upstream; the aggregator clamps rather than trusts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::WindowConfig;
use crate::error::{Error, Result};

// ============================================
// Storage-owned entities
// ============================================

/// A video as stored by the backend. Read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    /// Unique identifier
    pub id: String,
    /// Opaque owner identity as known to the platform
    pub creator_id: String,
    /// Stable small-integer creator handle (1..=N)
    pub creator_handle: i64,
    /// When the video was published
    pub created_at: DateTime<Utc>,
    /// Current cumulative view count
    pub views: i64,
    /// Current cumulative like count
    pub likes: i64,
    /// Current cumulative comment count
    pub comments: i64,
    /// Current cumulative report count
    pub reports: i64,
}

/// A timestamped observation of one video's cumulative counters.
///
/// Append-only and irregularly spaced. Within one video's history the
/// counters are intended to be non-decreasing; violations are tolerated
/// downstream (see the delta aggregator's clamp).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterSnapshot {
    /// Unique identifier
    pub id: String,
    /// Parent video
    pub video_id: String,
    /// When this observation was taken
    pub observed_at: DateTime<Utc>,
    /// Cumulative view count at `observed_at`
    pub views: i64,
    /// Cumulative like count at `observed_at`
    pub likes: i64,
    /// Cumulative comment count at `observed_at`
    pub comments: i64,
    /// Cumulative report count at `observed_at`
    pub reports: i64,
}

// ============================================
// Data period
// ============================================

/// The fixed per-year data-availability windows.
///
/// Derived once at startup from the maximum creation year observed in
/// storage, then passed by reference into every engine call. Immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPeriod {
    /// First instant of the creation window
    pub creation_start: DateTime<Utc>,
    /// Last instant of the creation window (inclusive)
    pub creation_end: DateTime<Utc>,
    /// First instant of the counter window
    pub counter_start: DateTime<Utc>,
    /// Last instant of the counter window (inclusive)
    pub counter_end: DateTime<Utc>,
    /// The data year both windows belong to
    pub year: i32,
}

impl DataPeriod {
    /// Build the windows for `year` from the configured window months.
    ///
    /// Window ends are the last whole second of their final month, matching
    /// how the platform publishes its availability ranges.
    pub fn for_year(year: i32, windows: &WindowConfig) -> Result<Self> {
        windows.validate()?;

        Ok(Self {
            creation_start: month_start(year, windows.creation_start_month)?,
            creation_end: month_last_instant(year, windows.creation_end_month)?,
            counter_start: month_start(year, windows.counter_start_month)?,
            counter_end: month_last_instant(year, windows.counter_end_month)?,
            year,
        })
    }

    /// The creation window as a pair of instants.
    pub fn creation_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.creation_start, self.creation_end)
    }

    /// The counter window as a pair of instants.
    pub fn counter_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.counter_start, self.counter_end)
    }
}

/// Midnight on the first day of a month, UTC.
fn month_start(year: i32, month: u32) -> Result<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or(Error::InvalidMonth { year, month })?;
    Ok(date.and_time(chrono::NaiveTime::MIN).and_utc())
}

/// The last whole second of a month, UTC.
fn month_last_instant(year: i32, month: u32) -> Result<DateTime<Utc>> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let next = month_start(next_year, next_month)?;
    Ok(next - chrono::Duration::seconds(1))
}

// ============================================
// Period requests
// ============================================

/// A caller-supplied period descriptor, resolved by the period resolver
/// into concrete half-open `[start, end)` boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodRequest {
    /// A single calendar day
    Day(NaiveDate),
    /// The ISO week (Monday..Monday) containing the given date
    Week(NaiveDate),
    /// A calendar month
    Month { year: i32, month: u32 },
    /// An inclusive date range, both ends at day granularity
    Custom { start: NaiveDate, end: NaiveDate },
    /// The full span from creation-window start to counter-window end
    AllTime,
}

impl PeriodRequest {
    /// The kind tag of this request, used in cache keys and results.
    pub fn kind(&self) -> PeriodKind {
        match self {
            PeriodRequest::Day(_) => PeriodKind::Day,
            PeriodRequest::Week(_) => PeriodKind::Week,
            PeriodRequest::Month { .. } => PeriodKind::Month,
            PeriodRequest::Custom { .. } => PeriodKind::Custom,
            PeriodRequest::AllTime => PeriodKind::AllTime,
        }
    }
}

/// Kind tag of a period request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    Day,
    Week,
    Month,
    Custom,
    AllTime,
}

impl PeriodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodKind::Day => "day",
            PeriodKind::Week => "week",
            PeriodKind::Month => "month",
            PeriodKind::Custom => "custom",
            PeriodKind::AllTime => "all_time",
        }
    }
}

impl std::fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Concrete half-open boundaries produced by the period resolver.
///
/// Invariant: `end > start` for every resolvable request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPeriod {
    pub kind: PeriodKind,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

// ============================================
// Availability regimes
// ============================================

/// How a resolved period overlaps the two data-availability windows.
///
/// Advisory metadata attached to every non-error result; it never gates
/// the aggregation queries themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataRegime {
    /// Entirely outside both windows
    None,
    /// Fully inside the creation window
    CreationOnly,
    /// Fully inside the counter window
    CounterOnly,
    /// Any other overlap, including straddling the gap between windows
    Mixed,
}

impl DataRegime {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataRegime::None => "none",
            DataRegime::CreationOnly => "creation_only",
            DataRegime::CounterOnly => "counter_only",
            DataRegime::Mixed => "mixed",
        }
    }
}

impl std::fmt::Display for DataRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================
// Aggregation output
// ============================================

/// Per-video contribution to one aggregation.
///
/// Videos with no signal (not new, zero gain on every counter) never make
/// it into this form; the delta aggregator drops them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoDelta {
    pub video_id: String,
    pub creator_handle: i64,
    pub is_new: bool,
    pub views_gained: i64,
    pub likes_gained: i64,
}

/// Per-creator aggregate used for the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorTotals {
    pub creator_handle: i64,
    pub new_videos: i64,
    pub views_gained: i64,
    pub likes_gained: i64,
}

/// The filters that shaped one aggregation, echoed back for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedFilters {
    /// The data year both windows belong to
    pub year: i32,
    /// The creation window applied as a hard platform filter
    pub creation_window: (DateTime<Utc>, DateTime<Utc>),
    /// The counter window snapshots were restricted to
    pub counter_window: (DateTime<Utc>, DateTime<Utc>),
    /// The single-creator filter, if any
    pub creator_handle: Option<i64>,
}

/// The full result of one period aggregation.
///
/// Immutable once produced; the cache hands the same value back to every
/// caller hitting the same key until expiry. "No data" is a normal result
/// with `has_data == false`, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    /// Kind of the originating request
    pub period: PeriodKind,
    /// Availability regime of the resolved boundaries
    pub regime: DataRegime,
    /// Resolved period start (inclusive)
    pub start: DateTime<Utc>,
    /// Resolved period end (exclusive)
    pub end: DateTime<Utc>,
    /// Whether any video contributed a signal in this period
    pub has_data: bool,
    /// Number of videos that contributed
    pub videos_analyzed: i64,
    /// Videos created inside the period (and the creation window)
    pub new_videos: i64,
    /// Distinct creators with at least one contributing video
    pub active_creators: i64,
    /// Total view gain across contributing videos
    pub views_gained: i64,
    /// Total like gain across contributing videos
    pub likes_gained: i64,
    /// `likes_gained / views_gained * 100`, rounded to 2 decimals; 0 when no views
    pub engagement_rate: f64,
    /// Top creators by view gain
    pub top_creators: Vec<CreatorTotals>,
    /// Echo of the windows and filters applied
    pub filters: AppliedFilters,
}

// ============================================
// Facade metadata
// ============================================

/// Engine self-description returned by the facade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineInfo {
    pub data_year: i32,
    pub cache_size: usize,
    pub cache_ttl_secs: u64,
    pub creation_window: (DateTime<Utc>, DateTime<Utc>),
    pub counter_window: (DateTime<Utc>, DateTime<Utc>),
}

/// Whole-platform cumulative totals, independent of any period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformTotals {
    pub videos: i64,
    pub creators: i64,
    pub snapshots: i64,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub reports: i64,
}
