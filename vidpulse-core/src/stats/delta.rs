//! Per-video delta computation
//!
//! Combines the two storage signals into per-video contribution tuples:
//! - the creation-window query defines the entity universe (videos created
//!   inside the platform's creation window, the hard filter) and marks
//!   which of them are new inside the requested period;
//! - the counter-window query supplies cumulative counter values at the
//!   period boundaries, from which the clamped gains are derived.
//!
//! The two queries run without a shared transaction; a narrow read-skew
//! under concurrent writes is accepted.

use std::collections::HashMap;

use crate::error::Result;
use crate::store::{CounterBounds, CounterStore};
use crate::types::{DataPeriod, ResolvedPeriod, VideoDelta};

/// Compute the contribution tuples for one resolved period.
///
/// Videos with no signal (not new, zero gain on every counter) are dropped
/// and never reach the rollup. Storage errors propagate unchanged; nothing
/// is retried here.
pub async fn compute_deltas(
    store: &dyn CounterStore,
    period: &ResolvedPeriod,
    data_period: &DataPeriod,
    creator_handle: Option<i64>,
    max_creator_handle: i64,
) -> Result<Vec<VideoDelta>> {
    let universe = store
        .videos_created_between(
            data_period.creation_start,
            data_period.creation_end,
            creator_handle,
        )
        .await?;

    let bounds = store
        .counter_bounds(
            period.start,
            period.end,
            data_period.counter_start,
            data_period.counter_end,
            creator_handle,
        )
        .await?;

    let bounds_by_video: HashMap<&str, &CounterBounds> = bounds
        .iter()
        .map(|b| (b.video_id.as_str(), b))
        .collect();

    let mut deltas = Vec::new();
    for video in &universe {
        // Handles outside the platform range never contribute
        if !(1..=max_creator_handle).contains(&video.creator_handle) {
            continue;
        }

        let is_new = video.created_at >= period.start && video.created_at < period.end;

        let (views_gained, likes_gained) = match bounds_by_video.get(video.video_id.as_str()) {
            Some(bounds) => (
                clamped_gain(video.video_id.as_str(), "views", bounds.views_at_start, bounds.views_at_end),
                clamped_gain(video.video_id.as_str(), "likes", bounds.likes_at_start, bounds.likes_at_end),
            ),
            None => (0, 0),
        };

        if !is_new && views_gained == 0 && likes_gained == 0 {
            continue;
        }

        deltas.push(VideoDelta {
            video_id: video.video_id.clone(),
            creator_handle: video.creator_handle,
            is_new,
            views_gained,
            likes_gained,
        });
    }

    tracing::debug!(
        period_start = %period.start,
        period_end = %period.end,
        universe = universe.len(),
        contributing = deltas.len(),
        "computed per-video deltas"
    );

    Ok(deltas)
}

/// `max(at_end - at_start, 0)`.
///
/// A negative raw delta means an upstream sample was corrected or
/// reordered; the value is clamped but the occurrence is logged so data
/// quality issues stay visible.
fn clamped_gain(video_id: &str, counter: &str, at_start: i64, at_end: i64) -> i64 {
    let raw = at_end - at_start;
    if raw < 0 {
        tracing::warn!(
            video_id,
            counter,
            at_start,
            at_end,
            "negative counter delta clamped to zero"
        );
        return 0;
    }
    raw
}
