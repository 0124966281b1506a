//! Rollup and ranking of per-video deltas
//!
//! Pure functions: the delta set fully determines the result. An empty
//! delta set produces a distinct no-data result rather than zero-filled
//! success, so the command layer can render the two differently.

use std::collections::BTreeMap;

use crate::types::{
    AggregationResult, AppliedFilters, CreatorTotals, DataRegime, ResolvedPeriod, VideoDelta,
};

/// Roll the contribution tuples up into period totals and a leaderboard.
pub fn rollup(
    deltas: &[VideoDelta],
    period: &ResolvedPeriod,
    regime: DataRegime,
    filters: AppliedFilters,
    leaderboard_size: usize,
) -> AggregationResult {
    if deltas.is_empty() {
        return no_data_result(period, regime, filters);
    }

    let mut new_videos = 0i64;
    let mut views_gained = 0i64;
    let mut likes_gained = 0i64;
    let mut per_creator: BTreeMap<i64, CreatorTotals> = BTreeMap::new();

    for delta in deltas {
        let entry = per_creator
            .entry(delta.creator_handle)
            .or_insert_with(|| CreatorTotals {
                creator_handle: delta.creator_handle,
                new_videos: 0,
                views_gained: 0,
                likes_gained: 0,
            });

        if delta.is_new {
            entry.new_videos += 1;
            new_videos += 1;
        }
        entry.views_gained += delta.views_gained;
        entry.likes_gained += delta.likes_gained;
        views_gained += delta.views_gained;
        likes_gained += delta.likes_gained;
    }

    let active_creators = per_creator.len() as i64;

    let mut top_creators: Vec<CreatorTotals> = per_creator.into_values().collect();
    top_creators.sort_by(|a, b| {
        b.views_gained
            .cmp(&a.views_gained)
            .then(a.creator_handle.cmp(&b.creator_handle))
    });
    top_creators.truncate(leaderboard_size);

    AggregationResult {
        period: period.kind,
        regime,
        start: period.start,
        end: period.end,
        has_data: true,
        videos_analyzed: deltas.len() as i64,
        new_videos,
        active_creators,
        views_gained,
        likes_gained,
        engagement_rate: engagement_rate(views_gained, likes_gained),
        top_creators,
        filters,
    }
}

/// `likes / views * 100` rounded to 2 decimals, 0 when there are no views.
pub fn engagement_rate(views_gained: i64, likes_gained: i64) -> f64 {
    if views_gained <= 0 {
        return 0.0;
    }
    let rate = likes_gained as f64 / views_gained as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

fn no_data_result(
    period: &ResolvedPeriod,
    regime: DataRegime,
    filters: AppliedFilters,
) -> AggregationResult {
    AggregationResult {
        period: period.kind,
        regime,
        start: period.start,
        end: period.end,
        has_data: false,
        videos_analyzed: 0,
        new_videos: 0,
        active_creators: 0,
        views_gained: 0,
        likes_gained: 0,
        engagement_rate: 0.0,
        top_creators: vec![],
        filters,
    }
}
