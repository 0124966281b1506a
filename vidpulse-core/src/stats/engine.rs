//! Aggregation facade
//!
//! [`StatsEngine`] is the entry point the command layer consumes. It owns
//! the storage adapter, the immutable data period derived at startup, and
//! the result cache. Every public operation validates caller input before
//! touching storage and memoizes full results behind the cache.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::cache::{CacheKey, StatsCache};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::period;
use crate::store::CounterStore;
use crate::types::{
    AggregationResult, AppliedFilters, DataPeriod, EngineInfo, PeriodRequest, PlatformTotals,
};

use super::{delta, rollup};

/// The period-bounded delta aggregation engine.
pub struct StatsEngine {
    store: Arc<dyn CounterStore>,
    data_period: DataPeriod,
    cache: StatsCache,
    /// Single-slot memo for platform totals, same TTL as the result cache
    totals_memo: Mutex<Option<(PlatformTotals, Instant)>>,
    config: EngineConfig,
}

impl std::fmt::Debug for StatsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsEngine")
            .field("data_period", &self.data_period)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl StatsEngine {
    /// Construct the engine, deriving the data period from storage.
    ///
    /// Runs the max-year discovery query once; an empty store fails with
    /// [`Error::NotInitialized`] because no data period can be derived.
    pub async fn init(store: Arc<dyn CounterStore>, config: EngineConfig) -> Result<Self> {
        config.windows.validate()?;

        let year = store
            .max_creation_year()
            .await?
            .ok_or(Error::NotInitialized)?;
        let data_period = DataPeriod::for_year(year, &config.windows)?;

        tracing::info!(
            year,
            creation_start = %data_period.creation_start,
            creation_end = %data_period.creation_end,
            counter_start = %data_period.counter_start,
            counter_end = %data_period.counter_end,
            "derived data period from storage"
        );

        let cache = StatsCache::new(
            config.cache.capacity,
            Duration::from_secs(config.cache.ttl_secs),
        );

        Ok(Self {
            store,
            data_period,
            cache,
            totals_memo: Mutex::new(None),
            config,
        })
    }

    /// The immutable data period this engine was initialized with.
    pub fn data_period(&self) -> &DataPeriod {
        &self.data_period
    }

    /// Aggregate statistics for a period across all creators.
    pub async fn period_stats(&self, request: PeriodRequest) -> Result<AggregationResult> {
        self.stats_for(request, None).await
    }

    /// Aggregate statistics for a period, scoped to one creator.
    ///
    /// Fails with [`Error::InvalidOwnerHandle`] before any storage access
    /// when the handle is outside the valid range.
    pub async fn creator_stats(
        &self,
        handle: i64,
        request: PeriodRequest,
    ) -> Result<AggregationResult> {
        let max = self.config.max_creator_handle;
        if !(1..=max).contains(&handle) {
            return Err(Error::InvalidOwnerHandle { handle, max });
        }
        self.stats_for(request, Some(handle)).await
    }

    async fn stats_for(
        &self,
        request: PeriodRequest,
        creator_handle: Option<i64>,
    ) -> Result<AggregationResult> {
        let period = period::resolve(&request, &self.data_period)?;
        let key = CacheKey::new(&period, creator_handle);

        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!(
                kind = %period.kind,
                start = %period.start,
                end = %period.end,
                "returning cached aggregation"
            );
            return Ok(cached);
        }

        let regime = period::classify(period.start, period.end, &self.data_period);
        let deltas = delta::compute_deltas(
            self.store.as_ref(),
            &period,
            &self.data_period,
            creator_handle,
            self.config.max_creator_handle,
        )
        .await?;

        let filters = AppliedFilters {
            year: self.data_period.year,
            creation_window: self.data_period.creation_window(),
            counter_window: self.data_period.counter_window(),
            creator_handle,
        };
        let result = rollup::rollup(
            &deltas,
            &period,
            regime,
            filters,
            self.config.leaderboard_size,
        );

        tracing::info!(
            kind = %period.kind,
            regime = %regime,
            has_data = result.has_data,
            videos = result.videos_analyzed,
            "aggregation computed"
        );

        self.cache.put(key, result.clone());
        Ok(result)
    }

    /// Creator handles with at least one video inside the full data span.
    pub async fn available_creator_handles(&self) -> Result<Vec<i64>> {
        let handles = self
            .store
            .creators_with_videos(self.data_period.creation_start, self.data_period.counter_end)
            .await?;

        let max = self.config.max_creator_handle;
        Ok(handles
            .into_iter()
            .filter(|h| (1..=max).contains(h))
            .collect())
    }

    /// Engine self-description for the command layer.
    pub fn engine_info(&self) -> EngineInfo {
        EngineInfo {
            data_year: self.data_period.year,
            cache_size: self.cache.len(),
            cache_ttl_secs: self.cache.ttl().as_secs(),
            creation_window: self.data_period.creation_window(),
            counter_window: self.data_period.counter_window(),
        }
    }

    /// Whole-platform cumulative totals, memoized with the cache TTL.
    pub async fn platform_totals(&self) -> Result<PlatformTotals> {
        if let Some((totals, inserted_at)) = *self.totals_memo.lock().unwrap() {
            if inserted_at.elapsed() < self.cache.ttl() {
                return Ok(totals);
            }
        }

        let totals = self.store.platform_totals().await?;
        *self.totals_memo.lock().unwrap() = Some((totals, Instant::now()));
        Ok(totals)
    }

    /// Drop every memoized result.
    pub fn clear_cache(&self) {
        self.cache.clear();
        *self.totals_memo.lock().unwrap() = None;
        tracing::info!("aggregation cache cleared");
    }
}
