//! Bounded TTL cache for aggregation results
//!
//! One mutex guards the whole map; every operation is a short critical
//! section and never blocks on I/O. Expiry is checked lazily on reads and
//! writes, never by a background sweeper. Invariant: no entry older than
//! the TTL is ever returned.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::types::{AggregationResult, PeriodKind, ResolvedPeriod};

/// Cache key: regime-independent period identity plus the optional
/// creator filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: PeriodKind,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub creator_handle: Option<i64>,
}

impl CacheKey {
    pub fn new(period: &ResolvedPeriod, creator_handle: Option<i64>) -> Self {
        Self {
            kind: period.kind,
            start: period.start,
            end: period.end,
            creator_handle,
        }
    }
}

struct CacheEntry {
    result: AggregationResult,
    inserted_at: Instant,
    /// Monotonic insertion counter; the eviction order under capacity
    /// pressure is oldest insertion first.
    seq: u64,
}

struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    next_seq: u64,
}

/// In-memory memo of computed aggregation results.
pub struct StatsCache {
    state: Mutex<CacheState>,
    capacity: usize,
    ttl: Duration,
}

impl StatsCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                next_seq: 0,
            }),
            capacity,
            ttl,
        }
    }

    /// Look up a fresh entry. A stale hit counts as a miss and is removed.
    pub fn get(&self, key: &CacheKey) -> Option<AggregationResult> {
        let mut state = self.state.lock().unwrap();
        if let Some(entry) = state.entries.get(key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.result.clone());
            }
        } else {
            return None;
        }
        state.entries.remove(key);
        None
    }

    /// Insert a result, purging expired entries first and evicting the
    /// single oldest insertion if the cache is still at capacity.
    pub fn put(&self, key: CacheKey, result: AggregationResult) {
        let mut state = self.state.lock().unwrap();

        let ttl = self.ttl;
        state.entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);

        if state.entries.len() >= self.capacity && !state.entries.contains_key(&key) {
            if let Some(oldest) = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.seq)
                .map(|(k, _)| k.clone())
            {
                tracing::debug!(?oldest, "evicting oldest cache entry");
                state.entries.remove(&oldest);
            }
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(
            key,
            CacheEntry {
                result,
                inserted_at: Instant::now(),
                seq,
            },
        );
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.state.lock().unwrap().entries.clear();
    }

    /// Number of entries currently held, including any not-yet-purged
    /// expired ones.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
