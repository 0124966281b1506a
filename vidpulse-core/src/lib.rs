//! # vidpulse-core
//!
//! Period-bounded delta aggregation engine for video platform statistics.
//!
//! This library provides:
//! - Period resolution (day/week/month/custom/all-time) into half-open
//!   `[start, end)` boundaries
//! - Availability classification against the platform's fixed per-year
//!   creation and counter windows
//! - Per-video counter-gain computation from irregularly sampled
//!   cumulative snapshots, with totals, engagement, and a creator
//!   leaderboard
//! - A bounded, time-expiring result cache
//! - A reference SQLite storage backend behind the async
//!   [`CounterStore`] seam
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vidpulse_core::{Config, Database, PeriodRequest, SqliteCounterStore, StatsEngine};
//!
//! # async fn run() -> vidpulse_core::Result<()> {
//! let config = Config::load()?;
//!
//! let db = Database::open(&config.database_path())?;
//! db.migrate()?;
//!
//! let store = Arc::new(SqliteCounterStore::new(Arc::new(db)));
//! let engine = StatsEngine::init(store, config.engine.clone()).await?;
//!
//! let stats = engine
//!     .period_stats(PeriodRequest::Month { year: 2023, month: 9 })
//!     .await?;
//! println!("{} new videos", stats.new_videos);
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use config::{Config, EngineConfig};
pub use db::{Database, SqliteCounterStore};
pub use error::{Error, Result};
pub use stats::StatsEngine;
pub use store::CounterStore;
pub use types::*;

// Public modules
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod period;
pub mod stats;
pub mod store;
pub mod types;
