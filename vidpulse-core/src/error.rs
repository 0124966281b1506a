//! Error types for vidpulse-core

use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for the vidpulse-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Custom period with the end date before the start date
    #[error("invalid period: end date {end} is before start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// Month request outside 1..=12
    #[error("invalid month {month} for year {year}")]
    InvalidMonth { year: i32, month: u32 },

    /// Creator filter outside the valid handle range
    #[error("invalid creator handle {handle}: must be between 1 and {max}")]
    InvalidOwnerHandle { handle: i64, max: i64 },

    /// The storage backend failed or is unreachable
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The data period could not be derived (no videos in storage)
    #[error("engine not initialized: no data year could be derived from storage")]
    NotInitialized,
}

/// Result type alias for vidpulse-core
pub type Result<T> = std::result::Result<T, Error>;
