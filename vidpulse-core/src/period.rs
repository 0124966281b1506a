//! Period resolution and availability classification
//!
//! Two pure functions over the domain types:
//! - [`resolve`] maps a [`PeriodRequest`] to concrete half-open
//!   `[start, end)` boundaries at day granularity (except all-time, which
//!   uses the exact [`DataPeriod`] instants).
//! - [`classify`] labels a resolved period with the [`DataRegime`]
//!   describing how it overlaps the creation and counter windows.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

use crate::error::{Error, Result};
use crate::types::{DataPeriod, DataRegime, PeriodKind, PeriodRequest, ResolvedPeriod};

/// Resolve a period request into `[start, end)` boundaries.
///
/// `end` is always exclusive and strictly greater than `start`. A custom
/// request with the end date before the start date fails with
/// [`Error::InvalidRange`] before any storage access happens.
pub fn resolve(request: &PeriodRequest, data_period: &DataPeriod) -> Result<ResolvedPeriod> {
    let (start, end) = match *request {
        PeriodRequest::Day(date) => day_bounds(date),
        PeriodRequest::Week(date) => week_bounds(date),
        PeriodRequest::Month { year, month } => month_bounds(year, month)?,
        PeriodRequest::Custom { start, end } => {
            if end < start {
                return Err(Error::InvalidRange { start, end });
            }
            (midnight(start), midnight(end) + Duration::days(1))
        }
        PeriodRequest::AllTime => (data_period.creation_start, data_period.counter_end),
    };

    Ok(ResolvedPeriod {
        kind: request.kind(),
        start,
        end,
    })
}

/// Classify how `[start, end)` overlaps the two data windows.
///
/// Exactly one regime is returned for any input. The classification is
/// advisory: the aggregator queries both signals regardless and lets
/// absence of data drive the no-data outcome.
pub fn classify(start: DateTime<Utc>, end: DateTime<Utc>, data_period: &DataPeriod) -> DataRegime {
    if end <= data_period.creation_start || start >= data_period.counter_end {
        return DataRegime::None;
    }

    if start >= data_period.creation_start && end <= data_period.creation_end {
        return DataRegime::CreationOnly;
    }

    if start >= data_period.counter_start && end <= data_period.counter_end {
        return DataRegime::CounterOnly;
    }

    DataRegime::Mixed
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = midnight(date);
    (start, start + Duration::days(1))
}

fn week_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    let start = midnight(monday);
    (start, start + Duration::days(7))
}

fn month_bounds(year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or(Error::InvalidMonth { year, month })?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    // month+1 is valid whenever month was
    let next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .ok_or(Error::InvalidMonth { year, month })?;
    Ok((midnight(first), midnight(next)))
}
