//! Builds the list of forecast run dates a pipeline works through.

use chrono::{Days, NaiveDate};

/// Returns `count` consecutive calendar dates, starting at (and including) `start`.
///
/// A `count` of zero yields an empty list. Dates that would overflow the calendar are
/// cut off, which only matters for starts near `NaiveDate::MAX`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use forecast_point::date_range;
///
/// let start = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
/// let dates = date_range(start, 2);
/// assert_eq!(dates, vec![start, NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()]);
/// ```
pub fn date_range(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    (0..count as u64)
        .map_while(|offset| start.checked_add_days(Days::new(offset)))
        .collect()
}
