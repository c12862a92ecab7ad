//! Calendar-month eligibility windows.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// The calendar month `offset` months away from the month containing `reference`.
///
/// Returns `None` only when the target month falls outside chrono's date range.
pub fn month_range(reference: NaiveDate, offset: i32) -> Option<DateWindow> {
    let start = first_of_month(reference, offset)?;
    let end = first_of_month(reference, offset.checked_add(1)?)?;
    Some(DateWindow {
        start: start.and_time(NaiveTime::MIN).and_utc(),
        end: end.and_time(NaiveTime::MIN).and_utc(),
    })
}

/// [`month_range`] relative to today (UTC).
pub fn offset_month_range(offset: i32) -> Option<DateWindow> {
    month_range(Utc::now().date_naive(), offset)
}

fn first_of_month(reference: NaiveDate, offset: i32) -> Option<NaiveDate> {
    let months = i64::from(reference.year()) * 12 + i64::from(reference.month0()) + i64::from(offset);
    let year = i32::try_from(months.div_euclid(12)).ok()?;
    let month = u32::try_from(months.rem_euclid(12)).ok()? + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
}
