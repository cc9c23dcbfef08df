use chrono::NaiveDate;

use crate::error::{PalError, PalResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(value: &str) -> PalResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
        PalError::config(format!("invalid date '{}', expected YYYY-MM-DD: {}", value, e))
    })
}

/// Every calendar date from `start` to `end` inclusive.
///
/// `today` is the UTC date the run started on; a range beginning before it
/// has already elapsed.
pub fn create_dates(
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
) -> PalResult<Vec<NaiveDate>> {
    if start > end {
        return Err(PalError::config(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }
    if start < today {
        return Err(PalError::config(format!(
            "start date {} is in the past (today is {})",
            start, today
        )));
    }
    Ok(start.iter_days().take_while(|d| *d <= end).collect())
}
