// File: src/validation/business.rs
// Purpose: Date-range business rules on top of bound arguments

use super::session::{BoundData, ValidationSession};
use crate::catalog::codes;
use crate::response::ValidationError;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

pub const START_DATE: &str = "start_date";
pub const END_DATE: &str = "end_date";

/// Longest accepted distance between start and end, in days
pub const MAX_RANGE_DAYS: i64 = 31;
/// A start date this many days away from today is rejected
pub const RANGE_LIMIT_DAYS: i64 = 366;

const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days in `delta`, rounded toward negative infinity
fn floor_days(delta: Duration) -> i64 {
    delta.num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Number of days in the given month, `None` for an invalid month
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        first.with_month(month + 1)?
    };
    next.pred_opt().map(|last| last.day())
}

/// First and last instant of the month containing `anchor`
pub fn month_window(anchor: NaiveDateTime) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let (year, month) = (anchor.year(), anchor.month());
    let start = NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)?;
    let end = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month)?)?
        .and_hms_opt(23, 59, 59)?;
    Some((start, end))
}

impl ValidationSession {
    /// Check a reporting window. The first violated rule is returned.
    ///
    /// Rules, in order: start must not be after end, the window must not be
    /// longer than [`MAX_RANGE_DAYS`], and start must lie within
    /// [`RANGE_LIMIT_DAYS`] of now.
    pub fn validate_date_range(
        &self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<(), ValidationError> {
        if let (Some(start), Some(end)) = (start, end) {
            let days = floor_days(end - start);
            if days < 0 {
                return Err(self.reject(self.message_for(codes::BUSINESS_START_DATE)?));
            }
            if days > MAX_RANGE_DAYS {
                return Err(self.reject(self.message_for(codes::BUSINESS_RANGE_DATE)?));
            }
        }

        if let Some(start) = start {
            let days = floor_days((self.now() - start).abs());
            if days >= RANGE_LIMIT_DAYS {
                return Err(self.reject(self.message_for(codes::BUSINESS_RANGE_LIMIT)?));
            }
        }

        Ok(())
    }

    /// Fill in a whole-month window when either bound is missing.
    ///
    /// The month is taken from `start_date`, else `end_date`, else now.
    pub fn default_range_date(&self, mut data: BoundData) -> BoundData {
        let start = data.get_datetime(START_DATE);
        let end = data.get_datetime(END_DATE);
        if start.is_some() && end.is_some() {
            return data;
        }

        let anchor = start.or(end).unwrap_or_else(|| self.now());
        if let Some((first, last)) = month_window(anchor) {
            data.insert(START_DATE, first);
            data.insert(END_DATE, last);
        }
        data
    }
}
