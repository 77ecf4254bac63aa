//! Business-day arithmetic in a configurable time zone.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use store::TimeRange;

use crate::error::{ReportError, Result};

/// Time zone in which business days start and end.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Jakarta;

/// Maps calendar dates in the business time zone onto UTC time ranges.
///
/// A business day `d` covers `[midnight(d), midnight(d + 1))` local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessCalendar {
    tz: Tz,
    epoch: NaiveDate,
}

impl BusinessCalendar {
    /// Creates a calendar. `epoch` is the first date covered by range
    /// reports that omit their start date.
    pub fn new(tz: Tz, epoch: NaiveDate) -> Self {
        Self { tz, epoch }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn epoch(&self) -> NaiveDate {
        self.epoch
    }

    /// Returns the local calendar date of an instant.
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.tz).date_naive()
    }

    /// Returns the instant a local calendar day begins.
    ///
    /// When midnight falls into a DST gap the day begins at the first local
    /// time that exists.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(NaiveTime::MIN);
        (0..=3)
            .find_map(|hours| {
                self.tz
                    .from_local_datetime(&(midnight + Duration::hours(hours)))
                    .earliest()
            })
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
    }

    /// Returns the range covering one whole business day.
    pub fn day(&self, date: NaiveDate) -> Result<TimeRange> {
        let next = next_day(date)?;
        range(self.start_of_day(date), self.start_of_day(next))
    }

    /// Returns the business day containing `now`.
    pub fn today(&self, now: DateTime<Utc>) -> Result<TimeRange> {
        self.day(self.local_date(now))
    }

    /// Resolves an optional pair of calendar dates into a time range.
    ///
    /// `start` defaults to the epoch. A supplied `end` covers that whole
    /// day; a missing one ends the range at `now`.
    pub fn range(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<TimeRange> {
        let start_date = start.unwrap_or(self.epoch);

        let end_at = match end {
            Some(end_date) => {
                if end_date < start_date {
                    return Err(ReportError::InvalidRequest(format!(
                        "start_date {start_date} is after end_date {end_date}"
                    )));
                }
                self.start_of_day(next_day(end_date)?)
            }
            None => now,
        };

        range(self.start_of_day(start_date), end_at)
    }
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self::new(
            DEFAULT_TIMEZONE,
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or(NaiveDate::MIN),
        )
    }
}

fn next_day(date: NaiveDate) -> Result<NaiveDate> {
    date.succ_opt()
        .ok_or_else(|| ReportError::InvalidRequest(format!("date {date} is out of range")))
}

fn range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<TimeRange> {
    TimeRange::new(start, end).map_err(|_| {
        ReportError::InvalidRequest(format!("period end {end} is before its start {start}"))
    })
}
