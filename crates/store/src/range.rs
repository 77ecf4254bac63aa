use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Result, StoreError};

/// Half-open time interval `[start, end)` used to scope sales queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    /// Creates a range, rejecting an end that precedes the start.
    ///
    /// `start == end` is allowed and describes an empty interval.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end < start {
            return Err(StoreError::InvalidTimeRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Inclusive lower bound.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive upper bound.
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns true if `at` falls inside `[start, end)`.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    /// Returns true if no instant can fall inside the range.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
