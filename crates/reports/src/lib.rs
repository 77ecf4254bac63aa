//! Sales report aggregator.
//!
//! Read-only summaries of persisted sales over half-open time ranges, plus
//! the business calendar that turns calendar dates into those ranges.

pub mod calendar;
pub mod error;
pub mod report;
pub mod service;

pub use calendar::BusinessCalendar;
pub use error::{ReportError, Result};
pub use report::PeriodReport;
pub use service::ReportService;
pub use store::{BestSeller, TimeRange};
