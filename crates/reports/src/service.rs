//! Report service.

use chrono::{DateTime, NaiveDate, Utc};
use store::{SalesStore, TimeRange};

use crate::calendar::BusinessCalendar;
use crate::error::Result;
use crate::report::PeriodReport;

/// Service answering sales report queries.
///
/// Every query is read-only. Two calls over the same range with no sales in
/// between return the same report.
pub struct ReportService<S: SalesStore> {
    store: S,
    calendar: BusinessCalendar,
}

impl<S: SalesStore> ReportService<S> {
    /// Creates a new report service.
    pub fn new(store: S, calendar: BusinessCalendar) -> Self {
        Self { store, calendar }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    /// Summarizes the sales created inside `range`.
    #[tracing::instrument(skip(self), fields(start = %range.start(), end = %range.end()))]
    pub async fn summarize(&self, range: TimeRange) -> Result<PeriodReport> {
        let summary = self.store.period_summary(range).await?;
        let best_seller = if summary.total_transaction == 0 {
            None
        } else {
            self.store.best_seller(range).await?
        };

        metrics::counter!("reports_generated_total").increment(1);
        tracing::debug!(
            total_transaction = summary.total_transaction,
            total_revenue = %summary.total_revenue,
            "report generated"
        );

        Ok(PeriodReport::new(summary, best_seller))
    }

    /// Summarizes the business day containing `now`.
    pub async fn today_report(&self, now: DateTime<Utc>) -> Result<PeriodReport> {
        let range = self.calendar.today(now)?;
        self.summarize(range).await
    }

    /// Summarizes an optional date range; see [`BusinessCalendar::range`].
    pub async fn range_report(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<PeriodReport> {
        let range = self.calendar.range(start, end, now)?;
        self.summarize(range).await
    }
}
