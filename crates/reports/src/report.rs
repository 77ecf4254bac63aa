use common::Money;
use serde::Serialize;
use store::{BestSeller, PeriodSummary};

/// Revenue, transaction count and best seller for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodReport {
    pub total_revenue: Money,
    pub total_transaction: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_selling_product: Option<BestSeller>,
}

impl PeriodReport {
    pub fn new(summary: PeriodSummary, best_selling_product: Option<BestSeller>) -> Self {
        Self {
            total_revenue: summary.total_revenue,
            total_transaction: summary.total_transaction,
            best_selling_product,
        }
    }

    /// A report for a period with no sales.
    pub fn empty() -> Self {
        Self::new(PeriodSummary::default(), None)
    }
}
