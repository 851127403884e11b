use std::sync::Arc;

use tracing::{debug, warn};

use super::gateway::SourceGateway;
use super::reporting::PeriodReport;
use super::{ReportError, StatsSource};
use crate::domain::{CategoryAmounts, Period};

/// A period report together with the expense split it was computed from.
#[derive(Debug, Clone)]
pub struct PeriodSnapshot {
    pub report: PeriodReport,
    pub expenses_by_category: CategoryAmounts,
}

/// Joins purchase, sales and expense statistics for one period.
#[derive(Clone)]
pub struct PeriodAggregator {
    gateway: Arc<dyn SourceGateway>,
}

impl PeriodAggregator {
    pub fn new(gateway: Arc<dyn SourceGateway>) -> Self {
        Self { gateway }
    }

    pub async fn aggregate(&self, period: Period) -> Result<PeriodReport, ReportError> {
        Ok(self.collect(period).await?.report)
    }

    /// Fetch all three sources concurrently. The first failure wins and the
    /// other in-flight calls are dropped; nothing partial is returned.
    pub async fn collect(&self, period: Period) -> Result<PeriodSnapshot, ReportError> {
        let Period {
            date_start,
            date_end,
        } = period;
        debug!(%period, "aggregating period");

        let purchases = async {
            self.gateway
                .purchase_stats(date_start, date_end)
                .await
                .map_err(|e| ReportError::gateway(StatsSource::Purchases, e))
        };
        let sales = async {
            self.gateway
                .sales_stats(date_start, date_end)
                .await
                .map_err(|e| ReportError::gateway(StatsSource::Sales, e))
        };
        let expenses = async {
            self.gateway
                .expense_stats(date_start, date_end)
                .await
                .map_err(|e| ReportError::gateway(StatsSource::Expenses, e))
        };

        let (purchases, sales, expenses) =
            tokio::try_join!(purchases, sales, expenses).inspect_err(|e| {
                warn!(%period, error = %e, "period aggregation failed");
            })?;

        let report = PeriodReport::compute(period, &purchases, &sales, &expenses);
        debug!(
            %period,
            revenue = report.revenue,
            net_profit = report.net_profit,
            "period aggregated"
        );

        Ok(PeriodSnapshot {
            report,
            expenses_by_category: expenses.by_category,
        })
    }
}
