use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info};

use super::aggregator::PeriodAggregator;
use super::reporting::{AnnualReport, MonthlyReport, PeriodReport};
use super::ReportError;
use crate::domain::{ExpenseStats, Period, PurchaseStats, SalesStats};

/// Months aggregated at once; each month issues three source calls.
pub const MAX_CONCURRENT_MONTHS: usize = 12;

/// Decomposes a period into concurrently built monthly reports.
#[derive(Clone)]
pub struct MonthlyRollupEngine {
    aggregator: PeriodAggregator,
}

impl MonthlyRollupEngine {
    pub fn new(aggregator: PeriodAggregator) -> Self {
        Self { aggregator }
    }

    /// One report per calendar month touched by `period`, each clipped to the
    /// days inside `period`.
    ///
    /// At most [`MAX_CONCURRENT_MONTHS`] months are in flight. The result is in
    /// calendar order regardless of completion order; any failure fails the
    /// whole series.
    pub async fn build_series(&self, period: Period) -> Result<Vec<MonthlyReport>, ReportError> {
        let months = period
            .months()
            .into_iter()
            .map(|ym| -> Result<_, ReportError> {
                let month = Period::month(ym.year, ym.month)?;
                // Every month returned by `months()` overlaps the period
                Ok((ym, month.intersect(&period).unwrap_or(month)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(%period, months = months.len(), "building monthly series");
        stream::iter(months)
            .map(|(ym, slice)| async move {
                let report = self.aggregator.aggregate(slice).await?;
                Ok::<_, ReportError>(MonthlyReport::new(ym, report))
            })
            .buffered(MAX_CONCURRENT_MONTHS)
            .try_collect()
            .await
    }

    pub async fn build_annual_report(&self, year: i32) -> Result<AnnualReport, ReportError> {
        let monthly_reports = self.build_series(Period::year(year)?).await?;
        let report = summarize_year(year, monthly_reports)?;

        info!(
            year,
            revenue = report.totals.revenue,
            net_profit = report.totals.net_profit,
            best_month = report.best_month,
            worst_month = report.worst_month,
            "annual report built"
        );
        Ok(report)
    }
}

/// Sum twelve monthly reports into annual totals and pick the extreme months.
///
/// Margins are recomputed from the summed amounts rather than averaged, so
/// low-volume months do not skew the yearly ratio.
pub fn summarize_year(
    year: i32,
    monthly_reports: Vec<MonthlyReport>,
) -> Result<AnnualReport, ReportError> {
    let mut purchases = PurchaseStats::default();
    let mut sales = SalesStats::default();
    let mut expenses = ExpenseStats::default();
    for month in &monthly_reports {
        purchases.total_amount = purchases.total_amount.saturating_add(month.total_purchases);
        purchases.count = purchases.count.saturating_add(month.purchase_count);
        sales.revenue = sales.revenue.saturating_add(month.revenue);
        sales.count = sales.count.saturating_add(month.sale_count);
        expenses.total = expenses.total.saturating_add(month.total_expenses);
        expenses.count = expenses.count.saturating_add(month.expense_count);
    }
    let totals = PeriodReport::compute(Period::year(year)?, &purchases, &sales, &expenses);

    let (best_month, worst_month) = extreme_months(&monthly_reports);
    Ok(AnnualReport {
        year,
        monthly_reports,
        totals,
        best_month,
        worst_month,
    })
}

/// Arg-max and arg-min of net profit, scanning left to right and keeping the
/// first occurrence on ties. Returns month numbers; `(0, 0)` for no months.
fn extreme_months(reports: &[MonthlyReport]) -> (u32, u32) {
    let Some(first) = reports.first() else {
        return (0, 0);
    };
    let mut best = first;
    let mut worst = first;
    for report in &reports[1..] {
        if report.net_profit > best.net_profit {
            best = report;
        }
        if report.net_profit < worst.net_profit {
            worst = report;
        }
    }
    (best.month, worst.month)
}
