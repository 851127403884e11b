use serde::{Deserialize, Serialize};

use crate::domain::{
    Cents, ExpenseStats, Period, PurchaseStats, ReportType, SalesStats, YearMonth, average_cents,
    percentage_of,
};

/// Derived financial summary for one period.
///
/// Margins are `0` whenever revenue is `0`, so the struct never carries
/// `NaN` or infinities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodReport {
    pub period: Period,
    pub total_purchases: Cents,
    pub revenue: Cents,
    pub total_expenses: Cents,
    pub net_profit: Cents,
    pub gross_margin_pct: f64,
    pub net_margin_pct: f64,
    pub purchase_count: i64,
    pub sale_count: i64,
    pub expense_count: i64,
    pub average_purchase: Cents,
    pub average_sale: Cents,
    pub average_expense: Cents,
}

impl PeriodReport {
    /// Derive every metric from the three source totals.
    pub fn compute(
        period: Period,
        purchases: &PurchaseStats,
        sales: &SalesStats,
        expenses: &ExpenseStats,
    ) -> Self {
        let revenue = sales.revenue;
        let total_purchases = purchases.total_amount;
        let total_expenses = expenses.total;
        let gross_profit = revenue.saturating_sub(total_purchases);
        let net_profit = gross_profit.saturating_sub(total_expenses);

        Self {
            period,
            total_purchases,
            revenue,
            total_expenses,
            net_profit,
            gross_margin_pct: percentage_of(gross_profit, revenue),
            net_margin_pct: percentage_of(net_profit, revenue),
            purchase_count: purchases.count,
            sale_count: sales.count,
            expense_count: expenses.count,
            average_purchase: average_cents(total_purchases, purchases.count),
            average_sale: average_cents(revenue, sales.count),
            average_expense: average_cents(total_expenses, expenses.count),
        }
    }

    pub fn transaction_count(&self) -> i64 {
        self.purchase_count
            .saturating_add(self.sale_count)
            .saturating_add(self.expense_count)
    }
}

/// A [`PeriodReport`] covering exactly one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub label: String,
    #[serde(flatten)]
    pub report: PeriodReport,
}

impl MonthlyReport {
    pub fn new(month: YearMonth, report: PeriodReport) -> Self {
        Self {
            year: month.year,
            month: month.month,
            label: month.label(),
            report,
        }
    }

    pub fn year_month(&self) -> YearMonth {
        YearMonth::new(self.year, self.month)
    }
}

impl std::ops::Deref for MonthlyReport {
    type Target = PeriodReport;

    fn deref(&self) -> &PeriodReport {
        &self.report
    }
}

/// Twelve monthly reports for one year plus their totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualReport {
    pub year: i32,
    /// Always twelve entries, January first
    pub monthly_reports: Vec<MonthlyReport>,
    pub totals: PeriodReport,
    /// Month number (1-12) with the highest net profit, earliest on ties
    pub best_month: u32,
    /// Month number (1-12) with the lowest net profit, earliest on ties
    pub worst_month: u32,
}

impl AnnualReport {
    pub fn best(&self) -> Option<&MonthlyReport> {
        self.monthly_reports
            .iter()
            .find(|m| m.month == self.best_month)
    }

    pub fn worst(&self) -> Option<&MonthlyReport> {
        self.monthly_reports
            .iter()
            .find(|m| m.month == self.worst_month)
    }
}

/// Percentage change between the first and last entries of a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Trends {
    pub evolution_revenue_pct: f64,
    pub evolution_profit_pct: f64,
    pub evolution_expenses_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: String,
    pub amount: Cents,
    pub percentage_of_total_expenses: f64,
}

/// Everything produced for one report request.
///
/// Holds no timestamps: the same request against the same data serializes
/// to the same bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullReport {
    pub report_type: ReportType,
    pub period: PeriodReport,
    pub monthly_series: Vec<MonthlyReport>,
    pub category_breakdown: Vec<CategoryShare>,
    pub trends: Trends,
}
