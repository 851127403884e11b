use super::reporting::{MonthlyReport, Trends};
use crate::domain::change_pct;

/// Compare the first and last entries of an ordered monthly series.
///
/// This is an endpoint comparison, not a slope: months in between do not
/// contribute. Fewer than two entries yield all-zero trends.
pub fn compute_trends(series: &[MonthlyReport]) -> Trends {
    let [first, .., last] = series else {
        return Trends::default();
    };

    Trends {
        evolution_revenue_pct: if first.revenue > 0 {
            change_pct(first.revenue, last.revenue)
        } else {
            0.0
        },
        // change_pct measures against |baseline|, so a loss-making first month
        // does not invert the direction of the trend
        evolution_profit_pct: change_pct(first.net_profit, last.net_profit),
        evolution_expenses_pct: if first.total_expenses > 0 {
            change_pct(first.total_expenses, last.total_expenses)
        } else {
            0.0
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::reporting::PeriodReport;
    use crate::domain::{ExpenseStats, Period, PurchaseStats, SalesStats, YearMonth};

    fn month(m: u32, revenue: i64, purchases: i64, expenses: i64) -> MonthlyReport {
        let report = PeriodReport::compute(
            Period::month(2024, m).unwrap(),
            &PurchaseStats {
                total_amount: purchases,
                count: 1,
            },
            &SalesStats { revenue, count: 1 },
            &ExpenseStats {
                total: expenses,
                count: 1,
                ..Default::default()
            },
        );
        MonthlyReport::new(YearMonth::new(2024, m), report)
    }

    #[test]
    fn test_short_series_are_flat() {
        assert_eq!(compute_trends(&[]), Trends::default());
        assert_eq!(compute_trends(&[month(1, 1000, 500, 300)]), Trends::default());
    }

    #[test]
    fn test_first_versus_last() {
        // Jan: revenue 1000, profit 200; Dec: revenue 1500, profit 100
        let series = vec![month(1, 1000, 500, 300), month(12, 1500, 1000, 400)];
        let trends = compute_trends(&series);
        assert_eq!(trends.evolution_revenue_pct, 50.0);
        assert_eq!(trends.evolution_profit_pct, -50.0);
        assert!((trends.evolution_expenses_pct - 33.333333).abs() < 1e-4);
    }

    #[test]
    fn test_middle_months_are_ignored() {
        let series = vec![
            month(1, 1000, 500, 300),
            month(2, 90000, 0, 0),
            month(3, 1500, 1000, 400),
        ];
        assert_eq!(compute_trends(&series).evolution_revenue_pct, 50.0);
    }

    #[test]
    fn test_negative_baseline_profit_keeps_direction() {
        // Profit goes from -200 to +100: an improvement of 150%
        let series = vec![month(1, 100, 200, 100), month(2, 300, 100, 100)];
        let trends = compute_trends(&series);
        assert_eq!(series[0].net_profit, -200);
        assert_eq!(series[1].net_profit, 100);
        assert_eq!(trends.evolution_profit_pct, 150.0);
    }

    #[test]
    fn test_zero_baselines_yield_zero() {
        let series = vec![month(1, 0, 0, 0), month(2, 500, 100, 50)];
        assert_eq!(compute_trends(&series), Trends::default());
    }
}
