mod common;

use std::sync::Arc;

use anyhow::Result;
use bilan::application::{PeriodAggregator, ReportError, StatsSource};
use bilan::domain::Period;
use common::{FakeGateway, parse_date};

fn march_2024() -> Period {
    Period::month(2024, 3).unwrap()
}

#[tokio::test]
async fn test_aggregate_joins_three_sources() -> Result<()> {
    let gateway = FakeGateway::new()
        .sale("2024-03-02", 120000)
        .sale("2024-03-15", 80000)
        .purchase("2024-03-05", 70000)
        .expense("2024-03-01", 25000, "rent")
        .expense("2024-03-20", 5000, "fuel")
        // Outside the period
        .sale("2024-04-01", 999999)
        .purchase("2024-02-29", 999999);
    let aggregator = PeriodAggregator::new(Arc::new(gateway));

    let report = aggregator.aggregate(march_2024()).await?;

    assert_eq!(report.revenue, 200000);
    assert_eq!(report.total_purchases, 70000);
    assert_eq!(report.total_expenses, 30000);
    assert_eq!(report.net_profit, 100000);
    assert_eq!(
        report.net_profit,
        report.revenue - report.total_purchases - report.total_expenses
    );
    assert!((report.gross_margin_pct - 65.0).abs() < 1e-9);
    assert_eq!(report.net_margin_pct, 50.0);
    assert_eq!(report.sale_count, 2);
    assert_eq!(report.purchase_count, 1);
    assert_eq!(report.expense_count, 2);
    assert_eq!(report.average_sale, 100000);
    assert_eq!(report.average_expense, 15000);
    assert_eq!(report.period, march_2024());

    Ok(())
}

#[tokio::test]
async fn test_collect_keeps_category_split() -> Result<()> {
    let gateway = FakeGateway::new()
        .expense("2024-03-01", 25000, "rent")
        .expense("2024-03-03", 4000, "fuel")
        .expense("2024-03-20", 1000, "rent");
    let aggregator = PeriodAggregator::new(Arc::new(gateway));

    let snapshot = aggregator.collect(march_2024()).await?;
    let split: Vec<(&str, i64)> = snapshot.expenses_by_category.iter().collect();
    assert_eq!(split, vec![("rent", 26000), ("fuel", 4000)]);

    Ok(())
}

#[tokio::test]
async fn test_empty_period_has_zero_margins_and_averages() -> Result<()> {
    let gateway = FakeGateway::new().purchase("2024-03-05", 1000);
    let aggregator = PeriodAggregator::new(Arc::new(gateway));

    let report = aggregator.aggregate(march_2024()).await?;

    assert_eq!(report.revenue, 0);
    assert_eq!(report.net_profit, -1000);
    assert_eq!(report.gross_margin_pct, 0.0);
    assert_eq!(report.net_margin_pct, 0.0);
    assert!(report.gross_margin_pct.is_finite() && report.net_margin_pct.is_finite());
    assert_eq!(report.average_sale, 0);
    assert_eq!(report.average_expense, 0);

    Ok(())
}

#[tokio::test]
async fn test_any_single_source_failure_fails_the_period() -> Result<()> {
    for source in [
        StatsSource::Purchases,
        StatsSource::Sales,
        StatsSource::Expenses,
    ] {
        let gateway = FakeGateway::new()
            .sale("2024-03-02", 120000)
            .purchase("2024-03-05", 70000)
            .expense("2024-03-01", 25000, "rent")
            .failing(source);
        let aggregator = PeriodAggregator::new(Arc::new(gateway));

        let result = aggregator.aggregate(march_2024()).await;

        match result {
            Err(ReportError::Gateway { origin, .. }) => assert_eq!(origin, source),
            other => panic!("expected {} failure, got {:?}", source, other),
        }
    }

    Ok(())
}

#[tokio::test]
async fn test_gateway_error_names_the_source() -> Result<()> {
    let gateway = FakeGateway::new().failing(StatsSource::Expenses);
    let aggregator = PeriodAggregator::new(Arc::new(gateway));

    let err = aggregator
        .aggregate(march_2024())
        .await
        .expect_err("expenses source is down");

    assert_eq!(err.failed_source(), Some(StatsSource::Expenses));
    assert!(err.to_string().contains("expenses"));

    Ok(())
}

#[tokio::test]
async fn test_single_day_period() -> Result<()> {
    let gateway = FakeGateway::new()
        .sale("2024-03-14", 5000)
        .sale("2024-03-15", 7000)
        .sale("2024-03-16", 9000);
    let aggregator = PeriodAggregator::new(Arc::new(gateway));

    let day = parse_date("2024-03-15");
    let report = aggregator.aggregate(Period::new(day, day)?).await?;
    assert_eq!(report.revenue, 7000);
    assert_eq!(report.sale_count, 1);

    Ok(())
}
