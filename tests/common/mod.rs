// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use bilan::application::{
    CategoryLabels, NoReferenceData, ReferenceData, ReportService, ReportSettings, SourceGateway,
    StatsSource,
};
use bilan::domain::{
    CategoryAmounts, CompanyInfo, EntryKind, ExpenseStats, PurchaseStats, SalesStats,
};
use bilan::storage::Repository;
use chrono::{Datelike, NaiveDate};
use tempfile::TempDir;

/// Helper to create a repository backed by a temporary database
pub async fn test_repository() -> Result<(Arc<Repository>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let repo = Repository::open(db_path.to_str().unwrap()).await?;
    Ok((Arc::new(repo), temp_dir))
}

/// Helper to parse a date string into NaiveDate
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// One dated transaction held by [`FakeGateway`].
#[derive(Debug, Clone)]
pub struct FakeEntry {
    pub kind: EntryKind,
    pub date: NaiveDate,
    pub amount: i64,
    pub category: Option<&'static str>,
}

/// In-memory statistics source with configurable latency and failures.
#[derive(Default)]
pub struct FakeGateway {
    entries: Vec<FakeEntry>,
    fail_on: Option<StatsSource>,
    /// Only fail calls whose range starts in this month
    fail_month: Option<u32>,
    /// Per-call latency, derived from the start date of the requested range
    latency: Option<fn(NaiveDate) -> Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn purchase(mut self, date: &str, amount: i64) -> Self {
        self.entries.push(FakeEntry {
            kind: EntryKind::Purchase,
            date: parse_date(date),
            amount,
            category: None,
        });
        self
    }

    pub fn sale(mut self, date: &str, amount: i64) -> Self {
        self.entries.push(FakeEntry {
            kind: EntryKind::Sale,
            date: parse_date(date),
            amount,
            category: None,
        });
        self
    }

    pub fn expense(mut self, date: &str, amount: i64, category: &'static str) -> Self {
        self.entries.push(FakeEntry {
            kind: EntryKind::Expense,
            date: parse_date(date),
            amount,
            category: Some(category),
        });
        self
    }

    pub fn failing(mut self, source: StatsSource) -> Self {
        self.fail_on = Some(source);
        self
    }

    pub fn failing_in_month(mut self, source: StatsSource, month: u32) -> Self {
        self.fail_on = Some(source);
        self.fail_month = Some(month);
        self
    }

    pub fn with_latency(mut self, latency: fn(NaiveDate) -> Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, source: StatsSource, date_start: NaiveDate) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency(date_start)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let month_matches = self.fail_month.is_none_or(|m| m == date_start.month());
        if self.fail_on == Some(source) && month_matches {
            anyhow::bail!("{} backend unavailable", source);
        }
        Ok(())
    }

    fn matching(
        &self,
        kind: EntryKind,
        date_start: NaiveDate,
        date_end: NaiveDate,
    ) -> impl Iterator<Item = &FakeEntry> {
        self.entries
            .iter()
            .filter(move |e| e.kind == kind && e.date >= date_start && e.date <= date_end)
    }
}

#[async_trait]
impl SourceGateway for FakeGateway {
    async fn purchase_stats(
        &self,
        date_start: NaiveDate,
        date_end: NaiveDate,
    ) -> Result<PurchaseStats> {
        self.enter(StatsSource::Purchases, date_start).await?;
        let mut stats = PurchaseStats::default();
        for e in self.matching(EntryKind::Purchase, date_start, date_end) {
            stats.total_amount += e.amount;
            stats.count += 1;
        }
        Ok(stats)
    }

    async fn sales_stats(&self, date_start: NaiveDate, date_end: NaiveDate) -> Result<SalesStats> {
        self.enter(StatsSource::Sales, date_start).await?;
        let mut stats = SalesStats::default();
        for e in self.matching(EntryKind::Sale, date_start, date_end) {
            stats.revenue += e.amount;
            stats.count += 1;
        }
        Ok(stats)
    }

    async fn expense_stats(
        &self,
        date_start: NaiveDate,
        date_end: NaiveDate,
    ) -> Result<ExpenseStats> {
        self.enter(StatsSource::Expenses, date_start).await?;
        let mut stats = ExpenseStats {
            by_category: CategoryAmounts::new(),
            ..Default::default()
        };
        for e in self.matching(EntryKind::Expense, date_start, date_end) {
            stats.total += e.amount;
            stats.count += 1;
            stats.by_category.add(e.category.unwrap_or("uncategorized"), e.amount);
        }
        Ok(stats)
    }
}

/// Fixed reference data for tests.
pub struct FakeReference {
    pub labels: Vec<(&'static str, &'static str)>,
    pub company: Option<CompanyInfo>,
}

#[async_trait]
impl ReferenceData for FakeReference {
    async fn category_labels(&self) -> Result<CategoryLabels> {
        Ok(self.labels.iter().copied().collect())
    }

    async fn company_info(&self) -> Result<Option<CompanyInfo>> {
        Ok(self.company.clone())
    }
}

/// Service over a fake gateway with no reference data.
pub fn service_over(gateway: Arc<FakeGateway>) -> ReportService {
    ReportService::new(gateway, Arc::new(NoReferenceData), ReportSettings::default())
}

/// A year of activity in 2024: steady sales, a loss in March, a spike in October.
pub fn sample_year() -> FakeGateway {
    let mut gateway = FakeGateway::new();
    for month in 1..=12 {
        let date = format!("2024-{:02}-10", month);
        let revenue = match month {
            10 => 500000,
            _ => 200000,
        };
        let purchases = match month {
            3 => 250000,
            _ => 80000,
        };
        gateway = gateway
            .sale(&date, revenue)
            .purchase(&date, purchases)
            .expense(&date, 30000, "rent")
            .expense(&format!("2024-{:02}-20", month), 10000, "utilities");
    }
    gateway
}
