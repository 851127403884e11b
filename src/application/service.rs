use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::aggregator::PeriodAggregator;
use super::breakdown::build_category_breakdown;
use super::gateway::{ReferenceData, SourceGateway};
use super::reporting::{AnnualReport, FullReport};
use super::rollup::MonthlyRollupEngine;
use super::trends::compute_trends;
use super::ReportError;
use crate::domain::{CompanyInfo, Period, PeriodResolver, ReportFilter};
use crate::io::{ExportSettings, ReportExporter};
use crate::storage::Repository;

/// Caller-supplied knobs for report builds.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    /// Display currency for exports
    pub currency: String,
    /// Overall limit for one report build; `None` waits indefinitely
    pub deadline: Option<Duration>,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            currency: "EUR".to_string(),
            deadline: None,
        }
    }
}

/// Entry point for building reports. Composes period resolution,
/// aggregation, the monthly rollup, trends and category breakdown.
pub struct ReportService {
    aggregator: PeriodAggregator,
    rollup: MonthlyRollupEngine,
    reference: Arc<dyn ReferenceData>,
    settings: ReportSettings,
}

impl ReportService {
    pub fn new(
        gateway: Arc<dyn SourceGateway>,
        reference: Arc<dyn ReferenceData>,
        settings: ReportSettings,
    ) -> Self {
        let aggregator = PeriodAggregator::new(gateway);
        Self {
            rollup: MonthlyRollupEngine::new(aggregator.clone()),
            aggregator,
            reference,
            settings,
        }
    }

    /// Build a service reading from the local SQLite store.
    pub fn from_repository(repo: Arc<Repository>, settings: ReportSettings) -> Self {
        Self::new(repo.clone(), repo, settings)
    }

    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    /// Build the full report for `filter`, resolving periods against today.
    pub async fn build_report(&self, filter: &ReportFilter) -> Result<FullReport, ReportError> {
        self.build_report_with(filter, &PeriodResolver::from_now())
            .await
    }

    /// Build the full report for `filter` with an explicit resolver.
    ///
    /// The filter is validated before any source is queried.
    pub async fn build_report_with(
        &self,
        filter: &ReportFilter,
        resolver: &PeriodResolver,
    ) -> Result<FullReport, ReportError> {
        let period = resolver.resolve(filter)?;
        let report = self
            .with_deadline(self.assemble(filter, period))
            .await?;

        info!(
            report_type = %report.report_type,
            %period,
            revenue = report.period.revenue,
            net_profit = report.period.net_profit,
            months = report.monthly_series.len(),
            "report built"
        );
        Ok(report)
    }

    async fn assemble(
        &self,
        filter: &ReportFilter,
        period: Period,
    ) -> Result<FullReport, ReportError> {
        let labels = async {
            self.reference
                .category_labels()
                .await
                .map_err(ReportError::Reference)
        };

        let (snapshot, monthly_series, labels) = tokio::try_join!(
            self.aggregator.collect(period),
            self.rollup.build_series(period),
            labels
        )?;

        let category_breakdown = build_category_breakdown(
            &snapshot.expenses_by_category,
            snapshot.report.total_expenses,
            &labels,
        );
        let trends = compute_trends(&monthly_series);

        Ok(FullReport {
            report_type: filter.report_type,
            period: snapshot.report,
            monthly_series,
            category_breakdown,
            trends,
        })
    }

    /// Twelve concurrent monthly aggregations for `year`.
    pub async fn build_annual_report(&self, year: i32) -> Result<AnnualReport, ReportError> {
        self.with_deadline(self.rollup.build_annual_report(year))
            .await
    }

    pub async fn company_info(&self) -> Result<Option<CompanyInfo>, ReportError> {
        self.reference
            .company_info()
            .await
            .map_err(ReportError::Reference)
    }

    /// Exporter configured with this service's display currency.
    pub fn exporter(&self) -> ReportExporter {
        ReportExporter::new(ExportSettings {
            currency: self.settings.currency.clone(),
        })
    }

    /// Dropping the inner future on expiry cancels every in-flight source call.
    async fn with_deadline<T>(
        &self,
        work: impl Future<Output = Result<T, ReportError>>,
    ) -> Result<T, ReportError> {
        match self.settings.deadline {
            Some(limit) => match tokio::time::timeout(limit, work).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(?limit, "report build timed out");
                    Err(ReportError::Timeout(limit))
                }
            },
            None => work.await,
        }
    }
}
