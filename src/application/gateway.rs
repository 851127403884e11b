use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{CompanyInfo, ExpenseStats, PurchaseStats, SalesStats};

/// Source of transactional statistics for an inclusive date range.
///
/// Implementations own transport concerns (retries included); the engine
/// propagates the first failure as-is.
#[async_trait]
pub trait SourceGateway: Send + Sync {
    async fn purchase_stats(&self, date_start: NaiveDate, date_end: NaiveDate)
    -> Result<PurchaseStats>;

    async fn sales_stats(&self, date_start: NaiveDate, date_end: NaiveDate) -> Result<SalesStats>;

    async fn expense_stats(&self, date_start: NaiveDate, date_end: NaiveDate)
    -> Result<ExpenseStats>;
}

/// Lookups that decorate reports but never change their numbers.
#[async_trait]
pub trait ReferenceData: Send + Sync {
    async fn category_labels(&self) -> Result<CategoryLabels>;

    async fn company_info(&self) -> Result<Option<CompanyInfo>>;
}

/// Category code -> display name. Unknown codes resolve to themselves.
#[derive(Debug, Clone, Default)]
pub struct CategoryLabels {
    labels: HashMap<String, String>,
}

impl CategoryLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: impl Into<String>, label: impl Into<String>) {
        self.labels.insert(code.into(), label.into());
    }

    pub fn resolve<'a>(&'a self, code: &'a str) -> &'a str {
        self.labels.get(code).map(String::as_str).unwrap_or(code)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl<C: Into<String>, L: Into<String>> FromIterator<(C, L)> for CategoryLabels {
    fn from_iter<I: IntoIterator<Item = (C, L)>>(iter: I) -> Self {
        let mut labels = Self::new();
        for (code, label) in iter {
            labels.insert(code, label);
        }
        labels
    }
}

/// Reference data with no labels and no company, for callers that have none.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReferenceData;

#[async_trait]
impl ReferenceData for NoReferenceData {
    async fn category_labels(&self) -> Result<CategoryLabels> {
        Ok(CategoryLabels::new())
    }

    async fn company_info(&self) -> Result<Option<CompanyInfo>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_codes_pass_through() {
        let labels: CategoryLabels = [("rent", "Rent & Utilities")].into_iter().collect();
        assert_eq!(labels.resolve("rent"), "Rent & Utilities");
        assert_eq!(labels.resolve("misc"), "misc");
    }
}
