use serde::{Deserialize, Serialize};

use super::Cents;

/// Purchase totals for a period, as reported by a source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseStats {
    pub total_amount: Cents,
    pub count: i64,
}

/// Sales totals for a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesStats {
    pub revenue: Cents,
    pub count: i64,
}

/// Expense totals for a period, with the per-category split.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseStats {
    pub total: Cents,
    pub count: i64,
    pub by_category: CategoryAmounts,
}

/// Ordered category -> amount association.
///
/// Categories are defined externally, so keys are free-form strings. Insertion
/// order is preserved; adding to an existing key accumulates in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryAmounts(Vec<(String, Cents)>);

impl CategoryAmounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, category: impl Into<String>, amount: Cents) {
        let category = category.into();
        match self.0.iter_mut().find(|(code, _)| *code == category) {
            Some((_, total)) => *total = total.saturating_add(amount),
            None => self.0.push((category, amount)),
        }
    }

    pub fn get(&self, category: &str) -> Option<Cents> {
        self.0
            .iter()
            .find(|(code, _)| code == category)
            .map(|(_, amount)| *amount)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Cents)> {
        self.0.iter().map(|(code, amount)| (code.as_str(), *amount))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> Cents {
        self.0
            .iter()
            .fold(0, |sum: Cents, (_, amount)| sum.saturating_add(*amount))
    }
}

impl<S: Into<String>> FromIterator<(S, Cents)> for CategoryAmounts {
    fn from_iter<I: IntoIterator<Item = (S, Cents)>>(iter: I) -> Self {
        let mut amounts = Self::new();
        for (category, amount) in iter {
            amounts.add(category, amount);
        }
        amounts
    }
}

/// Business identity printed on exported documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub owner: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}
