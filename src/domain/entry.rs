use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type EntryId = Uuid;

/// Which transactional source an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Purchase,
    Sale,
    Expense,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Purchase => "purchase",
            EntryKind::Sale => "sale",
            EntryKind::Expense => "expense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().trim_end_matches('s') {
            "purchase" => Some(EntryKind::Purchase),
            "sale" => Some(EntryKind::Sale),
            "expense" => Some(EntryKind::Expense),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single purchase, sale or expense as recorded in the local store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub kind: EntryKind,
    /// Calendar date the transaction belongs to
    pub date: NaiveDate,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
    /// Expense category code; only meaningful for expenses
    pub category: Option<String>,
    /// Supplier for purchases, customer for sales
    pub counterparty: Option<String>,
    pub description: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl Entry {
    pub fn new(kind: EntryKind, date: NaiveDate, amount_cents: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            date,
            amount_cents,
            category: None,
            counterparty: None,
            description: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn purchase(date: NaiveDate, amount_cents: Cents) -> Self {
        Self::new(EntryKind::Purchase, date, amount_cents)
    }

    pub fn sale(date: NaiveDate, amount_cents: Cents) -> Self {
        Self::new(EntryKind::Sale, date, amount_cents)
    }

    pub fn expense(date: NaiveDate, amount_cents: Cents, category: impl Into<String>) -> Self {
        Self::new(EntryKind::Expense, date, amount_cents).with_category(category)
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_counterparty(mut self, counterparty: impl Into<String>) -> Self {
        self.counterparty = Some(counterparty.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Category used for breakdowns; uncategorized expenses share one bucket.
    pub fn category_or_default(&self) -> &str {
        self.category.as_deref().unwrap_or(UNCATEGORIZED)
    }
}

/// Bucket for expenses recorded without a category.
pub const UNCATEGORIZED: &str = "uncategorized";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_kind_parsing() {
        for kind in [EntryKind::Purchase, EntryKind::Sale, EntryKind::Expense] {
            assert_eq!(EntryKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(EntryKind::from_str("Expenses"), Some(EntryKind::Expense));
        assert_eq!(EntryKind::from_str("refund"), None);
    }

    #[test]
    fn test_expense_builder() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let entry = Entry::expense(date, 4500, "rent").with_description("March rent");
        assert_eq!(entry.kind, EntryKind::Expense);
        assert_eq!(entry.category_or_default(), "rent");
        assert_eq!(entry.description.as_deref(), Some("March rent"));

        let bare = Entry::new(EntryKind::Expense, date, 100);
        assert_eq!(bare.category_or_default(), UNCATEGORIZED);
    }
}
