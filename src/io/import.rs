use anyhow::Result;
use chrono::NaiveDate;
use std::io::Read;
use tracing::info;

use crate::domain::{Entry, EntryKind, parse_cents};
use crate::storage::Repository;

/// Result of an import operation
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred during import
#[derive(Debug, Clone)]
pub struct ImportError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub dry_run: bool,
    pub skip_duplicates: bool,
}

/// Column positions resolved from the CSV header row.
struct Columns {
    date: usize,
    amount: usize,
    category: Option<usize>,
    counterparty: Option<usize>,
    description: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.contains(&h.trim().to_lowercase().as_str()))
        };

        Ok(Self {
            date: find(&["date"]).ok_or_else(|| anyhow::anyhow!("Missing 'date' column"))?,
            amount: find(&["amount"]).ok_or_else(|| anyhow::anyhow!("Missing 'amount' column"))?,
            category: find(&["category"]),
            counterparty: find(&["counterparty", "supplier", "customer"]),
            description: find(&["description"]),
        })
    }
}

/// Loads purchases, sales or expenses into the local store.
pub struct Importer<'a> {
    repo: &'a Repository,
}

impl<'a> Importer<'a> {
    pub fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    /// Import entries of one kind from CSV with a header row.
    ///
    /// Required columns: `date` (YYYY-MM-DD) and `amount` (decimal units).
    /// Optional: `category`, `counterparty` (or `supplier`/`customer`),
    /// `description`. Bad lines are reported and skipped.
    pub async fn import_csv<R: Read>(
        &self,
        kind: EntryKind,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let columns = Columns::from_headers(csv_reader.headers()?)?;
        let mut imported = 0;
        let mut skipped = 0;
        let mut errors = Vec::new();

        for (line_num, result) in csv_reader.records().enumerate() {
            let line = line_num + 2; // +2 for header and 0-indexing

            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: None,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            let optional = |index: Option<usize>| {
                index
                    .and_then(|i| record.get(i))
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };

            let date = match NaiveDate::parse_from_str(
                record.get(columns.date).unwrap_or("").trim(),
                "%Y-%m-%d",
            ) {
                Ok(d) => d,
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: Some("date".to_string()),
                        error: format!("Invalid date: {}", e),
                    });
                    continue;
                }
            };

            let amount_cents = match parse_cents(record.get(columns.amount).unwrap_or("")) {
                Ok(a) if a > 0 => a,
                Ok(a) => {
                    errors.push(ImportError {
                        line,
                        field: Some("amount".to_string()),
                        error: format!("Amount must be positive, got {}", a),
                    });
                    continue;
                }
                Err(e) => {
                    errors.push(ImportError {
                        line,
                        field: Some("amount".to_string()),
                        error: format!("Invalid amount: {}", e),
                    });
                    continue;
                }
            };

            let mut entry = Entry::new(kind, date, amount_cents);
            if let Some(category) = optional(columns.category) {
                entry = entry.with_category(category);
            }
            if let Some(counterparty) = optional(columns.counterparty) {
                entry = entry.with_counterparty(counterparty);
            }
            if let Some(description) = optional(columns.description) {
                entry = entry.with_description(description);
            }

            if options.skip_duplicates && self.repo.entry_exists(&entry).await? {
                skipped += 1;
                continue;
            }

            // Skip actual import if dry run
            if options.dry_run {
                imported += 1;
                continue;
            }

            match self.repo.save_entry(&entry).await {
                Ok(()) => imported += 1,
                Err(e) => errors.push(ImportError {
                    line,
                    field: None,
                    error: format!("Failed to save entry: {}", e),
                }),
            }
        }

        info!(%kind, imported, skipped, errors = errors.len(), "import finished");
        Ok(ImportResult {
            imported,
            skipped,
            errors,
        })
    }
}
