use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::{CategoryLabels, ReferenceData, SourceGateway};
use crate::domain::{
    Cents, CompanyInfo, Entry, EntryKind, ExpenseStats, PurchaseStats, SalesStats,
    UNCATEGORIZED,
};

use super::MIGRATION_001_INITIAL;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Local SQLite store of purchases, sales and expenses.
///
/// Serves as a [`SourceGateway`] and [`ReferenceData`] for the report engine.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Open (creating if needed) the database file at `path` and migrate it.
    pub async fn open(path: &str) -> Result<Self> {
        Self::init(&format!("sqlite:{}?mode=rwc", path)).await
    }

    // ========================
    // Entry operations
    // ========================

    /// Save a new purchase, sale or expense.
    pub async fn save_entry(&self, entry: &Entry) -> Result<()> {
        anyhow::ensure!(
            entry.amount_cents > 0,
            "Amount must be positive, got {}",
            entry.amount_cents
        );

        sqlx::query(
            r#"
            INSERT INTO entries (id, kind, date, amount_cents, category, counterparty, description, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.kind.as_str())
        .bind(entry.date.format(DATE_FORMAT).to_string())
        .bind(entry.amount_cents)
        .bind(&entry.category)
        .bind(&entry.counterparty)
        .bind(&entry.description)
        .bind(entry.recorded_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save entry")?;

        info!(kind = %entry.kind, id = %entry.id, amount = entry.amount_cents, "entry recorded");
        Ok(())
    }

    /// Whether an identical entry (same kind, date, amount and category) exists.
    pub async fn entry_exists(&self, entry: &Entry) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as matches
            FROM entries
            WHERE kind = ? AND date = ? AND amount_cents = ? AND category IS ?
            "#,
        )
        .bind(entry.kind.as_str())
        .bind(entry.date.format(DATE_FORMAT).to_string())
        .bind(entry.amount_cents)
        .bind(&entry.category)
        .fetch_one(&self.pool)
        .await
        .context("Failed to look up entry")?;

        Ok(row.get::<i64, _>("matches") > 0)
    }

    /// List entries of one kind within an inclusive date range, oldest first.
    pub async fn list_entries(
        &self,
        kind: EntryKind,
        date_start: NaiveDate,
        date_end: NaiveDate,
    ) -> Result<Vec<Entry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, kind, date, amount_cents, category, counterparty, description, recorded_at
            FROM entries
            WHERE kind = ? AND date >= ? AND date <= ?
            ORDER BY date, rowid
            "#,
        )
        .bind(kind.as_str())
        .bind(date_start.format(DATE_FORMAT).to_string())
        .bind(date_end.format(DATE_FORMAT).to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list entries")?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    /// Sum and count entries of one kind within an inclusive date range.
    async fn totals(
        &self,
        kind: EntryKind,
        date_start: NaiveDate,
        date_end: NaiveDate,
    ) -> Result<(Cents, i64)> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0) as total, COUNT(*) as count
            FROM entries
            WHERE kind = ? AND date >= ? AND date <= ?
            "#,
        )
        .bind(kind.as_str())
        .bind(date_start.format(DATE_FORMAT).to_string())
        .bind(date_end.format(DATE_FORMAT).to_string())
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Failed to total {} entries", kind))?;

        Ok((row.get("total"), row.get("count")))
    }

    /// Expense totals and per-category amounts from one grouped query.
    /// Categories are ordered by first recorded occurrence.
    async fn expense_groups(
        &self,
        date_start: NaiveDate,
        date_end: NaiveDate,
    ) -> Result<ExpenseStats> {
        let rows = sqlx::query(
            r#"
            SELECT COALESCE(category, ?) as category, SUM(amount_cents) as total, COUNT(*) as count
            FROM entries
            WHERE kind = 'expense' AND date >= ? AND date <= ?
            GROUP BY category
            ORDER BY MIN(rowid)
            "#,
        )
        .bind(UNCATEGORIZED)
        .bind(date_start.format(DATE_FORMAT).to_string())
        .bind(date_end.format(DATE_FORMAT).to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to group expenses by category")?;

        let mut stats = ExpenseStats::default();
        for row in &rows {
            let total: Cents = row.get("total");
            stats.total = stats.total.saturating_add(total);
            stats.count += row.get::<i64, _>("count");
            stats.by_category.add(row.get::<String, _>("category"), total);
        }
        Ok(stats)
    }

    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<Entry> {
        let id_str: String = row.get("id");
        let kind_str: String = row.get("kind");
        let date_str: String = row.get("date");
        let recorded_at_str: String = row.get("recorded_at");

        Ok(Entry {
            id: Uuid::parse_str(&id_str).context("Invalid entry ID")?,
            kind: EntryKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid entry kind: {}", kind_str))?,
            date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT).context("Invalid entry date")?,
            amount_cents: row.get("amount_cents"),
            category: row.get("category"),
            counterparty: row.get("counterparty"),
            description: row.get("description"),
            recorded_at: DateTime::parse_from_rfc3339(&recorded_at_str)
                .context("Invalid recorded_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Reference data
    // ========================

    /// Set (or replace) the display label of a category code.
    pub async fn set_category_label(&self, code: &str, label: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (code, label) VALUES (?, ?)
            ON CONFLICT(code) DO UPDATE SET label = excluded.label
            "#,
        )
        .bind(code)
        .bind(label)
        .execute(&self.pool)
        .await
        .context("Failed to save category label")?;
        Ok(())
    }

    /// Set (or replace) the company identity.
    pub async fn set_company_info(&self, info: &CompanyInfo) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO company (id, name, owner, phone, address) VALUES (1, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                owner = excluded.owner,
                phone = excluded.phone,
                address = excluded.address
            "#,
        )
        .bind(&info.name)
        .bind(&info.owner)
        .bind(&info.phone)
        .bind(&info.address)
        .execute(&self.pool)
        .await
        .context("Failed to save company info")?;
        Ok(())
    }
}

#[async_trait]
impl SourceGateway for Repository {
    async fn purchase_stats(
        &self,
        date_start: NaiveDate,
        date_end: NaiveDate,
    ) -> Result<PurchaseStats> {
        let (total_amount, count) = self.totals(EntryKind::Purchase, date_start, date_end).await?;
        Ok(PurchaseStats {
            total_amount,
            count,
        })
    }

    async fn sales_stats(&self, date_start: NaiveDate, date_end: NaiveDate) -> Result<SalesStats> {
        let (revenue, count) = self.totals(EntryKind::Sale, date_start, date_end).await?;
        Ok(SalesStats { revenue, count })
    }

    async fn expense_stats(
        &self,
        date_start: NaiveDate,
        date_end: NaiveDate,
    ) -> Result<ExpenseStats> {
        let stats = self.expense_groups(date_start, date_end).await?;
        debug!(
            %date_start,
            %date_end,
            categories = stats.by_category.len(),
            "expense stats loaded"
        );
        Ok(stats)
    }
}

#[async_trait]
impl ReferenceData for Repository {
    async fn category_labels(&self) -> Result<CategoryLabels> {
        let rows = sqlx::query("SELECT code, label FROM categories")
            .fetch_all(&self.pool)
            .await
            .context("Failed to load category labels")?;

        Ok(rows
            .iter()
            .map(|row| (row.get::<String, _>("code"), row.get::<String, _>("label")))
            .collect())
    }

    async fn company_info(&self) -> Result<Option<CompanyInfo>> {
        let row = sqlx::query("SELECT name, owner, phone, address FROM company WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load company info")?;

        Ok(row.map(|row| CompanyInfo {
            name: row.get("name"),
            owner: row.get("owner"),
            phone: row.get("phone"),
            address: row.get("address"),
        }))
    }
}
