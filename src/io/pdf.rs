//! Renderer-neutral description of a printable report.
//!
//! The exporter fills these structures; turning them into bytes is left to
//! whatever document renderer consumes them. Each column names a
//! [`CellFormat`] that the renderer applies to every cell in it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Cents, CompanyInfo, Period, format_cents};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// Typed cell content, kept raw until formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    Text(String),
    Money(Cents),
    Count(i64),
    Percent(f64),
}

/// How a column renders its cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellFormat {
    Text,
    Money,
    Count,
    Percent,
}

impl CellFormat {
    /// Render `cell` for display. A cell whose type does not match the column
    /// is rendered according to its own type.
    pub fn format(&self, cell: &CellValue, currency: &str) -> String {
        match (self, cell) {
            (_, CellValue::Text(text)) => text.clone(),
            (CellFormat::Money, CellValue::Money(cents)) => {
                format!("{} {}", format_cents(*cents), currency)
            }
            (CellFormat::Count, CellValue::Count(n)) => n.to_string(),
            (CellFormat::Percent, CellValue::Percent(pct)) => format!("{:.2} %", pct),
            (_, other) => other.natural_format().format(other, currency),
        }
    }

    pub fn alignment(&self) -> Alignment {
        match self {
            CellFormat::Text => Alignment::Left,
            _ => Alignment::Right,
        }
    }
}

impl CellValue {
    fn natural_format(&self) -> CellFormat {
        match self {
            CellValue::Text(_) => CellFormat::Text,
            CellValue::Money(_) => CellFormat::Money,
            CellValue::Count(_) => CellFormat::Count,
            CellValue::Percent(_) => CellFormat::Percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub header: String,
    pub format: CellFormat,
    pub alignment: Alignment,
}

impl Column {
    pub fn new(header: impl Into<String>, format: CellFormat) -> Self {
        Self {
            header: header.into(),
            format,
            alignment: format.alignment(),
        }
    }
}

/// A titled table with a fixed set of columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfTable {
    pub title: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<CellValue>>,
}

impl PdfTable {
    /// Apply each column's format to its cells.
    pub fn formatted_rows(&self, currency: &str) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&self.columns)
                    .map(|(cell, column)| column.format.format(cell, currency))
                    .collect()
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderBlock {
    pub title: String,
    pub company: Option<CompanyInfo>,
    pub generated_at: DateTime<Utc>,
    pub period: Period,
    pub currency: String,
}

impl HeaderBlock {
    /// Header text, one line per entry, company identity first.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(company) = &self.company {
            lines.push(company.name.clone());
            lines.extend(
                [&company.owner, &company.address, &company.phone]
                    .into_iter()
                    .flatten()
                    .cloned(),
            );
        }
        lines.push(self.title.clone());
        lines.push(format!("Period: {}", self.period));
        lines.push(format!(
            "Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        ));
        lines
    }
}

/// Page footer; `{page}` and `{pages}` are substituted per page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FooterDescriptor {
    pub template: String,
    pub alignment: Alignment,
}

impl Default for FooterDescriptor {
    fn default() -> Self {
        Self {
            template: "Page {page} / {pages}".to_string(),
            alignment: Alignment::Center,
        }
    }
}

impl FooterDescriptor {
    pub fn render(&self, page: usize, pages: usize) -> String {
        self.template
            .replace("{page}", &page.to_string())
            .replace("{pages}", &pages.to_string())
    }
}

/// Everything a renderer needs to lay out the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfDocument {
    pub header: HeaderBlock,
    pub tables: Vec<PdfTable>,
    pub footer: FooterDescriptor,
}

impl PdfDocument {
    pub fn table(&self, title: &str) -> Option<&PdfTable> {
        self.tables.iter().find(|t| t.title == title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_formats() {
        assert_eq!(
            CellFormat::Money.format(&CellValue::Money(123456), "EUR"),
            "1234.56 EUR"
        );
        assert_eq!(
            CellFormat::Percent.format(&CellValue::Percent(12.346), "EUR"),
            "12.35 %"
        );
        assert_eq!(CellFormat::Count.format(&CellValue::Count(7), "EUR"), "7");
        assert_eq!(
            CellFormat::Money.format(&CellValue::Text("n/a".into()), "EUR"),
            "n/a"
        );
    }

    #[test]
    fn test_mismatched_cell_uses_own_format() {
        assert_eq!(
            CellFormat::Money.format(&CellValue::Percent(50.0), "EUR"),
            "50.00 %"
        );
    }

    #[test]
    fn test_footer_render() {
        assert_eq!(FooterDescriptor::default().render(2, 5), "Page 2 / 5");
    }

    #[test]
    fn test_alignment_follows_format() {
        assert_eq!(Column::new("Label", CellFormat::Text).alignment, Alignment::Left);
        assert_eq!(Column::new("Total", CellFormat::Money).alignment, Alignment::Right);
    }
}
