use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use std::io::Write;

use super::pdf::{
    CellFormat, CellValue, Column, FooterDescriptor, HeaderBlock, PdfDocument, PdfTable,
};
use crate::application::{FullReport, PeriodReport, ReportError};
use crate::domain::{CompanyInfo, ReportType, format_cents};

/// Settings that shape exported documents without changing their numbers.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub currency: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            currency: "EUR".to_string(),
        }
    }
}

/// Conventional export file name: `rapport_{type}_{isoDate}.{ext}`.
pub fn file_name(report_type: ReportType, date: NaiveDate, extension: &str) -> String {
    format!(
        "rapport_{}_{}.{}",
        report_type.as_str(),
        date.format("%Y-%m-%d"),
        extension
    )
}

/// Serializes a [`FullReport`] to CSV, JSON or a PDF table description.
pub struct ReportExporter {
    settings: ExportSettings,
}

impl ReportExporter {
    pub fn new(settings: ExportSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Export the report as CSV text.
    ///
    /// Three sections (summary, monthly, categories), each opened by a
    /// `section,<name>` row and a header row. Amounts are plain decimals.
    pub fn export_csv(&self, report: &FullReport) -> Result<String, ReportError> {
        let mut buffer = Vec::new();
        self.write_csv(report, &mut buffer)?;
        String::from_utf8(buffer)
            .context("CSV output is not valid UTF-8")
            .map_err(ReportError::Export)
    }

    /// Write the CSV export to `writer`. Returns the number of data rows.
    pub fn write_csv<W: Write>(
        &self,
        report: &FullReport,
        writer: W,
    ) -> Result<usize, ReportError> {
        self.write_sections(report, writer)
            .context("Failed to write CSV export")
            .map_err(ReportError::Export)
    }

    fn write_sections<W: Write>(&self, report: &FullReport, writer: W) -> anyhow::Result<usize> {
        let mut csv_writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(writer);
        let mut count = 0;

        csv_writer.write_record(["section", "summary"])?;
        csv_writer.write_record(["metric", "value"])?;
        for (metric, value) in summary_rows(report, &self.settings.currency) {
            csv_writer.write_record([metric, value.as_str()])?;
            count += 1;
        }

        csv_writer.write_record(["section", "monthly"])?;
        csv_writer.write_record([
            "year",
            "month",
            "label",
            "revenue",
            "total_purchases",
            "total_expenses",
            "net_profit",
            "gross_margin_pct",
            "net_margin_pct",
        ])?;
        for month in &report.monthly_series {
            csv_writer.write_record([
                month.year.to_string(),
                month.month.to_string(),
                month.label.clone(),
                format_cents(month.revenue),
                format_cents(month.total_purchases),
                format_cents(month.total_expenses),
                format_cents(month.net_profit),
                format!("{:.2}", month.gross_margin_pct),
                format!("{:.2}", month.net_margin_pct),
            ])?;
            count += 1;
        }

        csv_writer.write_record(["section", "categories"])?;
        csv_writer.write_record(["category", "amount", "percentage"])?;
        for share in &report.category_breakdown {
            csv_writer.write_record([
                share.category.clone(),
                format_cents(share.amount),
                format!("{:.2}", share.percentage_of_total_expenses),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the report as pretty-printed JSON.
    pub fn export_json(&self, report: &FullReport) -> Result<String, ReportError> {
        serde_json::to_string_pretty(report)
            .context("Failed to serialize report")
            .map_err(ReportError::Export)
    }

    /// Describe the report as tables for a document renderer.
    pub fn export_pdf_table(
        &self,
        report: &FullReport,
        company: Option<&CompanyInfo>,
        generated_at: DateTime<Utc>,
    ) -> PdfDocument {
        let period = &report.period;
        let header = HeaderBlock {
            title: format!("Financial report ({})", report.report_type),
            company: company.cloned(),
            generated_at,
            period: period.period,
            currency: self.settings.currency.clone(),
        };

        let mut tables = vec![
            metrics_table(period),
            margins_table(period),
            counts_table(period),
            trends_table(report),
        ];

        if !report.monthly_series.is_empty() {
            tables.push(PdfTable {
                title: "Monthly evolution".to_string(),
                columns: vec![
                    Column::new("Month", CellFormat::Text),
                    Column::new("Revenue", CellFormat::Money),
                    Column::new("Purchases", CellFormat::Money),
                    Column::new("Expenses", CellFormat::Money),
                    Column::new("Net profit", CellFormat::Money),
                    Column::new("Net margin", CellFormat::Percent),
                ],
                rows: report
                    .monthly_series
                    .iter()
                    .map(|m| {
                        vec![
                            CellValue::Text(format!("{} {}", m.label, m.year)),
                            CellValue::Money(m.revenue),
                            CellValue::Money(m.total_purchases),
                            CellValue::Money(m.total_expenses),
                            CellValue::Money(m.net_profit),
                            CellValue::Percent(m.net_margin_pct),
                        ]
                    })
                    .collect(),
            });
        }

        if !report.category_breakdown.is_empty() {
            tables.push(PdfTable {
                title: "Expenses by category".to_string(),
                columns: vec![
                    Column::new("Category", CellFormat::Text),
                    Column::new("Amount", CellFormat::Money),
                    Column::new("Share", CellFormat::Percent),
                ],
                rows: report
                    .category_breakdown
                    .iter()
                    .map(|s| {
                        vec![
                            CellValue::Text(s.category.clone()),
                            CellValue::Money(s.amount),
                            CellValue::Percent(s.percentage_of_total_expenses),
                        ]
                    })
                    .collect(),
            });
        }

        PdfDocument {
            header,
            tables,
            footer: FooterDescriptor::default(),
        }
    }
}

fn summary_rows(report: &FullReport, currency: &str) -> Vec<(&'static str, String)> {
    let p = &report.period;
    vec![
        ("report_type", report.report_type.as_str().to_string()),
        ("currency", currency.to_string()),
        ("date_start", p.period.date_start.format("%Y-%m-%d").to_string()),
        ("date_end", p.period.date_end.format("%Y-%m-%d").to_string()),
        ("revenue", format_cents(p.revenue)),
        ("total_purchases", format_cents(p.total_purchases)),
        ("total_expenses", format_cents(p.total_expenses)),
        ("net_profit", format_cents(p.net_profit)),
        ("gross_margin_pct", format!("{:.2}", p.gross_margin_pct)),
        ("net_margin_pct", format!("{:.2}", p.net_margin_pct)),
        ("sale_count", p.sale_count.to_string()),
        ("purchase_count", p.purchase_count.to_string()),
        ("expense_count", p.expense_count.to_string()),
        ("average_sale", format_cents(p.average_sale)),
        ("average_purchase", format_cents(p.average_purchase)),
        ("average_expense", format_cents(p.average_expense)),
        (
            "evolution_revenue_pct",
            format!("{:.2}", report.trends.evolution_revenue_pct),
        ),
        (
            "evolution_profit_pct",
            format!("{:.2}", report.trends.evolution_profit_pct),
        ),
        (
            "evolution_expenses_pct",
            format!("{:.2}", report.trends.evolution_expenses_pct),
        ),
    ]
}

fn metrics_table(period: &PeriodReport) -> PdfTable {
    PdfTable {
        title: "Key figures".to_string(),
        columns: vec![
            Column::new("Metric", CellFormat::Text),
            Column::new("Amount", CellFormat::Money),
        ],
        rows: vec![
            text_row("Revenue", CellValue::Money(period.revenue)),
            text_row("Purchases", CellValue::Money(period.total_purchases)),
            text_row("Expenses", CellValue::Money(period.total_expenses)),
            text_row("Net profit", CellValue::Money(period.net_profit)),
        ],
    }
}

fn margins_table(period: &PeriodReport) -> PdfTable {
    PdfTable {
        title: "Margins".to_string(),
        columns: vec![
            Column::new("Margin", CellFormat::Text),
            Column::new("Rate", CellFormat::Percent),
        ],
        rows: vec![
            text_row("Gross margin", CellValue::Percent(period.gross_margin_pct)),
            text_row("Net margin", CellValue::Percent(period.net_margin_pct)),
        ],
    }
}

fn counts_table(period: &PeriodReport) -> PdfTable {
    PdfTable {
        title: "Transactions".to_string(),
        columns: vec![
            Column::new("Type", CellFormat::Text),
            Column::new("Count", CellFormat::Count),
            Column::new("Average", CellFormat::Money),
        ],
        rows: vec![
            vec![
                CellValue::Text("Sales".to_string()),
                CellValue::Count(period.sale_count),
                CellValue::Money(period.average_sale),
            ],
            vec![
                CellValue::Text("Purchases".to_string()),
                CellValue::Count(period.purchase_count),
                CellValue::Money(period.average_purchase),
            ],
            vec![
                CellValue::Text("Expenses".to_string()),
                CellValue::Count(period.expense_count),
                CellValue::Money(period.average_expense),
            ],
        ],
    }
}

fn trends_table(report: &FullReport) -> PdfTable {
    let trends = &report.trends;
    PdfTable {
        title: "Trends".to_string(),
        columns: vec![
            Column::new("Metric", CellFormat::Text),
            Column::new("Evolution", CellFormat::Percent),
        ],
        rows: vec![
            text_row("Revenue", CellValue::Percent(trends.evolution_revenue_pct)),
            text_row("Net profit", CellValue::Percent(trends.evolution_profit_pct)),
            text_row("Expenses", CellValue::Percent(trends.evolution_expenses_pct)),
        ],
    }
}

fn text_row(label: &str, value: CellValue) -> Vec<CellValue> {
    vec![CellValue::Text(label.to_string()), value]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(
            file_name(ReportType::Monthly, date, "csv"),
            "rapport_monthly_2024-03-05.csv"
        );
        assert_eq!(
            file_name(ReportType::Annual, date, "json"),
            "rapport_annual_2024-03-05.json"
        );
    }
}
