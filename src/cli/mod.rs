use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::application::{AnnualReport, FullReport, ReportService, ReportSettings};
use crate::domain::{
    CompanyInfo, Entry, EntryKind, Period, PeriodResolver, ReportFilter, ReportType, format_cents,
    parse_cents,
};
use crate::io::{ImportOptions, Importer, file_name};
use crate::storage::Repository;

/// Bilan - Financial reporting for purchases, sales and expenses
#[derive(Parser)]
#[command(name = "bilan")]
#[command(about = "Aggregate purchases, sales and expenses into period reports, rollups and exports")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "BILAN_DATABASE", default_value = "bilan.db")]
    pub database: String,

    /// Display currency used in exports
    #[arg(long, env = "BILAN_CURRENCY", default_value = "EUR", global = true)]
    pub currency: String,

    /// Overall deadline for building a report, in seconds
    #[arg(long, env = "BILAN_TIMEOUT_SECS", global = true)]
    pub timeout: Option<u64>,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Record a purchase, sale or expense
    Record {
        /// Entry kind: purchase, sale, expense
        kind: String,

        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// Date of the transaction (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Expense category code (e.g., "rent", "utilities")
        #[arg(short, long)]
        category: Option<String>,

        /// Supplier or customer
        #[arg(short, long)]
        party: Option<String>,

        /// Description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// List recorded entries of one kind
    List {
        /// Entry kind: purchase, sale, expense
        kind: String,

        /// First day to include (YYYY-MM-DD, defaults to January 1st of this year)
        #[arg(long)]
        from: Option<String>,

        /// Last day to include (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        to: Option<String>,
    },

    /// Import purchases, sales or expenses from CSV
    Import {
        /// What to import: purchases, sales, expenses
        kind: String,

        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Preview without importing
        #[arg(long)]
        dry_run: bool,

        /// Skip entries identical to one already stored
        #[arg(long)]
        skip_duplicates: bool,
    },

    /// Expense category labels
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Company identity printed on exports
    #[command(subcommand)]
    Company(CompanyCommands),

    /// Build a report for a period
    Report {
        /// Period type: monthly, quarterly, annual, custom
        #[arg(default_value = "monthly")]
        report_type: String,

        /// Month (1-12) for monthly reports, defaults to the current month
        #[arg(long)]
        month: Option<u32>,

        /// Year for monthly and annual reports, defaults to the current year
        #[arg(long)]
        year: Option<i32>,

        /// Start date for custom reports (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date for custom reports (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Output format: table, csv, json, pdf
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Output file, or a directory to use the conventional file name (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Month-by-month rollup of a year with best and worst months
    Annual {
        /// Year, defaults to the current year
        #[arg(long)]
        year: Option<i32>,

        /// Output format: table, json
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Set the display label of a category code
    Set {
        /// Category code as recorded on expenses
        code: String,

        /// Display label
        label: String,
    },
}

#[derive(Subcommand)]
pub enum CompanyCommands {
    /// Set the company identity
    Set {
        /// Company name
        #[arg(long)]
        name: String,

        #[arg(long)]
        owner: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        address: Option<String>,
    },
}

impl Cli {
    fn settings(&self) -> ReportSettings {
        ReportSettings {
            currency: self.currency.clone(),
            deadline: self.timeout.map(Duration::from_secs),
        }
    }

    pub async fn run(self) -> Result<()> {
        let settings = self.settings();
        let today = PeriodResolver::from_now().today();

        match self.command {
            Commands::Init => {
                Repository::open(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Record {
                kind,
                amount,
                date,
                category,
                party,
                description,
            } => {
                let repo = Repository::open(&self.database).await?;
                let kind = parse_kind(&kind)?;
                let amount_cents =
                    parse_cents(&amount).map_err(|e| anyhow::anyhow!("Invalid amount: {}", e))?;
                let date = match date {
                    Some(d) => parse_date(&d)?,
                    None => today,
                };

                let mut entry = Entry::new(kind, date, amount_cents);
                if let Some(category) = category {
                    entry = entry.with_category(category);
                }
                if let Some(party) = party {
                    entry = entry.with_counterparty(party);
                }
                if let Some(description) = description {
                    entry = entry.with_description(description);
                }

                repo.save_entry(&entry).await?;
                println!(
                    "Recorded {} of {} on {} ({})",
                    kind,
                    format_cents(amount_cents),
                    date.format("%Y-%m-%d"),
                    entry.id
                );
            }

            Commands::List { kind, from, to } => {
                let repo = Repository::open(&self.database).await?;
                let kind = parse_kind(&kind)?;
                let date_start = match from {
                    Some(d) => parse_date(&d)?,
                    None => Period::year(today.year())?.date_start,
                };
                let date_end = match to {
                    Some(d) => parse_date(&d)?,
                    None => today,
                };

                let entries = repo.list_entries(kind, date_start, date_end).await?;
                print_entries(&entries);
            }

            Commands::Import {
                kind,
                input,
                dry_run,
                skip_duplicates,
            } => {
                let repo = Repository::open(&self.database).await?;
                run_import_command(&repo, &kind, input.as_deref(), dry_run, skip_duplicates)
                    .await?;
            }

            Commands::Category(CategoryCommands::Set { code, label }) => {
                let repo = Repository::open(&self.database).await?;
                repo.set_category_label(&code, &label).await?;
                println!("Category '{}' is now labelled '{}'", code, label);
            }

            Commands::Company(CompanyCommands::Set {
                name,
                owner,
                phone,
                address,
            }) => {
                let repo = Repository::open(&self.database).await?;
                repo.set_company_info(&CompanyInfo {
                    name: name.clone(),
                    owner,
                    phone,
                    address,
                })
                .await?;
                println!("Company set: {}", name);
            }

            Commands::Report {
                report_type,
                month,
                year,
                from,
                to,
                format,
                output,
            } => {
                let repo = Arc::new(Repository::open(&self.database).await?);
                let service = ReportService::from_repository(repo, settings);

                let mut filter = ReportFilter::new(report_type.parse::<ReportType>()?);
                filter.month = month;
                filter.year = year;
                filter.date_start = from.as_deref().map(parse_date).transpose()?;
                filter.date_end = to.as_deref().map(parse_date).transpose()?;

                run_report_command(&service, &filter, &format, output.as_deref()).await?;
            }

            Commands::Annual { year, format } => {
                let repo = Arc::new(Repository::open(&self.database).await?);
                let service = ReportService::from_repository(repo, settings);
                let year = year.unwrap_or(today.year());

                let report = service.build_annual_report(year).await?;
                match format.as_str() {
                    "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                    _ => print_annual_table(&report),
                }
            }
        }

        Ok(())
    }
}

async fn run_import_command(
    repo: &Repository,
    kind: &str,
    input: Option<&str>,
    dry_run: bool,
    skip_duplicates: bool,
) -> Result<()> {
    use std::fs::File;
    use std::io::{stdin, Read};

    let kind = parse_kind(kind)?;
    let importer = Importer::new(repo);

    // Determine input reader
    let reader: Box<dyn Read> = match input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open input file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdin()),
    };

    let options = ImportOptions {
        dry_run,
        skip_duplicates,
    };
    let result = importer.import_csv(kind, reader, options).await?;

    if dry_run {
        println!("Dry run complete");
    } else {
        println!("Import complete");
    }
    println!("  Imported: {}", result.imported);
    println!("  Skipped:  {}", result.skipped);
    println!("  Errors:   {}", result.errors.len());

    if !result.errors.is_empty() {
        println!("\nErrors:");
        for error in result.errors.iter().take(10) {
            println!(
                "  Line {}: {}",
                error.line,
                error
                    .field
                    .as_ref()
                    .map(|f| format!("{}: ", f))
                    .unwrap_or_default()
                    + &error.error
            );
        }
        if result.errors.len() > 10 {
            println!("  ... and {} more errors", result.errors.len() - 10);
        }
    }

    Ok(())
}

async fn run_report_command(
    service: &ReportService,
    filter: &ReportFilter,
    format: &str,
    output: Option<&str>,
) -> Result<()> {
    let report = service.build_report(filter).await?;
    let exporter = service.exporter();

    let (payload, extension) = match format {
        "csv" => (exporter.export_csv(&report)?, "csv"),
        "json" => (exporter.export_json(&report)?, "json"),
        "pdf" => {
            let company = service.company_info().await?;
            let document = exporter.export_pdf_table(&report, company.as_ref(), Utc::now());
            (serde_json::to_string_pretty(&document)?, "pdf.json")
        }
        "table" => {
            print_report_table(&report, &service.settings().currency);
            return Ok(());
        }
        other => anyhow::bail!(
            "Invalid format '{}'. Valid formats: table, csv, json, pdf",
            other
        ),
    };

    match output {
        Some(path) => {
            let path = output_path(path, report.report_type, extension);
            std::fs::write(&path, payload)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Report written to {}", path.display());
        }
        None => println!("{}", payload),
    }
    Ok(())
}

/// A directory gets the conventional `rapport_{type}_{date}.{ext}` name appended.
fn output_path(path: &str, report_type: ReportType, extension: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_dir() {
        path.join(file_name(report_type, Utc::now().date_naive(), extension))
    } else {
        path.to_path_buf()
    }
}

fn print_entries(entries: &[Entry]) {
    if entries.is_empty() {
        println!("No entries found");
        return;
    }

    println!(
        "{:<10} {:<12} {:>12} {:<16} {:<20}",
        "ID", "DATE", "AMOUNT", "CATEGORY", "PARTY"
    );
    println!("{}", "-".repeat(74));
    for entry in entries {
        println!(
            "{:<10} {:<12} {:>12} {:<16} {:<20}",
            &entry.id.to_string()[..8],
            entry.date.format("%Y-%m-%d"),
            format_cents(entry.amount_cents),
            truncate(entry.category_or_default(), 16),
            truncate(entry.counterparty.as_deref().unwrap_or("-"), 20)
        );
    }
    let total: i64 = entries.iter().map(|e| e.amount_cents).sum();
    println!("{}", "-".repeat(74));
    println!("{} entries, total {}", entries.len(), format_cents(total));
}

fn print_report_table(report: &FullReport, currency: &str) {
    let p = &report.period;
    println!("Financial Report ({})", report.report_type);
    println!("Period: {}  [{}]", p.period, currency);
    println!();
    println!("Revenue:        {:>15}", format_cents(p.revenue));
    println!("Purchases:      {:>15}", format_cents(p.total_purchases));
    println!("Expenses:       {:>15}", format_cents(p.total_expenses));
    println!("{}", "-".repeat(32));
    println!("Net profit:     {:>15}", format_cents(p.net_profit));
    println!("Gross margin:   {:>14.1}%", p.gross_margin_pct);
    println!("Net margin:     {:>14.1}%", p.net_margin_pct);
    println!();
    println!(
        "Transactions: {} sales, {} purchases, {} expenses",
        p.sale_count, p.purchase_count, p.expense_count
    );

    if report.monthly_series.len() > 1 {
        println!();
        println!(
            "{:<16} {:>12} {:>12} {:>12} {:>12}",
            "MONTH", "REVENUE", "PURCHASES", "EXPENSES", "NET"
        );
        println!("{}", "-".repeat(68));
        for m in &report.monthly_series {
            println!(
                "{:<16} {:>12} {:>12} {:>12} {:>12}",
                format!("{} {}", m.label, m.year),
                format_cents(m.revenue),
                format_cents(m.total_purchases),
                format_cents(m.total_expenses),
                format_cents(m.net_profit)
            );
        }
        println!();
        println!(
            "Trends: revenue {:+.1}%, profit {:+.1}%, expenses {:+.1}%",
            report.trends.evolution_revenue_pct,
            report.trends.evolution_profit_pct,
            report.trends.evolution_expenses_pct
        );
    }

    if !report.category_breakdown.is_empty() {
        println!();
        println!("Expenses by category:");
        for (i, share) in report.category_breakdown.iter().enumerate() {
            println!(
                "  {}. {:<18} {:>12} ({:.1}%)",
                i + 1,
                truncate(&share.category, 18),
                format_cents(share.amount),
                share.percentage_of_total_expenses
            );
        }
    }
}

fn print_annual_table(report: &AnnualReport) {
    println!("Annual Report {}", report.year);
    println!();
    println!(
        "{:<12} {:>12} {:>12} {:>12} {:>12} {:>8}",
        "MONTH", "REVENUE", "PURCHASES", "EXPENSES", "NET", "MARGIN"
    );
    println!("{}", "-".repeat(73));
    for m in &report.monthly_reports {
        println!(
            "{:<12} {:>12} {:>12} {:>12} {:>12} {:>7.1}%",
            m.label,
            format_cents(m.revenue),
            format_cents(m.total_purchases),
            format_cents(m.total_expenses),
            format_cents(m.net_profit),
            m.net_margin_pct
        );
    }
    println!("{}", "-".repeat(73));
    let t = &report.totals;
    println!(
        "{:<12} {:>12} {:>12} {:>12} {:>12} {:>7.1}%",
        "TOTAL",
        format_cents(t.revenue),
        format_cents(t.total_purchases),
        format_cents(t.total_expenses),
        format_cents(t.net_profit),
        t.net_margin_pct
    );

    if let (Some(best), Some(worst)) = (report.best(), report.worst()) {
        println!();
        println!("Best month:  {} ({})", best.label, format_cents(best.net_profit));
        println!("Worst month: {} ({})", worst.label, format_cents(worst.net_profit));
    }
}

fn parse_kind(kind: &str) -> Result<EntryKind> {
    EntryKind::from_str(kind).ok_or_else(|| {
        anyhow::anyhow!(
            "Invalid kind '{}'. Valid kinds: purchase, sale, expense",
            kind
        )
    })
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len - 3).collect();
        format!("{}...", cut)
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").context("Date must be in YYYY-MM-DD format")
}
