use chrono::{Datelike, Month, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which kind of period a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Monthly,
    Quarterly,
    Annual,
    Custom,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Monthly => "monthly",
            ReportType::Quarterly => "quarterly",
            ReportType::Annual => "annual",
            ReportType::Custom => "custom",
        }
    }
}

impl std::str::FromStr for ReportType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" => Ok(ReportType::Monthly),
            "quarterly" => Ok(ReportType::Quarterly),
            "annual" | "yearly" => Ok(ReportType::Annual),
            "custom" => Ok(ReportType::Custom),
            other => Err(ValidationError::UnknownReportType(other.to_string())),
        }
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A malformed report request, detected before any data is fetched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown report type: {0}")]
    UnknownReportType(String),

    #[error("Custom period requires a {0} date")]
    MissingDate(&'static str),

    #[error("Invalid month: {0} (expected 1-12)")]
    InvalidMonth(u32),

    #[error("Invalid year: {0}")]
    InvalidYear(i32),

    #[error("Period starts after it ends: {start} > {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

/// Report request as it arrives from a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
    pub report_type: ReportType,
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
}

impl ReportFilter {
    pub fn new(report_type: ReportType) -> Self {
        Self {
            report_type,
            month: None,
            year: None,
            date_start: None,
            date_end: None,
        }
    }

    pub fn monthly(year: i32, month: u32) -> Self {
        Self::new(ReportType::Monthly).with_year(year).with_month(month)
    }

    pub fn quarterly() -> Self {
        Self::new(ReportType::Quarterly)
    }

    pub fn annual(year: i32) -> Self {
        Self::new(ReportType::Annual).with_year(year)
    }

    pub fn custom(date_start: NaiveDate, date_end: NaiveDate) -> Self {
        let mut filter = Self::new(ReportType::Custom);
        filter.date_start = Some(date_start);
        filter.date_end = Some(date_end);
        filter
    }

    pub fn with_month(mut self, month: u32) -> Self {
        self.month = Some(month);
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }
}

/// Inclusive calendar date range scoping a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
}

impl Period {
    pub fn new(date_start: NaiveDate, date_end: NaiveDate) -> Result<Self, ValidationError> {
        if date_start > date_end {
            return Err(ValidationError::InvertedRange {
                start: date_start,
                end: date_end,
            });
        }
        Ok(Self {
            date_start,
            date_end,
        })
    }

    /// The full calendar month `month` of `year`.
    pub fn month(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::InvalidMonth(month));
        }
        let date_start =
            NaiveDate::from_ymd_opt(year, month, 1).ok_or(ValidationError::InvalidYear(year))?;
        let date_end = date_start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or(ValidationError::InvalidYear(year))?;
        Ok(Self {
            date_start,
            date_end,
        })
    }

    /// January 1st through December 31st of `year`.
    pub fn year(year: i32) -> Result<Self, ValidationError> {
        let date_start =
            NaiveDate::from_ymd_opt(year, 1, 1).ok_or(ValidationError::InvalidYear(year))?;
        let date_end =
            NaiveDate::from_ymd_opt(year, 12, 31).ok_or(ValidationError::InvalidYear(year))?;
        Ok(Self {
            date_start,
            date_end,
        })
    }

    /// The days shared with `other`, if any.
    pub fn intersect(&self, other: &Period) -> Option<Period> {
        let date_start = self.date_start.max(other.date_start);
        let date_end = self.date_end.min(other.date_end);
        (date_start <= date_end).then_some(Period {
            date_start,
            date_end,
        })
    }

    /// Calendar months touched by this period, in order.
    pub fn months(&self) -> Vec<YearMonth> {
        let mut months = Vec::new();
        let mut cursor = YearMonth::of(self.date_start);
        let last = YearMonth::of(self.date_end);
        while cursor <= last {
            months.push(cursor);
            cursor = cursor.next();
        }
        months
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to {}",
            self.date_start.format("%Y-%m-%d"),
            self.date_end.format("%Y-%m-%d")
        )
    }
}

/// A calendar month within a given year. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    /// English month name, e.g. "March". Falls back to the number when out of range.
    pub fn label(&self) -> String {
        u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name().to_string())
            .unwrap_or_else(|| self.month.to_string())
    }
}

/// Turns a [`ReportFilter`] into a concrete [`Period`] relative to a fixed "today".
#[derive(Debug, Clone, Copy)]
pub struct PeriodResolver {
    today: NaiveDate,
}

impl PeriodResolver {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Resolver anchored to the current UTC date.
    pub fn from_now() -> Self {
        Self::new(Utc::now().date_naive())
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn resolve(&self, filter: &ReportFilter) -> Result<Period, ValidationError> {
        match filter.report_type {
            ReportType::Monthly => {
                let month = filter.month.unwrap_or(self.today.month());
                let year = filter.year.unwrap_or(self.today.year());
                Period::month(year, month)
            }
            ReportType::Quarterly => {
                // Always the quarter containing today, whatever the filter says.
                let quarter = (self.today.month() - 1) / 3;
                let first_month = quarter * 3 + 1;
                let start = Period::month(self.today.year(), first_month)?;
                let end = Period::month(self.today.year(), first_month + 2)?;
                Period::new(start.date_start, end.date_end)
            }
            ReportType::Annual => Period::year(filter.year.unwrap_or(self.today.year())),
            ReportType::Custom => {
                let start = filter.date_start.ok_or(ValidationError::MissingDate("start"))?;
                let end = filter.date_end.ok_or(ValidationError::MissingDate("end"))?;
                Period::new(start, end)
            }
        }
    }
}
