// Application layer: the reporting engine and its collaborator seams.
// Sources are reached only through the traits in `gateway`; the bundled
// SQLite store is one implementation of them.

pub mod aggregator;
pub mod breakdown;
pub mod error;
pub mod gateway;
pub mod reporting;
pub mod rollup;
pub mod service;
pub mod trends;

pub use aggregator::{PeriodAggregator, PeriodSnapshot};
pub use breakdown::build_category_breakdown;
pub use error::*;
pub use gateway::{CategoryLabels, NoReferenceData, ReferenceData, SourceGateway};
pub use reporting::*;
pub use rollup::{MAX_CONCURRENT_MONTHS, MonthlyRollupEngine, summarize_year};
pub use service::{ReportService, ReportSettings};
pub use trends::compute_trends;
