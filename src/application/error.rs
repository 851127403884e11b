use std::time::Duration;

use thiserror::Error;

use crate::domain::ValidationError;

/// Which statistics source a gateway call targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsSource {
    Purchases,
    Sales,
    Expenses,
}

impl StatsSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatsSource::Purchases => "purchases",
            StatsSource::Sales => "sales",
            StatsSource::Expenses => "expenses",
        }
    }
}

impl std::fmt::Display for StatsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid report request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to fetch {origin} statistics: {error}")]
    Gateway {
        origin: StatsSource,
        #[source]
        error: anyhow::Error,
    },

    #[error("Failed to load reference data: {0}")]
    Reference(#[source] anyhow::Error),

    #[error("Report build exceeded deadline of {0:?}")]
    Timeout(Duration),

    #[error("Export failed: {0}")]
    Export(#[source] anyhow::Error),
}

impl ReportError {
    pub fn gateway(origin: StatsSource, error: anyhow::Error) -> Self {
        ReportError::Gateway { origin, error }
    }

    /// The source that failed, if this is a gateway failure.
    pub fn failed_source(&self) -> Option<StatsSource> {
        match self {
            ReportError::Gateway { origin, .. } => Some(*origin),
            _ => None,
        }
    }
}
