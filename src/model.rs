// Core structs: MonthlyRecord, CategoryYearTotal, ComparisonRow and the error types
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single (year, month) time period as understood by the trade API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub const fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Value of the `time` query parameter, e.g. `2025-01`.
    pub fn time_param(&self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.time_param())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    pub category_code: String,
    pub category_description: String,
    pub value: f64,
}

/// What a single month request produced.
#[derive(Debug, Clone, PartialEq)]
pub enum MonthFetch {
    Records(Vec<MonthlyRecord>),
    /// The API has nothing published for the period yet.
    NoContent,
    /// Network failure, timeout, error status or unusable payload.
    Unavailable { reason: String },
}

impl MonthFetch {
    pub fn records(&self) -> &[MonthlyRecord] {
        match self {
            MonthFetch::Records(records) => records,
            _ => &[],
        }
    }

    pub fn has_data(&self) -> bool {
        !self.records().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryYearTotal {
    pub category_code: String,
    pub category_description: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub category_code: String,
    pub category_description: String,
    pub value_current: f64,
    pub value_prior: f64,
    /// `None` when the prior-year value is zero and growth is undefined.
    pub growth_pct: Option<f64>,
    /// Current-year value in millions.
    pub market_size: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Standard,
    Gem,
    Excluded,
}

impl Classification {
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Standard => "Standard",
            Classification::Gem => "Gem",
            Classification::Excluded => "Excluded",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRow {
    pub row: ComparisonRow,
    pub classification: Classification,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParserError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("missing column: {0}")]
    MissingColumn(String),
    #[error("invalid value {value:?} for category {category_code} (row {row})")]
    InvalidValue {
        row: usize,
        category_code: String,
        value: String,
    },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("{period}: {source}")]
    InvalidValue {
        period: YearMonth,
        #[source]
        source: ParserError,
    },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("invalid cached data: {0}")]
    Corrupt(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
