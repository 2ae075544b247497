// Census time-series JSON parsing
use crate::model::{MonthlyRecord, ParserError};
use crate::normalizer::normalize_columns;
use serde_json::Value;
use tracing::{debug, warn};

pub trait Parser {
    fn parse(&self, body: &str) -> Result<Vec<MonthlyRecord>, ParserError>;
}

/// Header row plus data rows, every cell rendered as text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Reads a JSON array of arrays whose first row holds the column names.
    pub fn from_json(body: &str) -> Result<Self, ParserError> {
        let data: Vec<Vec<Value>> = serde_json::from_str(body)
            .map_err(|e| ParserError::MalformedPayload(e.to_string()))?;

        let mut rows = data.into_iter();
        let headers = match rows.next() {
            Some(header) => header.into_iter().map(cell_text).collect(),
            None => Vec::new(),
        };
        let rows = rows
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();

        Ok(Self { headers, rows })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Column names the parser maps onto `MonthlyRecord` fields.
#[derive(Debug, Clone)]
pub struct ColumnNames {
    pub code: String,
    pub description: String,
    pub value: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            code: "I_COMMODITY".to_string(),
            description: "I_COMMODITY_SDESC".to_string(),
            value: "I_GEN_VAL_MO".to_string(),
        }
    }
}

pub struct CensusParser {
    columns: ColumnNames,
}

impl CensusParser {
    pub fn new() -> Self {
        Self {
            columns: ColumnNames::default(),
        }
    }

    pub fn columns(&self) -> &ColumnNames {
        &self.columns
    }

    /// Maps an already normalized table into records.
    pub fn records_from_table(&self, table: &RawTable) -> Result<Vec<MonthlyRecord>, ParserError> {
        let code_idx = table
            .column_index(&self.columns.code)
            .ok_or_else(|| ParserError::MissingColumn(self.columns.code.clone()))?;
        let value_idx = table
            .column_index(&self.columns.value)
            .ok_or_else(|| ParserError::MissingColumn(self.columns.value.clone()))?;
        let desc_idx = table.column_index(&self.columns.description);
        if desc_idx.is_none() {
            warn!("Column {} missing, descriptions left blank", self.columns.description);
        }

        let mut records = Vec::with_capacity(table.rows.len());
        let mut skipped = 0usize;

        for (i, row) in table.rows.iter().enumerate() {
            let row_no = i + 1;
            let code = match row.get(code_idx) {
                Some(code) => code.trim(),
                None => {
                    return Err(ParserError::MalformedPayload(format!(
                        "row {} has {} cells, expected {}",
                        row_no,
                        row.len(),
                        table.headers.len()
                    )));
                }
            };
            if code.is_empty() {
                skipped += 1;
                continue;
            }

            let raw_value = row.get(value_idx).map(|v| v.trim()).unwrap_or_default();
            let value = parse_value(raw_value).ok_or_else(|| ParserError::InvalidValue {
                row: row_no,
                category_code: code.to_string(),
                value: raw_value.to_string(),
            })?;

            let description = desc_idx
                .and_then(|idx| row.get(idx))
                .map(|d| d.trim().to_string())
                .unwrap_or_default();

            records.push(MonthlyRecord {
                category_code: code.to_string(),
                category_description: description,
                value,
            });
        }

        if skipped > 0 {
            debug!("Skipped {} rows without a category code", skipped);
        }

        Ok(records)
    }
}

/// Non-negative finite amounts only; blanks are rejected rather than read as zero.
fn parse_value(raw: &str) -> Option<f64> {
    let value = raw.parse::<f64>().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

impl Parser for CensusParser {
    fn parse(&self, body: &str) -> Result<Vec<MonthlyRecord>, ParserError> {
        let mut table = RawTable::from_json(body)?;
        let dropped = normalize_columns(&mut table);
        if !dropped.is_empty() {
            debug!("Dropped duplicate columns: {:?}", dropped);
        }
        self.records_from_table(&table)
    }
}
