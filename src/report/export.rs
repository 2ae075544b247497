use crate::model::{ClassifiedRow, ExportError};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

pub const HEADERS: [&str; 6] = [
    "category_code",
    "description",
    "value_current",
    "value_prior",
    "growth_pct",
    "classification",
];

/// One line of the flat export, in column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub category_code: String,
    pub description: String,
    pub value_current: f64,
    pub value_prior: f64,
    /// Empty when growth is undefined.
    pub growth_pct: Option<f64>,
    pub classification: String,
}

impl From<&ClassifiedRow> for ExportRow {
    fn from(r: &ClassifiedRow) -> Self {
        Self {
            category_code: r.row.category_code.clone(),
            description: sanitize_field(&r.row.category_description),
            value_current: r.row.value_current,
            value_prior: r.row.value_prior,
            growth_pct: r.row.growth_pct,
            classification: r.classification.label().to_string(),
        }
    }
}

/// Replaces delimiters, quotes and line breaks so a field never needs quoting.
pub fn sanitize_field(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            ',' => ';',
            '"' => '\'',
            '\r' | '\n' => ' ',
            other => other,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

pub fn write_export<W: Write>(writer: W, rows: &[ClassifiedRow]) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(HEADERS)?;
    for row in rows {
        wtr.serialize(ExportRow::from(row))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_to_path(path: &Path, rows: &[ClassifiedRow]) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_export(file, rows)
}

pub fn read_export<R: Read>(reader: R) -> Result<Vec<ExportRow>, ExportError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let rows = rdr.deserialize().collect::<Result<Vec<ExportRow>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Classification, ComparisonRow};

    fn classified(code: &str, desc: &str, growth: Option<f64>, tag: Classification) -> ClassifiedRow {
        ClassifiedRow {
            row: ComparisonRow {
                category_code: code.into(),
                category_description: desc.into(),
                value_current: 4_000_000.0,
                value_prior: 3_000_000.0,
                growth_pct: growth,
                market_size: 4.0,
            },
            classification: tag,
        }
    }

    fn sample() -> Vec<ClassifiedRow> {
        vec![
            classified("0101", "LIVE HORSES, ASSES", Some(100.0 / 3.0), Classification::Standard),
            classified("0302", "FISH \"FRESH\"\nCHILLED", Some(412.5), Classification::Gem),
            classified("8471", "COMPUTERS", None, Classification::Standard),
        ]
    }

    #[test]
    fn header_and_column_order_are_fixed() {
        let mut buf = Vec::new();
        write_export(&mut buf, &sample()[..1]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("category_code,description,value_current,value_prior,growth_pct,classification")
        );
        assert!(lines.next().unwrap().starts_with("0101,LIVE HORSES; ASSES,4000000.0,3000000.0,"));
    }

    #[test]
    fn free_text_never_needs_quoting() {
        let mut buf = Vec::new();
        write_export(&mut buf, &sample()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 4);
        assert!(!text.contains('"'));
        for line in text.lines() {
            assert_eq!(line.matches(',').count(), 5, "{}", line);
        }
    }

    #[test]
    fn reparsing_reproduces_codes_and_growth() {
        let rows = sample();
        let mut buf = Vec::new();
        write_export(&mut buf, &rows).unwrap();
        let parsed = read_export(buf.as_slice()).unwrap();

        assert_eq!(parsed.len(), rows.len());
        for (orig, back) in rows.iter().zip(&parsed) {
            assert_eq!(back.category_code, orig.row.category_code);
            match (orig.row.growth_pct, back.growth_pct) {
                (Some(a), Some(b)) => assert!((a - b).abs() < 1e-9),
                (None, None) => {}
                other => panic!("growth mismatch: {:?}", other),
            }
            assert_eq!(back.classification, orig.classification.label());
        }
    }

    #[test]
    fn exports_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("top.csv");
        export_to_path(&path, &sample()).unwrap();
        let parsed = read_export(File::open(&path).unwrap()).unwrap();
        assert_eq!(parsed[2].category_code, "8471");
        assert_eq!(parsed[2].growth_pct, None);
    }
}
