use crate::model::ClassifiedRow;
use std::cmp::Ordering;

/// Growth descending, undefined growth last, ties by category code.
pub fn by_growth(a: &ClassifiedRow, b: &ClassifiedRow) -> Ordering {
    let growth = match (a.row.growth_pct, b.row.growth_pct) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    growth.then_with(|| a.row.category_code.cmp(&b.row.category_code))
}

pub fn rank(mut rows: Vec<ClassifiedRow>, top_n: usize) -> Vec<ClassifiedRow> {
    rows.sort_by(by_growth);
    rows.truncate(top_n);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Classification, ComparisonRow};

    fn row(code: &str, growth_pct: Option<f64>) -> ClassifiedRow {
        ClassifiedRow {
            row: ComparisonRow {
                category_code: code.into(),
                category_description: String::new(),
                value_current: 1.0,
                value_prior: 1.0,
                growth_pct,
                market_size: 0.0,
            },
            classification: Classification::Standard,
        }
    }

    fn codes(rows: &[ClassifiedRow]) -> Vec<&str> {
        rows.iter().map(|r| r.row.category_code.as_str()).collect()
    }

    #[test]
    fn sorts_by_growth_descending() {
        let ranked = rank(
            vec![row("a", Some(5.0)), row("b", Some(50.0)), row("c", Some(-5.0))],
            10,
        );
        assert_eq!(codes(&ranked), vec!["b", "a", "c"]);
    }

    #[test]
    fn ties_break_on_code() {
        let ranked = rank(
            vec![row("8471", Some(10.0)), row("0101", Some(10.0)), row("3004", Some(10.0))],
            10,
        );
        assert_eq!(codes(&ranked), vec!["0101", "3004", "8471"]);
    }

    #[test]
    fn undefined_growth_goes_last() {
        let ranked = rank(vec![row("a", None), row("b", Some(-90.0)), row("c", None)], 10);
        assert_eq!(codes(&ranked), vec!["b", "a", "c"]);
    }

    #[test]
    fn truncates_to_top_n() {
        let rows = (0..20).map(|i| row(&format!("{:04}", i), Some(i as f64))).collect();
        let ranked = rank(rows, 15);
        assert_eq!(ranked.len(), 15);
        assert_eq!(ranked[0].row.category_code, "0019");
    }
}
