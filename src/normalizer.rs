use crate::parser::RawTable;
use std::collections::HashSet;

/// Trims header names and drops every repeated column, keeping the first
/// occurrence of each name. Returns the names of the dropped columns.
pub fn normalize_columns(table: &mut RawTable) -> Vec<String> {
    for header in table.headers.iter_mut() {
        let trimmed = header.trim();
        if trimmed.len() != header.len() {
            *header = trimmed.to_string();
        }
    }

    let mut seen = HashSet::new();
    let keep: Vec<bool> = table
        .headers
        .iter()
        .map(|h| seen.insert(h.clone()))
        .collect();

    if keep.iter().all(|&k| k) {
        return Vec::new();
    }

    let dropped = table
        .headers
        .iter()
        .zip(&keep)
        .filter(|(_, k)| !**k)
        .map(|(h, _)| h.clone())
        .collect();

    table.headers = retain_kept(std::mem::take(&mut table.headers), &keep);
    for row in table.rows.iter_mut() {
        *row = retain_kept(std::mem::take(row), &keep);
    }

    dropped
}

// Cells beyond the header width are kept as-is.
fn retain_kept(cells: Vec<String>, keep: &[bool]) -> Vec<String> {
    cells
        .into_iter()
        .enumerate()
        .filter(|(i, _)| keep.get(*i).copied().unwrap_or(true))
        .map(|(_, cell)| cell)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn keeps_first_occurrence_of_each_name() {
        let mut t = table(
            &["A", "B", "A", "C", "B"],
            &[&["a1", "b1", "a2", "c1", "b2"]],
        );
        let dropped = normalize_columns(&mut t);
        assert_eq!(dropped, vec!["A", "B"]);
        assert_eq!(t.headers, vec!["A", "B", "C"]);
        assert_eq!(t.rows[0], vec!["a1", "b1", "c1"]);
    }

    #[test]
    fn untouched_when_unique() {
        let mut t = table(&["A", "B"], &[&["1", "2"]]);
        let before = t.clone();
        assert!(normalize_columns(&mut t).is_empty());
        assert_eq!(t, before);
    }

    #[test]
    fn whitespace_variants_count_as_duplicates() {
        let mut t = table(&["A", " A "], &[&["1", "2"]]);
        assert_eq!(normalize_columns(&mut t), vec!["A"]);
        assert_eq!(t.rows[0], vec!["1"]);
    }
}
