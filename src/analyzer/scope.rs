use crate::model::ComparisonRow;
use std::fmt;
use tracing::warn;

/// Which top-level chapter of the classification to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterScope {
    All,
    Chapter(String),
}

impl ChapterScope {
    /// `ALL` (any case) selects everything; anything else is a chapter prefix.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("ALL") {
            ChapterScope::All
        } else {
            ChapterScope::Chapter(value.to_string())
        }
    }
}

impl fmt::Display for ChapterScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChapterScope::All => f.write_str("ALL"),
            ChapterScope::Chapter(prefix) => f.write_str(prefix),
        }
    }
}

/// Leading `prefix_len` characters of a code, `None` when the code is shorter.
pub fn chapter_of(code: &str, prefix_len: usize) -> Option<&str> {
    match code.char_indices().nth(prefix_len) {
        Some((idx, _)) => Some(&code[..idx]),
        None if code.chars().count() == prefix_len => Some(code),
        None => None,
    }
}

pub fn scope(rows: Vec<ComparisonRow>, chapter: &ChapterScope, prefix_len: usize) -> Vec<ComparisonRow> {
    let wanted = match chapter {
        ChapterScope::All => return rows,
        ChapterScope::Chapter(prefix) => prefix.as_str(),
    };

    rows.into_iter()
        .filter(|row| match chapter_of(&row.category_code, prefix_len) {
            Some(prefix) => prefix == wanted,
            None => {
                warn!(
                    "Code {:?} is shorter than the {}-character chapter prefix",
                    row.category_code, prefix_len
                );
                false
            }
        })
        .collect()
}
