// Utility functions
use crate::model::YearMonth;

/// Cuts `text` to at most `max` characters, marking the cut with `...`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// `2025-01, 2025-02`, or `none` for an empty list.
pub fn format_periods(periods: &[YearMonth]) -> String {
    if periods.is_empty() {
        return "none".to_string();
    }
    periods
        .iter()
        .map(YearMonth::time_param)
        .collect::<Vec<_>>()
        .join(", ")
}
