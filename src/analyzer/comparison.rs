use crate::model::{CategoryYearTotal, ComparisonRow};
use std::collections::HashMap;

const MILLION: f64 = 1_000_000.0;

/// Year-over-year change in percent; `None` when the prior value is zero.
pub fn growth_pct(current: f64, prior: f64) -> Option<f64> {
    if prior == 0.0 {
        return None;
    }
    let growth = (current - prior) / prior * 100.0;
    growth.is_finite().then_some(growth)
}

/// Inner-joins both years on category code.
///
/// Codes present in only one year are dropped. Rows keep the order of `current`.
pub fn compare(current: &[CategoryYearTotal], prior: &[CategoryYearTotal]) -> Vec<ComparisonRow> {
    let prior_by_code: HashMap<&str, f64> = prior
        .iter()
        .map(|t| (t.category_code.as_str(), t.value))
        .collect();

    current
        .iter()
        .filter_map(|cur| {
            let value_prior = *prior_by_code.get(cur.category_code.as_str())?;
            Some(ComparisonRow {
                category_code: cur.category_code.clone(),
                category_description: cur.category_description.clone(),
                value_current: cur.value,
                value_prior,
                growth_pct: growth_pct(cur.value, value_prior),
                market_size: cur.value / MILLION,
            })
        })
        .collect()
}
