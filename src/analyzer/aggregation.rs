use crate::model::{CategoryYearTotal, MonthlyRecord};
use std::collections::BTreeMap;
use tracing::warn;

/// Collapses monthly records into one total per category code.
///
/// The first description seen for a code is kept. Output is ordered by code.
/// Each code's values are summed in ascending order, so totals do not depend
/// on the order records arrive in.
pub fn aggregate(records: &[MonthlyRecord]) -> Vec<CategoryYearTotal> {
    let mut groups: BTreeMap<&str, (&str, Vec<f64>)> = BTreeMap::new();
    let mut conflicts = 0usize;

    for record in records {
        let (description, values) = groups
            .entry(record.category_code.as_str())
            .or_insert_with(|| (record.category_description.as_str(), Vec::new()));

        if *description != record.category_description {
            conflicts += 1;
        }
        values.push(record.value);
    }

    if conflicts > 0 {
        warn!(
            "{} records carried a description differing from the first one seen for their code",
            conflicts
        );
    }

    groups
        .into_iter()
        .map(|(code, (description, mut values))| {
            values.sort_by(f64::total_cmp);
            CategoryYearTotal {
                category_code: code.to_string(),
                category_description: description.to_string(),
                value: values.iter().sum(),
            }
        })
        .collect()
}
