use crate::model::ClassifiedRow;
use crate::pipeline::{AnalysisOutcome, AnalysisReport, AnalysisSettings, DataGap};
use crate::utils::{format_periods, truncate_chars};
use std::fmt::Write;

const DESCRIPTION_WIDTH: usize = 44;

/// User-facing text for a run that ended before producing rows.
///
/// "No data" and "filtered to nothing" read differently on purpose.
pub fn outcome_message(outcome: &AnalysisOutcome, settings: &AnalysisSettings) -> String {
    let year = settings.year;
    let prior = settings.prior_year();
    match outcome {
        AnalysisOutcome::NoData { gap } => {
            let missing = match gap {
                DataGap::Current => year.to_string(),
                DataGap::Prior => prior.to_string(),
                DataGap::Both => format!("{} and {}", year, prior),
            };
            format!(
                "Data not available for {}. Trade data is published with a lag of about 45 days; the selected quarter may not be out yet.",
                missing
            )
        }
        AnalysisOutcome::NoOverlap => format!(
            "Data is available, but no category appears in both {} and {}.",
            year, prior
        ),
        AnalysisOutcome::EmptyChapter { chapter } => {
            format!("Data is available, but nothing falls in chapter {}.", chapter)
        }
        AnalysisOutcome::NoMatches => {
            "Data is available, but no category passes the volume and gem filters.".to_string()
        }
        AnalysisOutcome::Ranked(report) => format!(
            "{} categories ranked for {} vs {}.",
            report.rows.len(),
            report.year,
            report.prior_year
        ),
    }
}

fn format_growth(growth: Option<f64>) -> String {
    match growth {
        Some(g) => format!("{:.1}%", g),
        None => "n/a".to_string(),
    }
}

fn render_row(out: &mut String, rank: usize, r: &ClassifiedRow) {
    let _ = writeln!(
        out,
        "{:>3}  {:<8} {:<width$} {:>12.2} {:>10}  {}",
        rank,
        r.row.category_code,
        truncate_chars(&r.row.category_description, DESCRIPTION_WIDTH),
        r.row.market_size,
        format_growth(r.row.growth_pct),
        r.classification,
        width = DESCRIPTION_WIDTH,
    );
}

/// Ranked table followed by a short summary.
pub fn render_report(report: &AnalysisReport, title: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(
        out,
        "{:>3}  {:<8} {:<width$} {:>12} {:>10}  {}",
        "#",
        "Code",
        "Description",
        "Size ($M)",
        "Growth",
        "Class",
        width = DESCRIPTION_WIDTH,
    );
    for (i, row) in report.rows.iter().enumerate() {
        render_row(&mut out, i + 1, row);
    }
    let _ = writeln!(
        out,
        "\n{} standard, {} gems among {} categories in scope ({} present in both years).",
        report.standard_count, report.gem_count, report.in_scope, report.compared
    );
    let _ = writeln!(
        out,
        "Months with data: {} [{}], {} [{}]",
        report.year,
        format_periods(&report.current_months),
        report.prior_year,
        format_periods(&report.prior_months),
    );
    out
}
