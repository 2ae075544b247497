use crate::analyzer::{
    ChapterScope, OpportunityConfig, VolumeBand, aggregate, classify, compare, rank, scope,
};
use crate::config::AppConfig;
use crate::fetcher::{FetchProgress, MonthSource, PeriodData, collect_periods};
use crate::model::{Classification, ClassifiedRow, FetchError, YearMonth};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Everything one analysis run needs, resolved from configuration.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub year: i32,
    pub months: Vec<u32>,
    pub concurrency: usize,
    pub chapter: ChapterScope,
    pub chapter_prefix_len: usize,
    pub opportunity: OpportunityConfig,
    pub top_n: usize,
}

impl AnalysisSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        let a = &cfg.analysis;
        Self {
            year: a.resolved_year(),
            months: a.quarter.months().to_vec(),
            concurrency: cfg.source.max_concurrent_requests,
            chapter: ChapterScope::parse(&a.chapter),
            chapter_prefix_len: a.chapter_prefix_len,
            opportunity: OpportunityConfig {
                band: VolumeBand::from_millions(a.min_volume_millions, a.max_volume_millions),
                gem_enabled: a.gem_mode,
                gem_growth_threshold: a.gem_growth_threshold,
                noise_floor: a.noise_floor,
            },
            top_n: a.top_n,
        }
    }

    pub fn prior_year(&self) -> i32 {
        self.year - 1
    }
}

/// Which side of the comparison came back without any records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataGap {
    Current,
    Prior,
    Both,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub year: i32,
    pub prior_year: i32,
    pub current_months: Vec<YearMonth>,
    pub prior_months: Vec<YearMonth>,
    /// Categories present in both years.
    pub compared: usize,
    /// Categories left after chapter scoping.
    pub in_scope: usize,
    pub standard_count: usize,
    pub gem_count: usize,
    /// Ranked and truncated rows.
    pub rows: Vec<ClassifiedRow>,
}

/// Terminal state of a run. Only `Ranked` carries rows.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    NoData { gap: DataGap },
    NoOverlap,
    EmptyChapter { chapter: String },
    NoMatches,
    Ranked(AnalysisReport),
}

impl AnalysisOutcome {
    /// True when the source had nothing, as opposed to filters removing everything.
    pub fn is_no_data(&self) -> bool {
        matches!(self, AnalysisOutcome::NoData { .. })
    }
}

pub async fn run_analysis<S>(
    source: &S,
    settings: &AnalysisSettings,
    progress: Option<UnboundedSender<FetchProgress>>,
) -> Result<AnalysisOutcome, PipelineError>
where
    S: MonthSource + ?Sized,
{
    let prior_year = settings.prior_year();
    info!(
        "Fetching {} and {} for months {:?}",
        settings.year, prior_year, settings.months
    );

    let mut periods = collect_periods(
        source,
        &[settings.year, prior_year],
        &settings.months,
        settings.concurrency,
        progress.as_ref(),
    )
    .await?
    .into_iter();
    let current = periods
        .next()
        .unwrap_or_else(|| PeriodData::empty(settings.year));
    let prior = periods.next().unwrap_or_else(|| PeriodData::empty(prior_year));

    let current_totals = aggregate(&current.records());
    let prior_totals = aggregate(&prior.records());
    info!(
        "Aggregated {} categories for {} and {} for {}",
        current_totals.len(),
        settings.year,
        prior_totals.len(),
        prior_year
    );

    let gap = match (current_totals.is_empty(), prior_totals.is_empty()) {
        (true, true) => Some(DataGap::Both),
        (true, false) => Some(DataGap::Current),
        (false, true) => Some(DataGap::Prior),
        (false, false) => None,
    };
    if let Some(gap) = gap {
        return Ok(AnalysisOutcome::NoData { gap });
    }

    let compared = compare(&current_totals, &prior_totals);
    if compared.is_empty() {
        return Ok(AnalysisOutcome::NoOverlap);
    }
    let compared_count = compared.len();

    let scoped = scope(compared, &settings.chapter, settings.chapter_prefix_len);
    if scoped.is_empty() {
        return Ok(AnalysisOutcome::EmptyChapter {
            chapter: settings.chapter.to_string(),
        });
    }
    let in_scope = scoped.len();

    let matches: Vec<ClassifiedRow> = classify(scoped, &settings.opportunity)
        .into_iter()
        .filter(|r| r.classification != Classification::Excluded)
        .collect();
    if matches.is_empty() {
        return Ok(AnalysisOutcome::NoMatches);
    }

    let standard_count = matches
        .iter()
        .filter(|r| r.classification == Classification::Standard)
        .count();
    let gem_count = matches.len() - standard_count;
    info!(
        "{} compared, {} in scope, {} standard, {} gems",
        compared_count, in_scope, standard_count, gem_count
    );

    Ok(AnalysisOutcome::Ranked(AnalysisReport {
        year: settings.year,
        prior_year,
        current_months: current.months_with_data(),
        prior_months: prior.months_with_data(),
        compared: compared_count,
        in_scope,
        standard_count,
        gem_count,
        rows: rank(matches, settings.top_n),
    }))
}
