// Fetcher module: one request per month, merged back into calendar order.

pub mod cached;
pub mod census;
pub mod traits;

pub use cached::CachedSource;
pub use census::CensusFetcher;
pub use traits::MonthSource;

use crate::model::{FetchError, MonthFetch, MonthlyRecord, YearMonth};
use futures::stream::{self, Stream, StreamExt};
use std::collections::BTreeMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

/// Progress event emitted after each month of a year completes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchProgress {
    pub year: i32,
    pub completed: usize,
    pub total: usize,
}

impl FetchProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Month outcomes of one year, keyed and ordered by period.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodData {
    pub year: i32,
    pub slices: BTreeMap<YearMonth, MonthFetch>,
}

impl PeriodData {
    pub fn empty(year: i32) -> Self {
        Self {
            year,
            slices: BTreeMap::new(),
        }
    }

    /// All records in calendar order of their month.
    pub fn records(&self) -> Vec<MonthlyRecord> {
        self.slices
            .values()
            .flat_map(|fetch| fetch.records().iter().cloned())
            .collect()
    }

    pub fn months_with_data(&self) -> Vec<YearMonth> {
        self.slices
            .iter()
            .filter(|(_, fetch)| fetch.has_data())
            .map(|(period, _)| *period)
            .collect()
    }

    pub fn has_data(&self) -> bool {
        self.slices.values().any(MonthFetch::has_data)
    }
}

/// Lazily fetches the given periods with at most `concurrency` requests in flight.
/// Items arrive in completion order.
pub fn month_stream<'a, S>(
    source: &'a S,
    periods: Vec<YearMonth>,
    concurrency: usize,
) -> impl Stream<Item = (YearMonth, Result<MonthFetch, FetchError>)> + 'a
where
    S: MonthSource + ?Sized,
{
    stream::iter(periods)
        .map(move |period| async move { (period, source.fetch_month(period).await) })
        .buffer_unordered(concurrency.max(1))
}

/// Fetches the requested months of every year through one bounded stream and
/// merges the results by period. Output follows the order of `years`.
///
/// A hard error aborts the whole run; months still in flight are dropped.
pub async fn collect_periods<S>(
    source: &S,
    years: &[i32],
    months: &[u32],
    concurrency: usize,
    progress: Option<&UnboundedSender<FetchProgress>>,
) -> Result<Vec<PeriodData>, FetchError>
where
    S: MonthSource + ?Sized,
{
    let total = months.len();
    let periods: Vec<YearMonth> = years
        .iter()
        .flat_map(|&year| months.iter().map(move |&month| YearMonth::new(year, month)))
        .collect();
    let mut data: Vec<PeriodData> = years.iter().map(|&year| PeriodData::empty(year)).collect();
    let mut stream = Box::pin(month_stream(source, periods, concurrency));

    while let Some((period, result)) = stream.next().await {
        let Some(year_data) = data.iter_mut().find(|d| d.year == period.year) else {
            continue;
        };
        if let Some(tx) = progress {
            // Receiver may be gone; progress is cosmetic.
            let _ = tx.send(FetchProgress {
                year: period.year,
                completed: year_data.slices.len() + 1,
                total,
            });
        }

        let fetch = result?;
        if let MonthFetch::Unavailable { reason } = &fetch {
            warn!("{}: skipped ({})", period, reason);
        }
        year_data.slices.insert(period, fetch);
    }

    Ok(data)
}
