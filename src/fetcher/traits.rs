use crate::model::{FetchError, MonthFetch, YearMonth};

/// Anything that can produce the records of one month.
///
/// Soft failures (no data yet, network trouble, error status) are reported
/// as `Ok(MonthFetch::..)`; only data that would corrupt a total is an `Err`.
#[async_trait::async_trait]
pub trait MonthSource: Send + Sync {
    async fn fetch_month(&self, period: YearMonth) -> Result<MonthFetch, FetchError>;
}
