use crate::fetcher::traits::MonthSource;
use crate::model::{FetchError, MonthFetch, YearMonth};
use crate::storage::SqliteStorage;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Serves months from the SQLite cache and stores what the inner source returns.
///
/// Cache errors are logged and never fail a fetch.
pub struct CachedSource<S> {
    inner: S,
    storage: Arc<Mutex<SqliteStorage>>,
    commodity_level: String,
}

impl<S: MonthSource> CachedSource<S> {
    pub fn new(inner: S, storage: Arc<Mutex<SqliteStorage>>, commodity_level: &str) -> Self {
        Self {
            inner,
            storage,
            commodity_level: commodity_level.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl<S: MonthSource> MonthSource for CachedSource<S> {
    async fn fetch_month(&self, period: YearMonth) -> Result<MonthFetch, FetchError> {
        let cached = self
            .storage
            .lock()
            .await
            .load_month(period, &self.commodity_level);
        match cached {
            Ok(Some(records)) => {
                debug!("{}: served {} records from cache", period, records.len());
                return Ok(MonthFetch::Records(records));
            }
            Ok(None) => {}
            Err(e) => warn!("{}: cache read failed: {}", period, e),
        }

        let fetched = self.inner.fetch_month(period).await?;

        if let MonthFetch::Records(records) = &fetched {
            if !records.is_empty() {
                let saved = self
                    .storage
                    .lock()
                    .await
                    .save_month(period, &self.commodity_level, records);
                if let Err(e) = saved {
                    warn!("{}: cache write failed: {}", period, e);
                }
            }
        }

        Ok(fetched)
    }
}
