use crate::model::{MonthlyRecord, StorageError, YearMonth};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

/// Month-level cache of published API data.
///
/// Only months that returned records are stored: published figures do not
/// change, while an empty month may still be filled in later.
pub struct SqliteStorage {
    conn: Connection,
}

/// Bookkeeping row for one cached month.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedMonth {
    pub period: YearMonth,
    pub commodity_level: String,
    pub record_count: usize,
    pub fetched_at: DateTime<Utc>,
}

impl SqliteStorage {
    /// Opens (or creates) the cache database and its tables.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS cached_months (
                year INTEGER NOT NULL,
                month INTEGER NOT NULL,
                commodity_level TEXT NOT NULL,
                record_count INTEGER NOT NULL,
                fetched_at TEXT NOT NULL,
                PRIMARY KEY (year, month, commodity_level)
            );

            CREATE TABLE IF NOT EXISTS monthly_records (
                year INTEGER NOT NULL,
                month INTEGER NOT NULL,
                commodity_level TEXT NOT NULL,
                seq INTEGER NOT NULL,
                category_code TEXT NOT NULL,
                category_description TEXT NOT NULL,
                value REAL NOT NULL,
                PRIMARY KEY (year, month, commodity_level, seq)
            );
            ",
        )?;

        Ok(Self { conn })
    }

    /// Replaces the cached records for a month.
    pub fn save_month(
        &self,
        period: YearMonth,
        commodity_level: &str,
        records: &[MonthlyRecord],
    ) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "DELETE FROM monthly_records WHERE year = ?1 AND month = ?2 AND commodity_level = ?3",
            params![period.year, period.month, commodity_level],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO monthly_records (
                    year, month, commodity_level, seq,
                    category_code, category_description, value
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for (seq, record) in records.iter().enumerate() {
                stmt.execute(params![
                    period.year,
                    period.month,
                    commodity_level,
                    seq as i64,
                    &record.category_code,
                    &record.category_description,
                    record.value,
                ])?;
            }
        }
        tx.execute(
            "INSERT OR REPLACE INTO cached_months (year, month, commodity_level, record_count, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                period.year,
                period.month,
                commodity_level,
                records.len() as i64,
                Utc::now().to_rfc3339(),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Cached records for a month, `None` when the month was never stored.
    pub fn load_month(
        &self,
        period: YearMonth,
        commodity_level: &str,
    ) -> Result<Option<Vec<MonthlyRecord>>, StorageError> {
        let expected: Option<i64> = self
            .conn
            .query_row(
                "SELECT record_count FROM cached_months
                 WHERE year = ?1 AND month = ?2 AND commodity_level = ?3",
                params![period.year, period.month, commodity_level],
                |row| row.get(0),
            )
            .optional()?;

        let Some(expected) = expected else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT category_code, category_description, value FROM monthly_records
             WHERE year = ?1 AND month = ?2 AND commodity_level = ?3
             ORDER BY seq ASC",
        )?;
        let rows = stmt.query_map(params![period.year, period.month, commodity_level], |row| {
            Ok(MonthlyRecord {
                category_code: row.get(0)?,
                category_description: row.get(1)?,
                value: row.get(2)?,
            })
        })?;

        let records = rows.collect::<Result<Vec<_>, _>>()?;
        if records.len() as i64 != expected {
            return Err(StorageError::Corrupt(format!(
                "{} has {} cached records, expected {}",
                period,
                records.len(),
                expected
            )));
        }

        Ok(Some(records))
    }

    /// Lists cached months, oldest period first.
    pub fn cached_months(&self) -> Result<Vec<CachedMonth>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT year, month, commodity_level, record_count, fetched_at
             FROM cached_months ORDER BY year ASC, month ASC, commodity_level ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            let fetched_at_str: String = row.get(4)?;
            let fetched_at = fetched_at_str.parse().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
            })?;
            let record_count: i64 = row.get(3)?;
            Ok(CachedMonth {
                period: YearMonth::new(row.get(0)?, row.get(1)?),
                commodity_level: row.get(2)?,
                record_count: record_count.max(0) as usize,
                fetched_at,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Drops every cached month.
    pub fn clear(&self) -> Result<usize, StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM monthly_records", [])?;
        let removed = tx.execute("DELETE FROM cached_months", [])?;
        tx.commit()?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, desc: &str, value: f64) -> MonthlyRecord {
        MonthlyRecord {
            category_code: code.to_string(),
            category_description: desc.to_string(),
            value,
        }
    }

    #[test]
    fn unknown_month_is_none() {
        let storage = SqliteStorage::new(":memory:").unwrap();
        assert_eq!(storage.load_month(YearMonth::new(2025, 1), "HS4").unwrap(), None);
    }

    #[test]
    fn saved_month_loads_in_original_order() {
        let storage = SqliteStorage::new(":memory:").unwrap();
        let period = YearMonth::new(2025, 1);
        let records = vec![
            record("8471", "COMPUTERS", 2_500_000_000.0),
            record("0101", "LIVE HORSES", 1_000_000.0),
        ];
        storage.save_month(period, "HS4", &records).unwrap();

        assert_eq!(storage.load_month(period, "HS4").unwrap(), Some(records));
        assert_eq!(storage.load_month(period, "HS6").unwrap(), None);
    }

    #[test]
    fn saving_again_replaces_the_month() {
        let storage = SqliteStorage::new(":memory:").unwrap();
        let period = YearMonth::new(2024, 7);
        storage
            .save_month(period, "HS4", &[record("0101", "A", 1.0), record("0102", "B", 2.0)])
            .unwrap();
        storage.save_month(period, "HS4", &[record("0103", "C", 3.0)]).unwrap();

        let loaded = storage.load_month(period, "HS4").unwrap().unwrap();
        assert_eq!(loaded, vec![record("0103", "C", 3.0)]);

        let months = storage.cached_months().unwrap();
        assert_eq!(months.len(), 1);
        assert_eq!(months[0].record_count, 1);
    }

    #[test]
    fn clear_removes_everything() {
        let storage = SqliteStorage::new(":memory:").unwrap();
        storage.save_month(YearMonth::new(2024, 1), "HS4", &[record("0101", "A", 1.0)]).unwrap();
        storage.save_month(YearMonth::new(2024, 2), "HS4", &[record("0101", "A", 1.0)]).unwrap();
        assert_eq!(storage.clear().unwrap(), 2);
        assert!(storage.cached_months().unwrap().is_empty());
    }

    #[test]
    fn cache_survives_reopening_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        let path = path.to_str().unwrap();
        let period = YearMonth::new(2023, 3);
        {
            let storage = SqliteStorage::new(path).unwrap();
            storage.save_month(period, "HS4", &[record("0101", "A", 7.0)]).unwrap();
        }
        let storage = SqliteStorage::new(path).unwrap();
        assert_eq!(
            storage.load_month(period, "HS4").unwrap(),
            Some(vec![record("0101", "A", 7.0)])
        );
    }
}
