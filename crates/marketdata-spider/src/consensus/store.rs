use super::codes::FINANCIAL_ITEMS;
use super::reconcile::latest_snapshot;
use super::record::{AccountingStandard, ConsensusRecord, ForecastIndicator, NaturalKey};
use super::sql;
use crate::error::StoreError;
use crate::http::PgPool;
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::{stream, StreamExt};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tokio_postgres::Row;
use tracing::{debug, trace, warn};

/// Persistent home of the consensus snapshots.
#[async_trait]
pub trait Store {
    /// The latest stored record per natural key for `ticker`.
    async fn prior_snapshot(&self, ticker: &str) -> Result<Vec<ConsensusRecord>, StoreError>;

    /// Append records durably, returning how many rows were written. A record whose natural key
    /// & `update_date` are already stored replaces the stored value.
    async fn append(&self, records: &[ConsensusRecord]) -> Result<u64, StoreError>;
}

// postgres
// -------------------------------------------------------------------------------------------------

/// [`Store`] backed by `naver.consensus_financials`.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `naver` tables if needed and seed the code lookup tables from the static maps.
    pub async fn init(&self) -> Result<(), StoreError> {
        let time = std::time::Instant::now();
        let mut pg_client = self.pool.get().await?;

        trace!("creating naver tables ...");
        pg_client.batch_execute(sql::CREATE_TABLES).await?;

        let insert_std = pg_client.prepare(sql::INSERT_ACCOUNTING_STANDARD).await?;
        let insert_item = pg_client.prepare(sql::INSERT_FINANCIAL_ITEM).await?;
        let transaction = pg_client.transaction().await?;
        for standard in AccountingStandard::ALL {
            transaction
                .execute(&insert_std, &[&standard.code(), &standard.label()])
                .await?;
        }
        for (item, code) in FINANCIAL_ITEMS.iter() {
            transaction.execute(&insert_item, &[item, code]).await?;
        }
        transaction.commit().await?;

        debug!("naver tables ready, {}", crate::time_elapsed(time));
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn prior_snapshot(&self, ticker: &str) -> Result<Vec<ConsensusRecord>, StoreError> {
        let pg_client = self.pool.get().await?;
        pg_client
            .query(sql::SELECT_LATEST_SNAPSHOT, &[&ticker])
            .await?
            .iter()
            .map(record_from_row)
            .collect()
    }

    async fn append(&self, records: &[ConsensusRecord]) -> Result<u64, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut pg_client = self.pool.get().await?;
        let query = pg_client.prepare(sql::INSERT_CONSENSUS).await?;
        let transaction = pg_client.transaction().await?;

        let mut inserted = 0;
        let mut stream = stream::iter(collapse_slots(records));
        while let Some(record) = stream.next().await {
            inserted += transaction
                .execute(
                    &query,
                    &[
                        &record.ticker,
                        &record.statement_period,
                        &record.financial_item_name,
                        &record.financial_item_code,
                        &record.value,
                        &record.accounting_standard.code(),
                        &record.forecast_indicator.code(),
                        &record.update_date,
                    ],
                )
                .await?;
        }

        transaction.commit().await?;
        Ok(inserted)
    }
}

fn record_from_row(row: &Row) -> Result<ConsensusRecord, StoreError> {
    let standard: i16 = row.get(5);
    let indicator: String = row.get(6);

    Ok(ConsensusRecord {
        ticker: row.get(0),
        statement_period: row.get(1),
        financial_item_name: row.get(2),
        financial_item_code: row.get(3),
        value: row.get(4),
        accounting_standard: AccountingStandard::from_code(standard).ok_or_else(|| {
            StoreError::Corrupt {
                column: "accounting_standard",
                value: standard.to_string(),
            }
        })?,
        forecast_indicator: ForecastIndicator::from_code(&indicator).ok_or_else(|| {
            StoreError::Corrupt {
                column: "forecast_indicator",
                value: indicator.clone(),
            }
        })?,
        update_date: row.get(7),
    })
}

// in memory
// -------------------------------------------------------------------------------------------------

/// [`Store`] kept in process memory; used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    records: Vec<ConsensusRecord>,
    // position in `records` of each (natural key, update_date), as the postgres primary key
    slots: HashMap<(NaturalKey, NaiveDate), usize>,
}

impl MemoryInner {
    fn upsert(&mut self, record: &ConsensusRecord) -> bool {
        let slot = (record.natural_key(), record.update_date);
        match self.slots.get(&slot) {
            Some(&i) => {
                let stored = &mut self.records[i];
                let moved = stored.value != record.value
                    || stored.financial_item_name != record.financial_item_name;
                if moved {
                    *stored = record.clone();
                }
                moved
            }
            None => {
                self.slots.insert(slot, self.records.len());
                self.records.push(record.clone());
                true
            }
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with previously persisted records.
    pub fn with_records(records: Vec<ConsensusRecord>) -> Self {
        let mut inner = MemoryInner::default();
        for record in &records {
            inner.upsert(record);
        }
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Everything stored so far, in order of first append.
    pub async fn records(&self) -> Vec<ConsensusRecord> {
        self.inner.lock().await.records.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn prior_snapshot(&self, ticker: &str) -> Result<Vec<ConsensusRecord>, StoreError> {
        let inner = self.inner.lock().await;
        let stored = inner
            .records
            .iter()
            .filter(|record| record.ticker == ticker)
            .cloned()
            .collect();
        Ok(latest_snapshot(stored))
    }

    async fn append(&self, records: &[ConsensusRecord]) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let inserted = collapse_slots(records)
            .into_iter()
            .filter(|record| inner.upsert(record))
            .count();
        Ok(inserted as u64)
    }
}

/// Keep the last record of each (natural key, `update_date`) slot, in order. Reconciling a
/// same-day rerun yields the stored row ahead of its revision; the revision wins.
fn collapse_slots(records: &[ConsensusRecord]) -> Vec<&ConsensusRecord> {
    let mut last: HashMap<(NaturalKey, NaiveDate), usize> = HashMap::new();
    for (i, record) in records.iter().enumerate() {
        let slot = (record.natural_key(), record.update_date);
        if let Some(previous) = last.insert(slot, i) {
            let previous = &records[previous];
            if previous.value != record.value {
                warn!(
                    "[{}] {} ({}) revised on {}: {} -> {}",
                    record.ticker,
                    record.financial_item_name,
                    record.statement_period,
                    record.update_date,
                    previous.value,
                    record.value
                );
            }
        }
    }

    records
        .iter()
        .enumerate()
        .filter(|(i, record)| last[&(record.natural_key(), record.update_date)] == *i)
        .map(|(_, record)| record)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(code: i32, value: Decimal, update_date: NaiveDate) -> ConsensusRecord {
        ConsensusRecord {
            ticker: "005930".to_string(),
            statement_period: date(2024, 12, 31),
            financial_item_name: "매출액".to_string(),
            financial_item_code: code,
            value,
            accounting_standard: AccountingStandard::IfrsConsolidated,
            forecast_indicator: ForecastIndicator::Estimated,
            update_date,
        }
    }

    #[test]
    fn later_records_win_their_slot() {
        let day = date(2024, 5, 14);
        let records = vec![
            record(1100, dec!(100), day),
            record(1300, dec!(7), day),
            record(1100, dec!(120), day),
        ];

        let collapsed = collapse_slots(&records);
        assert_eq!(collapsed, vec![&records[1], &records[2]]);
    }

    #[tokio::test]
    async fn same_slot_is_replaced_only_when_the_value_moved() {
        let day = date(2024, 5, 14);
        let store = MemoryStore::new();

        assert_eq!(store.append(&[record(1100, dec!(100), day)]).await.unwrap(), 1);
        assert_eq!(store.append(&[record(1100, dec!(100.0), day)]).await.unwrap(), 0);
        assert_eq!(store.append(&[record(1100, dec!(120), day)]).await.unwrap(), 1);
        assert_eq!(
            store.append(&[record(1100, dec!(120), date(2024, 5, 15))]).await.unwrap(),
            1
        );

        let records = store.records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value, dec!(120));
        assert_eq!(records[0].update_date, day);
    }
}
