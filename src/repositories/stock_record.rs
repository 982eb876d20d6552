use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use diesel::prelude::*;
use diesel::OptionalExtension;

use crate::app::DbPool;
use crate::models::{NewStockRecord, StockRecord};
use crate::repositories::{RecordStore, UpsertOutcome};
use crate::schema::stock_records::dsl::*;
use crate::services::error::StockServiceError;

pub struct PgRecordStore {
    pool: DbPool,
}

impl PgRecordStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl RecordStore for PgRecordStore {
    fn upsert_if_absent(&self, record: &NewStockRecord) -> Result<UpsertOutcome, StockServiceError> {
        let mut conn = self.pool.get()?;
        let affected = diesel::insert_into(stock_records)
            .values(record)
            .on_conflict(code)
            .do_nothing()
            .execute(&mut conn)?;
        Ok(if affected == 0 {
            UpsertOutcome::Skipped
        } else {
            UpsertOutcome::Inserted
        })
    }

    fn get_by_code(&self, stock_code: i64) -> Result<StockRecord, StockServiceError> {
        let mut conn = self.pool.get()?;
        stock_records
            .find(stock_code)
            .select(StockRecord::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or(StockServiceError::NotFound(stock_code))
    }

    fn top_by_high(&self, limit: usize) -> Result<Vec<StockRecord>, StockServiceError> {
        let mut conn = self.pool.get()?;
        let rows = stock_records
            .order((high.desc(), code.asc()))
            .limit(limit as i64)
            .select(StockRecord::as_select())
            .load(&mut conn)?;
        Ok(rows)
    }
}

/// 进程内存储，`STORAGE_BACKEND=memory` 时使用，重启后数据丢失
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<i64, StockRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StockServiceError {
    StockServiceError::StoreUnavailable("record store lock poisoned".to_string())
}

impl RecordStore for MemoryRecordStore {
    fn upsert_if_absent(&self, record: &NewStockRecord) -> Result<UpsertOutcome, StockServiceError> {
        let mut records = self.records.write().map_err(poisoned)?;
        match records.entry(record.code) {
            Entry::Occupied(_) => Ok(UpsertOutcome::Skipped),
            Entry::Vacant(slot) => {
                slot.insert(record.clone().into_record(Utc::now()));
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    fn get_by_code(&self, stock_code: i64) -> Result<StockRecord, StockServiceError> {
        let records = self.records.read().map_err(poisoned)?;
        records
            .get(&stock_code)
            .cloned()
            .ok_or(StockServiceError::NotFound(stock_code))
    }

    fn top_by_high(&self, limit: usize) -> Result<Vec<StockRecord>, StockServiceError> {
        let records = self.records.read().map_err(poisoned)?;
        let mut rows: Vec<StockRecord> = records.values().cloned().collect();
        rows.sort_by(|a, b| b.high.total_cmp(&a.high).then(a.code.cmp(&b.code)));
        rows.truncate(limit);
        Ok(rows)
    }
}
