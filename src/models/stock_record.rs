use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::schema::stock_records;

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = stock_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StockRecord {
    pub code: i64,
    pub name: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub prev_close: f64,
    pub volume: i64,
    pub created_at: DateTime<Utc>,
}

/// 解析后待入库的记录，`created_at` 由存储层在首次插入时生成
#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = stock_records)]
pub struct NewStockRecord {
    pub code: i64,
    pub name: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub prev_close: f64,
    pub volume: i64,
}

impl NewStockRecord {
    pub fn into_record(self, created_at: DateTime<Utc>) -> StockRecord {
        StockRecord {
            code: self.code,
            name: self.name,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            prev_close: self.prev_close,
            volume: self.volume,
            created_at,
        }
    }
}
