use serde::{Deserialize, Serialize};

use crate::models::StockRecord;

#[derive(Debug, Serialize)]
pub struct StockRecordResponse {
    pub code: i64,
    pub name: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub prev_close: f64,
    pub volume: i64,
    /// YYYY-MM-DD
    pub created_at: String,
}

impl From<StockRecord> for StockRecordResponse {
    fn from(r: StockRecord) -> Self {
        Self {
            code: r.code,
            name: r.name,
            open: r.open,
            high: r.high,
            low: r.low,
            close: r.close,
            prev_close: r.prev_close,
            volume: r.volume,
            created_at: r.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TopStocksQuery {
    pub limit: Option<usize>,
}
