pub mod prefix_index;
pub mod stock_record;

use crate::models::{NewStockRecord, StockRecord};
use crate::services::error::StockServiceError;

pub use prefix_index::{MemoryPrefixIndex, PgPrefixIndex};
pub use stock_record::{MemoryRecordStore, PgRecordStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Skipped,
}

/// 按股票代码存储最新快照，同一代码只保留首次写入的记录
pub trait RecordStore: Send + Sync {
    fn upsert_if_absent(&self, record: &NewStockRecord) -> Result<UpsertOutcome, StockServiceError>;

    fn get_by_code(&self, code: i64) -> Result<StockRecord, StockServiceError>;

    /// 按最高价倒序取前 `limit` 条
    fn top_by_high(&self, limit: usize) -> Result<Vec<StockRecord>, StockServiceError>;
}

/// 有序多重集合，按字节字典序支持前缀范围查询
pub trait PrefixIndex: Send + Sync {
    /// 允许重复写入
    fn add_entry(&self, member: &str) -> Result<(), StockServiceError>;

    /// 返回所有以 `prefix` 开头的条目，按字节升序
    fn query_prefix(&self, prefix: &str) -> Result<Vec<String>, StockServiceError>;
}
