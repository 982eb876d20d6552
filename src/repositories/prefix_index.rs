use std::collections::BTreeMap;
use std::ops::Bound::Included;
use std::sync::RwLock;

use diesel::prelude::*;

use crate::app::DbPool;
use crate::repositories::PrefixIndex;
use crate::schema::stock_name_index::dsl::*;
use crate::services::error::StockServiceError;

/// 前缀查询的闭区间 `[prefix, prefix + 0xFF]`
///
/// UTF-8 编码中不会出现 0xFF 字节，所以以 `prefix` 开头的任意字符串都落在区间内，
/// 区间外的字符串都不以 `prefix` 开头。
pub fn prefix_range(prefix: &str) -> (Vec<u8>, Vec<u8>) {
    let lower = prefix.as_bytes().to_vec();
    let mut upper = lower.clone();
    upper.push(0xFF);
    (lower, upper)
}

pub struct PgPrefixIndex {
    pool: DbPool,
}

impl PgPrefixIndex {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl PrefixIndex for PgPrefixIndex {
    fn add_entry(&self, entry: &str) -> Result<(), StockServiceError> {
        let mut conn = self.pool.get()?;
        diesel::insert_into(stock_name_index)
            .values(member.eq(entry.as_bytes()))
            .execute(&mut conn)?;
        Ok(())
    }

    fn query_prefix(&self, prefix: &str) -> Result<Vec<String>, StockServiceError> {
        let (lower, upper) = prefix_range(prefix);
        let mut conn = self.pool.get()?;
        // 走 member 上的 btree 索引做范围扫描
        let rows: Vec<Vec<u8>> = stock_name_index
            .select(member)
            .filter(member.ge(lower))
            .filter(member.le(upper))
            .order((member.asc(), id.asc()))
            .load(&mut conn)?;

        Ok(rows
            .into_iter()
            .filter_map(|bytes| match String::from_utf8(bytes) {
                Ok(s) => Some(s),
                Err(e) => {
                    tracing::warn!("索引条目不是合法 UTF-8，已跳过: {}", e);
                    None
                }
            })
            .collect())
    }
}

/// 进程内有序多重集合，值为同一条目的出现次数
#[derive(Default)]
pub struct MemoryPrefixIndex {
    members: RwLock<BTreeMap<Vec<u8>, usize>>,
}

impl MemoryPrefixIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StockServiceError {
    StockServiceError::StoreUnavailable("prefix index lock poisoned".to_string())
}

impl PrefixIndex for MemoryPrefixIndex {
    fn add_entry(&self, entry: &str) -> Result<(), StockServiceError> {
        let mut members = self.members.write().map_err(poisoned)?;
        *members.entry(entry.as_bytes().to_vec()).or_insert(0) += 1;
        Ok(())
    }

    fn query_prefix(&self, prefix: &str) -> Result<Vec<String>, StockServiceError> {
        let (lower, upper) = prefix_range(prefix);
        let members = self.members.read().map_err(poisoned)?;
        Ok(members
            .range::<Vec<u8>, _>((Included(&lower), Included(&upper)))
            .flat_map(|(key, count)| {
                std::iter::repeat(String::from_utf8_lossy(key).into_owned()).take(*count)
            })
            .collect())
    }
}
