use std::sync::Arc;

use serde::Serialize;

use crate::models::decode_entry;
use crate::repositories::PrefixIndex;
use crate::services::error::StockServiceError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutocompleteItem {
    pub id: i64,
    pub label: String,
    pub value: String,
}

#[derive(Clone)]
pub struct AutocompleteService {
    index: Arc<dyn PrefixIndex>,
}

impl AutocompleteService {
    pub fn new(index: Arc<dyn PrefixIndex>) -> Self {
        Self { index }
    }

    /// 名称按大写入库，查询词同样转为大写；结果保持索引顺序，不按名称去重
    pub fn autocomplete(&self, query: &str) -> Result<Vec<AutocompleteItem>, StockServiceError> {
        let prefix = normalize_query(query)?;
        let entries = self.index.query_prefix(&prefix)?;

        let mut items = Vec::with_capacity(entries.len());
        for entry in entries {
            match decode_entry(&entry) {
                Ok(decoded) => items.push(AutocompleteItem {
                    id: decoded.code,
                    label: decoded.name.clone(),
                    value: decoded.name,
                }),
                Err(e) => tracing::warn!("无法解析索引条目 {:?}: {}", entry, e),
            }
        }
        tracing::debug!("自动补全 {:?} 命中 {} 条", prefix, items.len());
        Ok(items)
    }
}

pub fn normalize_query(query: &str) -> Result<String, StockServiceError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(StockServiceError::InvalidInput(
            "query must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_uppercase())
}
