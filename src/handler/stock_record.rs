use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::api_models::{StockRecordResponse, TopStocksQuery};
use crate::app::AppState;
use crate::handler::error::AppError;

const DEFAULT_TOP_LIMIT: usize = 10;
const MAX_TOP_LIMIT: usize = 100;

/// 按股票代码查询最新快照
pub async fn get_stock_record(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<StockRecordResponse>, AppError> {
    let code: i64 = code
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid stock code: {code}")))?;
    let found = state.record_store.get_by_code(code)?;
    Ok(Json(found.into()))
}

/// 最高价排名前 N 的股票
pub async fn list_top_stocks(
    State(state): State<AppState>,
    Query(q): Query<TopStocksQuery>,
) -> Result<Json<Vec<StockRecordResponse>>, AppError> {
    let limit = q.limit.unwrap_or(DEFAULT_TOP_LIMIT).clamp(1, MAX_TOP_LIMIT);
    let items = state.record_store.top_by_high(limit)?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::models::{EntryFormat, NewStockRecord};
    use crate::repositories::{MemoryPrefixIndex, MemoryRecordStore, RecordStore};
    use crate::scheduler::ingest_job::IngestOrchestrator;
    use crate::services::autocomplete::AutocompleteService;
    use crate::services::error::StockServiceError;
    use crate::services::source_fetcher::DailyFileSource;
    use crate::utils::ws_broadcast::create_broadcast_channel;

    struct UnusedSource;

    #[async_trait]
    impl DailyFileSource for UnusedSource {
        async fn fetch_daily_file(&self, url: &str) -> Result<Vec<u8>, StockServiceError> {
            Err(StockServiceError::FetchFailed(url.to_string()))
        }
    }

    fn record(code: i64, high: f64) -> NewStockRecord {
        NewStockRecord {
            code,
            name: format!("S{code}"),
            open: 1.0,
            high,
            low: 0.5,
            close: 1.0,
            prev_close: 1.0,
            volume: 10,
        }
    }

    fn test_state() -> AppState {
        let records = Arc::new(MemoryRecordStore::new());
        let index = Arc::new(MemoryPrefixIndex::new());
        for code in 1..=15 {
            records.upsert_if_absent(&record(code, code as f64)).unwrap();
        }
        let ws_sender = create_broadcast_channel();
        let ingestor = Arc::new(IngestOrchestrator::new(
            Arc::new(UnusedSource),
            records.clone(),
            index.clone(),
            "http://bse.test/EQ",
            EntryFormat::V1,
            ws_sender.clone(),
        ));
        AppState {
            record_store: records,
            autocomplete: AutocompleteService::new(index),
            ingestor,
            ws_sender,
        }
    }

    #[tokio::test]
    async fn test_get_stock_record() {
        let Json(found) = get_stock_record(State(test_state()), Path("7".to_string()))
            .await
            .unwrap();
        assert_eq!(found.code, 7);
        assert_eq!(found.name, "S7");
    }

    #[tokio::test]
    async fn test_get_stock_record_errors() {
        let err = get_stock_record(State(test_state()), Path("abc".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = get_stock_record(State(test_state()), Path("999".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn test_list_top_stocks_default_and_clamped_limit() {
        let Json(items) = list_top_stocks(State(test_state()), Query(TopStocksQuery { limit: None }))
            .await
            .unwrap();
        assert_eq!(items.len(), DEFAULT_TOP_LIMIT);
        assert_eq!(items[0].code, 15);

        let Json(items) = list_top_stocks(State(test_state()), Query(TopStocksQuery { limit: Some(0) }))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
    }
}
