use std::sync::{Arc, RwLock};
use std::time::Instant;

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::BoxFuture;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::EntryFormat;
use crate::repositories::{PrefixIndex, RecordStore, UpsertOutcome};
use crate::scheduler::{IntervalScheduler, ScheduledJob};
use crate::services::error::StockServiceError;
use crate::services::record_parser::{parse_rows, ParsedRecord};
use crate::services::source_fetcher::{daily_file_url, DailyFileSource};
use crate::utils::config::IngestConfig;
use crate::utils::market_time::previous_market_day;
use crate::utils::ws_broadcast::{broadcast_job_status, JobStatusSender};

pub const JOB_NAME: &str = "bhav_ingest";

/// 汇总里最多保留的逐行错误条数，完整错误只写日志
const MAX_REPORTED_PARSE_ERRORS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestState {
    Idle,
    Fetching,
    Parsing,
    Writing,
}

/// 一次导入的执行结果
#[derive(Debug, Clone, Serialize)]
pub struct IngestRunSummary {
    pub file_date: NaiveDate,
    pub url: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub total_rows: usize,
    pub inserted_count: usize,
    pub skipped_count: usize,
    pub indexed_count: usize,
    pub parse_failed_count: usize,
    pub parse_errors: Vec<String>,
    pub error: Option<String>,
}

impl IngestRunSummary {
    fn new(file_date: NaiveDate, url: String, started_at: DateTime<Utc>) -> Self {
        Self {
            file_date,
            url,
            status: "running".to_string(),
            started_at,
            duration_ms: 0,
            total_rows: 0,
            inserted_count: 0,
            skipped_count: 0,
            indexed_count: 0,
            parse_failed_count: 0,
            parse_errors: Vec::new(),
            error: None,
        }
    }
}

#[derive(Debug, Default)]
struct WriteOutcome {
    inserted: usize,
    skipped: usize,
    indexed: usize,
    error: Option<StockServiceError>,
}

/// 日终文件导入：下载 -> 解析 -> 写入记录存储与前缀索引
pub struct IngestOrchestrator {
    source: Arc<dyn DailyFileSource>,
    record_store: Arc<dyn RecordStore>,
    prefix_index: Arc<dyn PrefixIndex>,
    url_prefix: String,
    entry_format: EntryFormat,
    ws_sender: JobStatusSender,
    state: RwLock<IngestState>,
    last_run: RwLock<Option<IngestRunSummary>>,
    run_lock: Arc<Mutex<()>>,
}

impl IngestOrchestrator {
    pub fn new(
        source: Arc<dyn DailyFileSource>,
        record_store: Arc<dyn RecordStore>,
        prefix_index: Arc<dyn PrefixIndex>,
        url_prefix: impl Into<String>,
        entry_format: EntryFormat,
        ws_sender: JobStatusSender,
    ) -> Self {
        Self {
            source,
            record_store,
            prefix_index,
            url_prefix: url_prefix.into(),
            entry_format,
            ws_sender,
            state: RwLock::new(IngestState::Idle),
            last_run: RwLock::new(None),
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn state(&self) -> IngestState {
        self.state.read().map(|s| *s).unwrap_or(IngestState::Idle)
    }

    pub fn last_run(&self) -> Option<IngestRunSummary> {
        self.last_run.read().ok().and_then(|s| s.clone())
    }

    fn set_state(&self, next: IngestState) {
        match self.state.write() {
            Ok(mut state) => {
                tracing::debug!("导入状态 {:?} -> {:?}", *state, next);
                *state = next;
            }
            Err(e) => tracing::warn!("导入状态锁异常: {}", e),
        }
    }

    fn record_last_run(&self, summary: &IngestRunSummary) {
        match self.last_run.write() {
            Ok(mut last) => *last = Some(summary.clone()),
            Err(e) => tracing::warn!("记录导入结果失败: {}", e),
        }
    }

    /// 导入前一个市场日的日终文件（可以被定时任务或手动触发调用）
    pub async fn run(&self) -> Result<IngestRunSummary, StockServiceError> {
        self.run_at(Utc::now()).await
    }

    /// 在独立任务中执行导入，调用方被取消（如 HTTP 客户端断开）时导入照常完成
    pub async fn spawn_run(self: Arc<Self>) -> Result<IngestRunSummary, StockServiceError> {
        tokio::spawn(async move { self.run().await })
            .await
            .map_err(|e| StockServiceError::StoreUnavailable(format!("导入任务异常退出: {e}")))?
    }

    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<IngestRunSummary, StockServiceError> {
        let lock = self.run_lock.clone().try_lock_owned().map_err(|_| {
            tracing::warn!("已有导入任务在执行，本次触发被忽略");
            StockServiceError::IngestInProgress
        })?;

        let file_date = previous_market_day(now);
        let url = daily_file_url(&self.url_prefix, file_date);
        tracing::info!("开始执行日终文件导入，文件日期 {}", file_date);
        broadcast_job_status(&self.ws_sender, JOB_NAME, "running", None);

        let mut run = ActiveRun {
            orchestrator: self,
            summary: IngestRunSummary::new(file_date, url, Utc::now()),
            timer: Instant::now(),
            finished: false,
        };
        let result = self.execute(&mut run.summary, lock).await;
        run.finished = true;
        self.set_state(IngestState::Idle);
        let mut summary = run.summary.clone();
        summary.duration_ms = run.timer.elapsed().as_millis() as i64;

        match result {
            Ok(()) => {
                let status = if summary.parse_failed_count == 0 {
                    "success"
                } else if summary.inserted_count + summary.skipped_count > 0 {
                    "partial"
                } else {
                    "failed"
                };
                summary.status = status.to_string();
                tracing::info!(
                    "日终文件导入完成，总计: {}, 新增: {}, 已存在: {}, 索引: {}, 解析失败: {}, 耗时 {} ms",
                    summary.total_rows,
                    summary.inserted_count,
                    summary.skipped_count,
                    summary.indexed_count,
                    summary.parse_failed_count,
                    summary.duration_ms
                );
                broadcast_job_status(&self.ws_sender, JOB_NAME, &summary.status, None);
                self.record_last_run(&summary);
                Ok(summary)
            }
            Err(e) => {
                tracing::error!("日终文件导入失败（{}）: {}", summary.url, e);
                summary.status = "failed".to_string();
                summary.error = Some(e.to_string());
                broadcast_job_status(&self.ws_sender, JOB_NAME, "failed", Some(e.to_string()));
                self.record_last_run(&summary);
                Err(e)
            }
        }
    }

    /// `lock` 随写入任务一起移交给阻塞线程，写完才释放
    async fn execute(
        &self,
        summary: &mut IngestRunSummary,
        lock: OwnedMutexGuard<()>,
    ) -> Result<(), StockServiceError> {
        self.set_state(IngestState::Fetching);
        let content = self.source.fetch_daily_file(&summary.url).await?;

        self.set_state(IngestState::Parsing);
        let parsed = parse_rows(&content)?;
        for e in &parsed.errors {
            tracing::warn!("跳过无效行: {}", e);
        }
        summary.total_rows = parsed.total;
        summary.parse_failed_count = parsed.errors.len();
        summary.parse_errors = parsed
            .errors
            .iter()
            .take(MAX_REPORTED_PARSE_ERRORS)
            .map(|e| e.to_string())
            .collect();
        tracing::info!(
            "解析完成，有效 {} 行，无效 {} 行",
            parsed.records.len(),
            parsed.errors.len()
        );

        self.set_state(IngestState::Writing);
        let record_store = self.record_store.clone();
        let prefix_index = self.prefix_index.clone();
        let entry_format = self.entry_format;
        let records = parsed.records;
        let outcome = tokio::task::spawn_blocking(move || {
            let _lock = lock;
            write_records(record_store.as_ref(), prefix_index.as_ref(), entry_format, records)
        })
        .await
        .map_err(|e| StockServiceError::StoreUnavailable(format!("写入任务异常退出: {e}")))?;

        summary.inserted_count = outcome.inserted;
        summary.skipped_count = outcome.skipped;
        summary.indexed_count = outcome.indexed;
        match outcome.error {
            Some(e) => {
                tracing::error!(
                    "写入中断，已新增 {} 条，已存在 {} 条，已索引 {} 条",
                    outcome.inserted,
                    outcome.skipped,
                    outcome.indexed
                );
                Err(e)
            }
            None => Ok(()),
        }
    }
}

/// 执行中的一次导入。future 被丢弃时把状态复位为 Idle 并记录失败
struct ActiveRun<'a> {
    orchestrator: &'a IngestOrchestrator,
    summary: IngestRunSummary,
    timer: Instant,
    finished: bool,
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let stage = self.orchestrator.state();
        let detail = format!("导入在 {:?} 阶段被取消", stage);
        tracing::error!("日终文件导入中断（{}）: {}", self.summary.url, detail);

        self.summary.status = "failed".to_string();
        self.summary.duration_ms = self.timer.elapsed().as_millis() as i64;
        self.summary.error = Some(detail.clone());
        self.orchestrator.set_state(IngestState::Idle);
        self.orchestrator.record_last_run(&self.summary);
        broadcast_job_status(&self.orchestrator.ws_sender, JOB_NAME, "failed", Some(detail));
    }
}

/// 逐行写入。记录存储与前缀索引各写各的，一边失败不回滚另一边；
/// 任一存储不可用时停止处理后续行
fn write_records(
    record_store: &dyn RecordStore,
    prefix_index: &dyn PrefixIndex,
    entry_format: EntryFormat,
    records: Vec<ParsedRecord>,
) -> WriteOutcome {
    let mut outcome = WriteOutcome::default();
    for ParsedRecord { line, record, entry } in records {
        let upserted = record_store.upsert_if_absent(&record);
        let indexed = prefix_index.add_entry(&entry.encode(entry_format));

        match upserted {
            Ok(UpsertOutcome::Inserted) => outcome.inserted += 1,
            Ok(UpsertOutcome::Skipped) => outcome.skipped += 1,
            Err(e) => {
                tracing::error!("第 {} 行（代码 {}）写入记录存储失败: {}", line, record.code, e);
                outcome.error.get_or_insert(e);
            }
        }
        match indexed {
            Ok(()) => outcome.indexed += 1,
            Err(e) => {
                tracing::error!("第 {} 行（代码 {}）写入前缀索引失败: {}", line, record.code, e);
                outcome.error.get_or_insert(e);
            }
        }

        if outcome.error.is_some() {
            break;
        }
    }
    outcome
}

/// 注册日终导入定时任务
pub fn create_ingest_job(
    scheduler: &IntervalScheduler,
    orchestrator: Arc<IngestOrchestrator>,
    config: &IngestConfig,
) {
    let job: ScheduledJob = Arc::new(move || -> BoxFuture<'static, ()> {
        let orchestrator = orchestrator.clone();
        Box::pin(async move {
            // 失败已在 run 内记录日志并广播
            let _ = orchestrator.run().await;
        })
    });
    scheduler.every(JOB_NAME, config.interval, config.first_run, job);
    tracing::info!(
        "日终导入定时任务已注册（首次 {}，间隔 {} 秒）",
        config.first_run.to_rfc3339(),
        config.interval.as_secs()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewStockRecord;
    use crate::repositories::{MemoryPrefixIndex, MemoryRecordStore};
    use crate::services::autocomplete::{AutocompleteItem, AutocompleteService};
    use crate::services::source_fetcher::extract_single_file;
    use crate::services::source_fetcher::tests::build_zip;
    use crate::utils::ws_broadcast::create_broadcast_channel;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    const HEADER: &str = "SC_CODE,SC_NAME,SC_GROUP,SC_TYPE,OPEN,HIGH,LOW,CLOSE,LAST,PREVCLOSE,NO_TRADES,NO_OF_SHRS,NET_TURNOV,TDCLOINDI";
    const PREFIX: &str = "http://bse.test/EQ";

    /// 返回固定压缩包的文件源，记录请求过的 URL
    struct StaticSource {
        archive: Vec<u8>,
        requested: StdMutex<Vec<String>>,
    }

    impl StaticSource {
        fn with_csv(csv: &str) -> Self {
            Self {
                archive: build_zip(&[("EQ.CSV", csv)]),
                requested: StdMutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DailyFileSource for StaticSource {
        async fn fetch_daily_file(&self, url: &str) -> Result<Vec<u8>, StockServiceError> {
            self.requested.lock().unwrap().push(url.to_string());
            extract_single_file(&self.archive)
        }
    }

    struct FailingSource;

    #[async_trait]
    impl DailyFileSource for FailingSource {
        async fn fetch_daily_file(&self, _url: &str) -> Result<Vec<u8>, StockServiceError> {
            Err(StockServiceError::FetchFailed("HTTP 状态 404".to_string()))
        }
    }

    /// 等待放行后才返回，用来构造执行中的导入
    struct GatedSource {
        gate: Arc<Notify>,
        inner: StaticSource,
    }

    #[async_trait]
    impl DailyFileSource for GatedSource {
        async fn fetch_daily_file(&self, url: &str) -> Result<Vec<u8>, StockServiceError> {
            self.gate.notified().await;
            self.inner.fetch_daily_file(url).await
        }
    }

    struct UnavailableRecordStore;

    impl RecordStore for UnavailableRecordStore {
        fn upsert_if_absent(&self, _record: &NewStockRecord) -> Result<UpsertOutcome, StockServiceError> {
            Err(StockServiceError::StoreUnavailable("connection refused".to_string()))
        }

        fn get_by_code(&self, _code: i64) -> Result<crate::models::StockRecord, StockServiceError> {
            Err(StockServiceError::StoreUnavailable("connection refused".to_string()))
        }

        fn top_by_high(&self, _limit: usize) -> Result<Vec<crate::models::StockRecord>, StockServiceError> {
            Err(StockServiceError::StoreUnavailable("connection refused".to_string()))
        }
    }

    struct Harness {
        orchestrator: Arc<IngestOrchestrator>,
        records: Arc<MemoryRecordStore>,
        index: Arc<MemoryPrefixIndex>,
        ws_sender: JobStatusSender,
    }

    fn harness(source: Arc<dyn DailyFileSource>) -> Harness {
        let records = Arc::new(MemoryRecordStore::new());
        let index = Arc::new(MemoryPrefixIndex::new());
        let ws_sender = create_broadcast_channel();
        let orchestrator = Arc::new(IngestOrchestrator::new(
            source,
            records.clone(),
            index.clone(),
            PREFIX,
            EntryFormat::V1,
            ws_sender.clone(),
        ));
        Harness {
            orchestrator,
            records,
            index,
            ws_sender,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 12, 28, 17, 29, 0).unwrap()
    }

    fn two_row_csv() -> String {
        format!(
            "{HEADER}\n\
             500001,ALPHA      ,A ,Q,10.0,12.0,9.5,11.0,11.0,10.5,12,1000,11000.00,\n\
             500002,ALPHALT    ,A ,Q,5.0,6.0,4.0,5.5,5.5,5.0,3,200,1100.00,\n"
        )
    }

    #[tokio::test]
    async fn test_ingest_stores_records_and_index_entries() {
        let source = Arc::new(StaticSource::with_csv(&two_row_csv()));
        let h = harness(source.clone());

        let summary = h.orchestrator.run_at(now()).await.unwrap();
        assert_eq!(summary.status, "success");
        assert_eq!(summary.total_rows, 2);
        assert_eq!(summary.inserted_count, 2);
        assert_eq!(summary.indexed_count, 2);
        assert_eq!(summary.file_date, NaiveDate::from_ymd_opt(2017, 12, 27).unwrap());
        assert_eq!(
            *source.requested.lock().unwrap(),
            vec!["http://bse.test/EQ271217_CSV.ZIP".to_string()]
        );

        let alpha = h.records.get_by_code(500001).unwrap();
        assert_eq!(alpha.name, "ALPHA");
        assert_eq!(alpha.open, 10.0);
        assert_eq!(alpha.high, 12.0);
        assert_eq!(alpha.low, 9.5);
        assert_eq!(alpha.close, 11.0);
        assert_eq!(alpha.prev_close, 10.5);
        assert_eq!(alpha.volume, 1000);

        let autocomplete = AutocompleteService::new(h.index.clone());
        assert_eq!(
            autocomplete.autocomplete("ALPHA").unwrap(),
            vec![
                AutocompleteItem {
                    id: 500001,
                    label: "ALPHA".to_string(),
                    value: "ALPHA".to_string(),
                },
                AutocompleteItem {
                    id: 500002,
                    label: "ALPHALT".to_string(),
                    value: "ALPHALT".to_string(),
                },
            ]
        );
        assert_eq!(h.orchestrator.state(), IngestState::Idle);
    }

    #[tokio::test]
    async fn test_invalid_row_is_skipped_and_later_rows_proceed() {
        let csv = format!(
            "{HEADER}\n\
             500001,ALPHA      ,A ,Q,10.0,12.0,9.5,11.0,11.0,10.5,12,1000,11000.00,\n\
             500003,BROKEN     ,A ,Q,n/a,12.0,9.5,11.0,11.0,10.5,12,1000,11000.00,\n\
             500002,ALPHALT    ,A ,Q,5.0,6.0,4.0,5.5,5.5,5.0,3,200,1100.00,\n"
        );
        let h = harness(Arc::new(StaticSource::with_csv(&csv)));

        let summary = h.orchestrator.run_at(now()).await.unwrap();
        assert_eq!(summary.status, "partial");
        assert_eq!(summary.total_rows, 3);
        assert_eq!(summary.parse_failed_count, 1);
        assert!(summary.parse_errors[0].contains("OPEN"));
        assert_eq!(summary.inserted_count, 2);

        assert!(h.records.get_by_code(500001).is_ok());
        assert!(h.records.get_by_code(500002).is_ok());
        assert!(matches!(
            h.records.get_by_code(500003),
            Err(StockServiceError::NotFound(500003))
        ));
        assert!(h.index.query_prefix("BROKEN").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rerun_keeps_records_but_duplicates_index_entries() {
        let h = harness(Arc::new(StaticSource::with_csv(&two_row_csv())));

        h.orchestrator.run_at(now()).await.unwrap();
        let first = h.records.get_by_code(500001).unwrap();
        let entries_after_first = h.index.query_prefix("ALPHA").unwrap();

        let summary = h.orchestrator.run_at(now()).await.unwrap();
        assert_eq!(summary.inserted_count, 0);
        assert_eq!(summary.skipped_count, 2);
        assert_eq!(summary.indexed_count, 2);

        assert_eq!(h.records.get_by_code(500001).unwrap(), first);
        assert_eq!(h.records.top_by_high(10).unwrap().len(), 2);

        let entries = h.index.query_prefix("ALPHA").unwrap();
        assert_eq!(entries.len(), entries_after_first.len() * 2);
        assert_eq!(entries[0], entries[1]);
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_and_broadcasts() {
        let h = harness(Arc::new(FailingSource));
        let mut rx = h.ws_sender.subscribe();

        let err = h.orchestrator.run_at(now()).await.unwrap_err();
        assert!(matches!(err, StockServiceError::FetchFailed(_)));
        assert_eq!(h.orchestrator.state(), IngestState::Idle);

        let last = h.orchestrator.last_run().unwrap();
        assert_eq!(last.status, "failed");
        assert!(last.error.unwrap().contains("404"));

        assert_eq!(rx.recv().await.unwrap().status, "running");
        let failed = rx.recv().await.unwrap();
        assert_eq!(failed.job_name, JOB_NAME);
        assert_eq!(failed.status, "failed");
        assert!(failed.detail.is_some());
    }

    #[tokio::test]
    async fn test_malformed_archive_writes_nothing() {
        let csv = two_row_csv();
        let source = StaticSource {
            archive: build_zip(&[("a.csv", csv.as_str()), ("b.csv", csv.as_str())]),
            requested: StdMutex::new(Vec::new()),
        };
        let h = harness(Arc::new(source));

        let err = h.orchestrator.run_at(now()).await.unwrap_err();
        assert!(matches!(err, StockServiceError::MalformedArchive(_)));
        assert!(h.index.query_prefix("").unwrap().is_empty());
        assert!(h.records.top_by_high(10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_does_not_roll_back_index() {
        let index = Arc::new(MemoryPrefixIndex::new());
        let orchestrator = IngestOrchestrator::new(
            Arc::new(StaticSource::with_csv(&two_row_csv())),
            Arc::new(UnavailableRecordStore),
            index.clone(),
            PREFIX,
            EntryFormat::V1,
            create_broadcast_channel(),
        );

        let err = orchestrator.run_at(now()).await.unwrap_err();
        assert!(matches!(err, StockServiceError::StoreUnavailable(_)));
        // 第一行的索引写入保留，后续行不再处理
        assert_eq!(
            index.query_prefix("").unwrap(),
            vec!["ALPHA:500001:10.0:12.09.5:11.0".to_string()]
        );
        assert_eq!(orchestrator.last_run().unwrap().status, "failed");
    }

    #[tokio::test]
    async fn test_concurrent_trigger_is_rejected() {
        let gate = Arc::new(Notify::new());
        let source = GatedSource {
            gate: gate.clone(),
            inner: StaticSource::with_csv(&two_row_csv()),
        };
        let h = harness(Arc::new(source));

        let running = {
            let orchestrator = h.orchestrator.clone();
            tokio::spawn(async move { orchestrator.run_at(now()).await })
        };
        while h.orchestrator.state() != IngestState::Fetching {
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            h.orchestrator.run_at(now()).await,
            Err(StockServiceError::IngestInProgress)
        ));

        gate.notify_one();
        let summary = running.await.unwrap().unwrap();
        assert_eq!(summary.inserted_count, 2);
    }

    #[tokio::test]
    async fn test_cancelled_run_returns_to_idle_and_is_reported() {
        let gate = Arc::new(Notify::new());
        let source = GatedSource {
            gate: gate.clone(),
            inner: StaticSource::with_csv(&two_row_csv()),
        };
        let h = harness(Arc::new(source));
        let mut rx = h.ws_sender.subscribe();

        let running = {
            let orchestrator = h.orchestrator.clone();
            tokio::spawn(async move { orchestrator.run_at(now()).await })
        };
        while h.orchestrator.state() != IngestState::Fetching {
            tokio::task::yield_now().await;
        }
        running.abort();
        assert!(running.await.unwrap_err().is_cancelled());

        assert_eq!(h.orchestrator.state(), IngestState::Idle);
        let last = h.orchestrator.last_run().unwrap();
        assert_eq!(last.status, "failed");
        assert!(last.error.unwrap().contains("Fetching"));
        assert_eq!(rx.recv().await.unwrap().status, "running");
        assert_eq!(rx.recv().await.unwrap().status, "failed");

        // 锁已释放，下一次导入可以正常执行
        gate.notify_one();
        let summary = h.orchestrator.run_at(now()).await.unwrap();
        assert_eq!(summary.inserted_count, 2);
    }

    #[tokio::test]
    async fn test_spawned_run_survives_dropped_caller() {
        let gate = Arc::new(Notify::new());
        let source = GatedSource {
            gate: gate.clone(),
            inner: StaticSource::with_csv(&two_row_csv()),
        };
        let h = harness(Arc::new(source));

        let caller = {
            let orchestrator = h.orchestrator.clone();
            tokio::spawn(async move { orchestrator.spawn_run().await })
        };
        while h.orchestrator.state() != IngestState::Fetching {
            tokio::task::yield_now().await;
        }
        caller.abort();
        let _ = caller.await;

        // 调用方已取消，导入仍在执行
        assert_eq!(h.orchestrator.state(), IngestState::Fetching);
        assert!(matches!(
            h.orchestrator.run_at(now()).await,
            Err(StockServiceError::IngestInProgress)
        ));

        gate.notify_one();
        while h.orchestrator.last_run().is_none() {
            tokio::task::yield_now().await;
        }
        assert_eq!(h.orchestrator.last_run().unwrap().status, "success");
        assert_eq!(h.orchestrator.state(), IngestState::Idle);
        assert_eq!(h.records.top_by_high(10).unwrap().len(), 2);
    }
}
