use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::RunQueryDsl;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};
use tracing::Level;

use crate::repositories::{
    MemoryPrefixIndex, MemoryRecordStore, PgPrefixIndex, PgRecordStore, PrefixIndex, RecordStore,
};
use crate::routes;
use crate::scheduler::ingest_job::IngestOrchestrator;
use crate::services::autocomplete::AutocompleteService;
use crate::utils::config::{StorageBackend, StoreConfig};
use crate::utils::middleware;
use crate::utils::ws_broadcast::JobStatusSender;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct AppState {
    pub record_store: Arc<dyn RecordStore>,
    pub autocomplete: AutocompleteService,
    pub ingestor: Arc<IngestOrchestrator>,
    pub ws_sender: JobStatusSender,
}

/// 每个连接取出时设置 statement_timeout，单条查询超时返回错误
#[derive(Debug, Clone, Copy)]
struct StatementTimeout(Duration);

fn statement_timeout_sql(timeout: Duration) -> String {
    format!("SET statement_timeout = {}", timeout.as_millis().max(1))
}

impl CustomizeConnection<PgConnection, diesel::r2d2::Error> for StatementTimeout {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), diesel::r2d2::Error> {
        diesel::sql_query(statement_timeout_sql(self.0))
            .execute(conn)
            .map(|_| ())
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn build_pool(cfg: &StoreConfig) -> anyhow::Result<DbPool> {
    let database_url = cfg
        .database_url
        .as_deref()
        .context("DATABASE_URL not set")?;
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .max_size(cfg.pool_size)
        .connection_timeout(cfg.timeout)
        .connection_customizer(Box::new(StatementTimeout(cfg.timeout)))
        .build(manager)
        .context("Failed to create DB pool")
}

/// 按配置选择 Postgres 或进程内存储，两者共用同一个连接池
pub fn build_stores(cfg: &StoreConfig) -> anyhow::Result<(Arc<dyn RecordStore>, Arc<dyn PrefixIndex>)> {
    match cfg.backend {
        StorageBackend::Postgres => {
            let pool = build_pool(cfg)?;
            tracing::info!("使用 Postgres 存储（连接池大小 {}）", cfg.pool_size);
            Ok((
                Arc::new(PgRecordStore::new(pool.clone())),
                Arc::new(PgPrefixIndex::new(pool)),
            ))
        }
        StorageBackend::Memory => {
            tracing::warn!("使用进程内存储，重启后数据丢失");
            Ok((
                Arc::new(MemoryRecordStore::new()),
                Arc::new(MemoryPrefixIndex::new()),
            ))
        }
    }
}

pub fn build_app(state: AppState, allowed_origins: &[String]) -> Router {
    routes::build_routes()
        .with_state(state)
        .layer(middleware::cors_layer(allowed_origins))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
