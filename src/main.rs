mod api_models;
mod app;
mod handler;
mod models;
mod repositories;
mod routes;
mod scheduler;
mod schema;
mod services;
mod utils;

use std::sync::Arc;

use anyhow::Context;

use crate::app::AppState;
use crate::scheduler::ingest_job::{create_ingest_job, IngestOrchestrator};
use crate::scheduler::IntervalScheduler;
use crate::services::autocomplete::AutocompleteService;
use crate::services::source_fetcher::HttpDailyFileSource;
use crate::utils::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    utils::logging::init_logging();

    let cfg = AppConfig::from_env()?;
    let (record_store, prefix_index) = app::build_stores(&cfg.store)?;

    let client = utils::http_client::create_bhav_client(cfg.ingest.fetch_timeout)
        .context("Failed to build HTTP client")?;
    let ws_sender = utils::ws_broadcast::create_broadcast_channel();
    let ingestor = Arc::new(IngestOrchestrator::new(
        Arc::new(HttpDailyFileSource::new(client)),
        record_store.clone(),
        prefix_index.clone(),
        cfg.ingest.url_prefix.clone(),
        cfg.ingest.entry_format,
        ws_sender.clone(),
    ));

    let mut scheduler = IntervalScheduler::new()
        .await
        .context("Failed to create scheduler")?;
    create_ingest_job(&scheduler, ingestor.clone(), &cfg.ingest);
    scheduler.start().await.context("Failed to start scheduler")?;
    tracing::info!("定时任务调度器已启动");

    let state = AppState {
        record_store,
        autocomplete: AutocompleteService::new(prefix_index),
        ingestor,
        ws_sender,
    };
    let app = app::build_app(state, &cfg.server.allowed_origins);

    let listener = tokio::net::TcpListener::bind(cfg.server.addr)
        .await
        .with_context(|| format!("bind {} failed", cfg.server.addr))?;
    tracing::info!("Axum listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")?;

    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!("调度器关闭失败: {}", e);
    }
    tracing::info!("服务已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("监听退出信号失败: {}", e);
    }
    tracing::info!("收到退出信号，开始关闭服务");
}
