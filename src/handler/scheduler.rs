use axum::{extract::State, Json};

use crate::api_models::{IngestStatusResponse, TriggerIngestResponse};
use crate::app::AppState;
use crate::handler::error::AppError;
use crate::scheduler::ingest_job::JOB_NAME;

/// 手动触发日终导入任务
pub async fn trigger_ingest(
    State(state): State<AppState>,
) -> Result<Json<TriggerIngestResponse>, AppError> {
    tracing::info!("收到手动触发日终导入任务的请求");

    // 导入在独立任务中执行，客户端断开不会中断导入
    let summary = state.ingestor.clone().spawn_run().await?;
    Ok(Json(TriggerIngestResponse {
        success: summary.status == "success",
        message: format!(
            "日终导入完成，总计 {} 行，新增 {} 条，已存在 {} 条，解析失败 {} 行",
            summary.total_rows, summary.inserted_count, summary.skipped_count, summary.parse_failed_count
        ),
        summary,
    }))
}

pub async fn get_ingest_status(State(state): State<AppState>) -> Json<IngestStatusResponse> {
    Json(IngestStatusResponse {
        job_name: JOB_NAME,
        state: state.ingestor.state(),
        last_run: state.ingestor.last_run(),
    })
}
