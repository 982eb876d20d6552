use axum::{routing::{get, post}, Router};

use crate::app::AppState;
use crate::handler::scheduler::{get_ingest_status, trigger_ingest};
use crate::handler::ws_handler;

pub fn router() -> Router<AppState> {
    Router::new()
        // 手动触发接口
        .route("/trigger-ingest", post(trigger_ingest))
        .route("/status", get(get_ingest_status))
        // WebSocket 路由
        .route("/ws", get(ws_handler::ws_handler))
}
