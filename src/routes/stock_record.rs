use axum::{routing::get, Router};

use crate::app::AppState;
use crate::handler::stock_record::{get_stock_record, list_top_stocks};

pub fn router() -> Router<AppState> {
    Router::new()
        // 静态路径先于 /:code 注册
        .route("/stocks/top", get(list_top_stocks))
        .route("/stocks/:code", get(get_stock_record))
}
