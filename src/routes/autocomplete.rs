use axum::{routing::get, Router};

use crate::app::AppState;
use crate::handler::autocomplete::{autocomplete_by_path, autocomplete_by_query};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/autocomplete", get(autocomplete_by_query))
        .route("/autocomplete/:term", get(autocomplete_by_path))
}
