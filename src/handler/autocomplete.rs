use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::api_models::AutocompleteQuery;
use crate::app::AppState;
use crate::handler::error::{AppError, INVALID_TERM_MESSAGE};
use crate::services::autocomplete::AutocompleteItem;

pub async fn autocomplete_by_path(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> Result<Json<Vec<AutocompleteItem>>, AppError> {
    Ok(Json(state.autocomplete.autocomplete(&term)?))
}

/// 兼容 jQuery UI autocomplete 的 `?term=` 参数
pub async fn autocomplete_by_query(
    State(state): State<AppState>,
    Query(q): Query<AutocompleteQuery>,
) -> Result<Json<Vec<AutocompleteItem>>, AppError> {
    let term = q
        .term
        .ok_or_else(|| AppError::BadRequest(INVALID_TERM_MESSAGE.to_string()))?;
    Ok(Json(state.autocomplete.autocomplete(&term)?))
}
