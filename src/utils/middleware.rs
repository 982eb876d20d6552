use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

/// 未配置 ALLOWED_ORIGINS 时允许任意来源，接口只读且不带凭证
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("忽略无效的 CORS 来源 {:?}: {}", o, e);
                None
            }
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}
