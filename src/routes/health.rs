use axum::http::StatusCode;

pub async fn health_check() -> (StatusCode, &'static str) {
    tracing::debug!("health check");
    (StatusCode::OK, "OK")
}
