use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
#[axum::debug_handler]
pub async fn health() -> impl IntoResponse {
    let body = json!({
        "status": "ok",
    });
    (StatusCode::OK, Json(body))
}

#[utoipa::path(
    get,
    path = "/api/status",
    responses((status = 200, description = "API is ready to serve the storefront"))
)]
#[axum::debug_handler]
pub async fn status() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "status": "API is ready" })),
    )
}
