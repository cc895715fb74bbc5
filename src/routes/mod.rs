pub mod auth;
pub mod health;
pub mod openapi;
pub mod products;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::middleware::auth::{require_admin, require_session};
use crate::AppState;

/// Multipart overhead allowed on top of the image itself.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let public_api = Router::new()
        .route("/health", get(health::health))
        .route("/api/status", get(health::status))
        .route("/api/openapi.json", get(openapi::openapi_json))
        .route("/api/auth/google-signin", post(auth::google_sign_in))
        .route(
            "/api/auth/email-password-signin",
            post(auth::email_password_sign_in),
        )
        .route(
            "/api/auth/email-password-signup",
            post(auth::email_password_sign_up),
        )
        .route("/api/products", get(products::list_products))
        .route("/api/products/:id", get(products::get_product))
        .route("/api/catalog", get(products::catalog));

    let session_api = Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    let admin_api = Router::new()
        .route("/api/auth/protected", get(auth::protected))
        .route("/api/products", post(products::create_product))
        .route_layer(from_fn_with_state(state.clone(), require_admin))
        .layer(DefaultBodyLimit::max(
            state.max_image_bytes + FORM_OVERHEAD_BYTES,
        ));

    public_api
        .merge(session_api)
        .merge(admin_api)
        .with_state(state)
}
