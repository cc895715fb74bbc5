use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;

use crate::error::{Error, Result};

/// Admits the storefront client origin only, with credentials.
pub fn storefront_cors(client_url: &str) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(client_url.trim_end_matches('/'))
        .map_err(|e| Error::Config(format!("Invalid CLIENT_URL: {}", e)))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true))
}
