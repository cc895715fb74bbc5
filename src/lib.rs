pub mod client;
pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::database::{PgProductStore, PgUserStore, ProductStore, UserStore};
use crate::error::{Error, Result};
use crate::services::{
    auth_service::AuthService,
    identity_provider::{FirebaseIdentityProvider, IdentityProvider},
    image_host::{CloudinaryImageHost, ImageHost},
    product_service::ProductService,
    session::SessionSigner,
};
use reqwest::Client;
use sqlx::PgPool;

pub const HTTP_CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub product_service: ProductService,
    pub sessions: SessionSigner,
    pub max_image_bytes: usize,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(HTTP_CLIENT_TIMEOUT)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let identity = FirebaseIdentityProvider::new(
            http_client.clone(),
            config.firebase_project_id.clone(),
            config.firebase_api_key.clone(),
        );
        let images = CloudinaryImageHost::new(
            http_client,
            config.cloudinary_cloud_name.clone(),
            config.cloudinary_api_key.clone(),
            config.cloudinary_api_secret.clone(),
            config.cloudinary_folder.clone(),
        );

        Ok(Self::from_parts(
            Arc::new(identity),
            Arc::new(images),
            Arc::new(PgUserStore::new(pool.clone())),
            Arc::new(PgProductStore::new(pool)),
            SessionSigner::new(&config.jwt_secret),
            config.max_image_bytes,
        ))
    }

    /// Wires the state from arbitrary collaborators, e.g. in-memory stores.
    pub fn from_parts(
        identity: Arc<dyn IdentityProvider>,
        images: Arc<dyn ImageHost>,
        users: Arc<dyn UserStore>,
        products: Arc<dyn ProductStore>,
        sessions: SessionSigner,
        max_image_bytes: usize,
    ) -> Self {
        Self {
            auth_service: AuthService::new(identity, users, sessions.clone()),
            product_service: ProductService::new(products, images),
            sessions,
            max_image_bytes,
        }
    }
}
