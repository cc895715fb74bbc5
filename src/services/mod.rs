pub mod auth_service;
pub mod catalog;
pub mod identity_provider;
pub mod image_host;
pub mod product_service;
pub mod seed;
pub mod session;
