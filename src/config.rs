use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

pub const DEFAULT_IMAGE_FOLDER: &str = "nossa-tenda-produtos";
pub const DEFAULT_CLIENT_URL: &str = "http://localhost:5173";
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub firebase_project_id: String,
    pub firebase_api_key: String,
    pub cloudinary_cloud_name: String,
    pub cloudinary_api_key: String,
    pub cloudinary_api_secret: String,
    pub cloudinary_folder: String,
    pub client_url: String,
    pub max_image_bytes: usize,
    pub log_format: LogFormat,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let jwt_secret = get_env("JWT_SECRET")?;
        if jwt_secret.len() < 16 {
            return Err(Error::Config(
                "JWT_SECRET must be at least 16 characters".to_string(),
            ));
        }

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret,
            firebase_project_id: get_env("FIREBASE_PROJECT_ID")?,
            firebase_api_key: get_env("FIREBASE_API_KEY")?,
            cloudinary_cloud_name: get_env("CLOUDINARY_CLOUD_NAME")?,
            cloudinary_api_key: get_env("CLOUDINARY_API_KEY")?,
            cloudinary_api_secret: get_env("CLOUDINARY_API_SECRET")?,
            cloudinary_folder: env::var("CLOUDINARY_FOLDER")
                .unwrap_or_else(|_| DEFAULT_IMAGE_FOLDER.to_string()),
            client_url: env::var("CLIENT_URL").unwrap_or_else(|_| DEFAULT_CLIENT_URL.to_string()),
            max_image_bytes: get_env_parse_or("MAX_IMAGE_BYTES", DEFAULT_MAX_IMAGE_BYTES)?,
            log_format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}
