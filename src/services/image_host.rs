use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::models::product::ImageRef;

const CLOUDINARY_API: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> Result<ImageRef>;
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Clone)]
pub struct CloudinaryImageHost {
    client: Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: String,
    base_url: String,
}

impl CloudinaryImageHost {
    pub fn new(
        client: Client,
        cloud_name: String,
        api_key: String,
        api_secret: String,
        folder: String,
    ) -> Self {
        Self {
            client,
            cloud_name,
            api_key,
            api_secret,
            folder,
            base_url: CLOUDINARY_API.to_string(),
        }
    }

    /// Text fields of a signed upload. `signature_algorithm` tells the
    /// host the digest is SHA-256 and is not itself signed.
    fn upload_fields(&self, timestamp: String) -> Vec<(&'static str, String)> {
        let signature = sign_params(
            &[("folder", self.folder.as_str()), ("timestamp", timestamp.as_str())],
            &self.api_secret,
        );
        vec![
            ("api_key", self.api_key.clone()),
            ("timestamp", timestamp),
            ("folder", self.folder.clone()),
            ("signature", signature),
            ("signature_algorithm", "sha256".to_string()),
        ]
    }
}

/// Signed-upload signature: parameters sorted by name, joined as a query
/// string, with the API secret appended, then SHA-256 hex encoded.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ImageHost for CloudinaryImageHost {
    async fn upload(&self, image: ImageUpload) -> Result<ImageRef> {
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let size = image.data.len();
        let part = Part::bytes(image.data.to_vec())
            .file_name(image.file_name)
            .mime_str(&image.content_type)
            .map_err(|e| Error::BadRequest(format!("Invalid image content type: {}", e)))?;
        let form = self
            .upload_fields(timestamp)
            .into_iter()
            .fold(Form::new().part("file", part), |form, (name, value)| {
                form.text(name, value)
            });

        let url = format!("{}/{}/image/upload", self.base_url, self.cloud_name);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Image upload request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "Image host returned {}: {}",
                status, body
            )));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Malformed image host response: {}", e)))?;
        tracing::info!(public_id = %uploaded.public_id, bytes = size, "Uploaded product image");

        Ok(ImageRef {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }
}
