use bytes::Bytes;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::product::{Product, DEFAULT_CATEGORY};
use crate::services::image_host::ImageUpload;
use crate::utils::price::parse_price;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub image_url: String,
    pub image_id: String,
    pub category: String,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(value: Product) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            price: value.price,
            image_url: value.image_url,
            image_id: value.image_id,
            category: value.category,
            stock: value.stock,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// Multipart body of `POST /api/products`, documented for the API schema.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct CreateProductForm {
    pub name: String,
    pub description: String,
    /// `199.90` or `199,90`
    pub price: String,
    pub category: Option<String>,
    pub stock: Option<i32>,
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

/// Raw multipart fields as they arrive, before any checking.
#[derive(Debug, Default)]
pub struct ProductFormFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub category: Option<String>,
    pub stock: Option<String>,
    pub image: Option<ImageUpload>,
}

/// A product creation request that passed every boundary check.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub stock: i32,
    pub image: ImageUpload,
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::BadRequest(format!("Field '{}' is required", field)))
}

impl ProductFormFields {
    pub fn into_draft(self, max_image_bytes: usize) -> Result<ProductDraft> {
        let name = required(self.name, "name")?;
        let description = required(self.description, "description")?;
        let price = parse_price(&required(self.price, "price")?)
            .map_err(|e| Error::BadRequest(format!("Invalid price: {}", e)))?;

        let stock = match self.stock.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw
                .parse::<i32>()
                .ok()
                .filter(|n| *n >= 0)
                .ok_or_else(|| {
                    Error::BadRequest("Stock must be a non-negative integer".to_string())
                })?,
            None => 0,
        };

        let category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        let image = self
            .image
            .ok_or_else(|| Error::BadRequest("Product image is required".to_string()))?;
        if !image.content_type.starts_with("image/") {
            return Err(Error::BadRequest(format!(
                "Unsupported image type: {}",
                image.content_type
            )));
        }
        if image.data.is_empty() {
            return Err(Error::BadRequest("Product image is empty".to_string()));
        }
        if image.data.len() > max_image_bytes {
            return Err(Error::BadRequest(format!(
                "Image exceeds the {} byte limit",
                max_image_bytes
            )));
        }

        Ok(ProductDraft {
            name,
            description,
            price,
            category,
            stock,
            image,
        })
    }
}

pub fn image_upload(file_name: Option<&str>, content_type: Option<&str>, data: Bytes) -> ImageUpload {
    ImageUpload {
        file_name: file_name.unwrap_or("upload").to_string(),
        content_type: content_type.unwrap_or("application/octet-stream").to_string(),
        data,
    }
}
