use std::sync::Arc;
use uuid::Uuid;

use crate::database::ProductStore;
use crate::dto::product_dto::ProductDraft;
use crate::error::{Error, Result};
use crate::models::product::{NewProduct, Product};
use crate::services::catalog::{derive_page, CatalogPage, CatalogQuery};
use crate::services::image_host::ImageHost;

#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductStore>,
    images: Arc<dyn ImageHost>,
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductStore>, images: Arc<dyn ImageHost>) -> Self {
        Self { products, images }
    }

    /// Uploads the image, then writes the record. A failed upload leaves
    /// the store untouched.
    pub async fn create(&self, draft: ProductDraft) -> Result<Product> {
        let image = self.images.upload(draft.image).await?;

        let new_product = NewProduct {
            name: draft.name,
            description: draft.description,
            price: draft.price,
            category: draft.category,
            stock: draft.stock,
            image: image.clone(),
            created_at: None,
        };

        match self.products.insert(new_product).await {
            Ok(product) => {
                tracing::info!(id = %product.id, name = %product.name, "Product created");
                Ok(product)
            }
            Err(e) => {
                tracing::error!(
                    public_id = %image.public_id,
                    "Product insert failed after image upload; image left orphaned: {}",
                    e
                );
                Err(e)
            }
        }
    }

    pub async fn list(&self) -> Result<Vec<Product>> {
        self.products.list_recent().await
    }

    pub async fn get(&self, id: Uuid) -> Result<Product> {
        self.products
            .find(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Product {} not found", id)))
    }

    pub async fn catalog(&self, query: &CatalogQuery) -> Result<CatalogPage> {
        let products = self.products.list_recent().await?;
        Ok(derive_page(&products, query))
    }
}
