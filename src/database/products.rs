use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::product::{NewProduct, Product};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert(&self, product: NewProduct) -> Result<Product>;

    /// Inserts every product or none of them.
    async fn insert_many(&self, products: Vec<NewProduct>) -> Result<u64>;

    /// Whole collection, newest first.
    async fn list_recent(&self) -> Result<Vec<Product>>;

    async fn find(&self, id: Uuid) -> Result<Option<Product>>;
}

const INSERT_PRODUCT: &str = r#"
    INSERT INTO products (
        id, name, description, price, category, stock, image_url, image_id,
        created_at, updated_at
    ) VALUES (
        $1, $2, $3, $4, $5, $6, $7, $8,
        COALESCE($9, NOW()), COALESCE($9, NOW())
    )
    RETURNING
        id, name, description, price, category, stock, image_url, image_id,
        created_at, updated_at
"#;

#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn insert_query(product: &NewProduct) -> sqlx::query::QueryAs<'_, sqlx::Postgres, Product, sqlx::postgres::PgArguments> {
    sqlx::query_as::<_, Product>(INSERT_PRODUCT)
        .bind(Uuid::new_v4())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.category)
        .bind(product.stock)
        .bind(&product.image.url)
        .bind(&product.image.public_id)
        .bind(product.created_at)
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn insert(&self, product: NewProduct) -> Result<Product> {
        let created = insert_query(&product).fetch_one(&self.pool).await?;
        Ok(created)
    }

    async fn insert_many(&self, products: Vec<NewProduct>) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;
        for product in &products {
            insert_query(product).fetch_one(&mut *tx).await?;
            inserted += 1;
        }
        tx.commit().await?;
        Ok(inserted)
    }

    async fn list_recent(&self) -> Result<Vec<Product>> {
        let items = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, category, stock, image_url, image_id,
                   created_at, updated_at
            FROM products
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, category, stock, image_url, image_id,
                   created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }
}
