//! Import of the legacy product export (`clustered-population.json`).

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::database::ProductStore;
use crate::error::{Error, Result};
use crate::models::product::{ImageRef, NewProduct, DEFAULT_CATEGORY};
use crate::utils::price::parse_price;

pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/600x400/cccccc/ffffff?text=Sem+Imagem";

/// One entry of the legacy export. Field names follow the export file.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyProduct {
    #[serde(default)]
    pub id: Value,
    pub produto: String,
    #[serde(default)]
    pub descricao: String,
    pub preco: String,
    #[serde(default)]
    pub categoria: Option<String>,
    #[serde(default)]
    pub estoque: Option<i32>,
    #[serde(default)]
    pub imagens: Vec<String>,
}

fn legacy_id(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        Value::Null => "unknown".to_string(),
        other => other.to_string(),
    }
}

impl LegacyProduct {
    pub fn into_new_product(self, now: DateTime<Utc>) -> Result<NewProduct> {
        let id = legacy_id(&self.id);
        let price = parse_price(&self.preco)
            .map_err(|e| Error::BadRequest(format!("Entry {}: invalid price: {}", id, e)))?;
        let stock = self.estoque.unwrap_or(0);
        if stock < 0 {
            return Err(Error::BadRequest(format!("Entry {}: negative stock", id)));
        }
        let name = self.produto.trim().to_string();
        if name.is_empty() {
            return Err(Error::BadRequest(format!("Entry {}: product name is empty", id)));
        }
        let description = match self.descricao.trim() {
            "" => name.clone(),
            text => text.to_string(),
        };

        Ok(NewProduct {
            name,
            description,
            price,
            category: self
                .categoria
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            stock,
            image: ImageRef {
                url: self
                    .imagens
                    .into_iter()
                    .find(|url| !url.trim().is_empty())
                    .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
                public_id: format!("seed-data-{}", id),
            },
            created_at: Some(now),
        })
    }
}

/// Converts every entry first so a single bad entry aborts before any write.
pub fn convert(entries: Vec<LegacyProduct>, now: DateTime<Utc>) -> Result<Vec<NewProduct>> {
    entries
        .into_iter()
        .map(|entry| entry.into_new_product(now))
        .collect()
}

pub async fn seed(store: &dyn ProductStore, raw_json: &str) -> Result<u64> {
    let entries: Vec<LegacyProduct> = serde_json::from_str(raw_json)?;
    tracing::info!(count = entries.len(), "Loaded legacy products");
    let products = convert(entries, Utc::now())?;
    let inserted = store.insert_many(products).await?;
    tracing::info!(inserted, "Seeded products");
    Ok(inserted)
}
