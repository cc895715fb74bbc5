use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::storage::KeyValueStore;
use crate::dto::product_dto::ProductResponse;
use crate::error::Result;
use crate::utils::price::format_brl;

pub const CART_KEY: &str = "shoppingCart";
/// Upper bound for a single line's quantity.
pub const MAX_QUANTITY: u32 = 999;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image_url: String,
    pub quantity: u32,
}

/// Shopping cart persisted under [`CART_KEY`] after every change.
pub struct Cart {
    store: Arc<dyn KeyValueStore>,
    items: Vec<CartItem>,
}

impl Cart {
    /// A stored cart that no longer parses is discarded.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let items = match store.get(CART_KEY)? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("Discarding unreadable stored cart: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        };
        Ok(Self { store, items })
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn add(&mut self, product: &ProductResponse) -> Result<()> {
        match self.items.iter_mut().find(|item| item.id == product.id) {
            Some(item) => item.quantity = item.quantity.saturating_add(1).min(MAX_QUANTITY),
            None => self.items.push(CartItem {
                id: product.id,
                name: product.name.clone(),
                price: product.price,
                image_url: product.image_url.clone(),
                quantity: 1,
            }),
        }
        self.persist()
    }

    pub fn remove(&mut self, product_id: Uuid) -> Result<()> {
        self.items.retain(|item| item.id != product_id);
        self.persist()
    }

    /// Zero or a negative quantity removes the item. Larger values are
    /// capped at [`MAX_QUANTITY`].
    pub fn update_quantity(&mut self, product_id: Uuid, quantity: i64) -> Result<()> {
        if quantity <= 0 {
            return self.remove(product_id);
        }
        let quantity = u32::try_from(quantity)
            .unwrap_or(MAX_QUANTITY)
            .min(MAX_QUANTITY);
        if let Some(item) = self.items.iter_mut().find(|item| item.id == product_id) {
            item.quantity = quantity;
        }
        self.persist()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.items.clear();
        self.persist()
    }

    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| item.price * Decimal::from(item.quantity))
            .sum()
    }

    pub fn formatted_total(&self) -> String {
        format_brl(self.total())
    }

    fn persist(&self) -> Result<()> {
        self.store.set(CART_KEY, &serde_json::to_string(&self.items)?)
    }
}
