//! In-process stores backing tests and local demos.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{ProductStore, UserStore};
use crate::error::{Error, Result};
use crate::models::product::{NewProduct, Product};
use crate::models::role::{Role, RoleSet};
use crate::models::user::{LoginIdentity, User};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| Error::Internal("in-memory store lock poisoned".to_string()))
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `role` to an existing user. Returns false when the uid is unknown.
    pub fn grant(&self, uid: &str, role: Role) -> Result<bool> {
        let mut users = lock(&self.users)?;
        match users.get_mut(uid) {
            Some(user) => {
                user.roles = user.roles.iter().chain([role]).collect();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn len(&self) -> Result<usize> {
        Ok(lock(&self.users)?.len())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn sync_login(&self, identity: &LoginIdentity) -> Result<User> {
        let now = Utc::now();
        let mut users = lock(&self.users)?;
        let user = users
            .entry(identity.uid.clone())
            .and_modify(|user| {
                user.email = identity.email.clone();
                user.name = identity.name.clone();
                user.last_login_at = now;
            })
            .or_insert_with(|| User {
                uid: identity.uid.clone(),
                email: identity.email.clone(),
                name: identity.name.clone(),
                roles: RoleSet::initial(),
                created_at: now,
                last_login_at: now,
            });
        Ok(user.clone())
    }

    async fn find(&self, uid: &str) -> Result<Option<User>> {
        Ok(lock(&self.users)?.get(uid).cloned())
    }
}

#[derive(Default)]
pub struct MemoryProductStore {
    products: Mutex<Vec<Product>>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize> {
        Ok(lock(&self.products)?.len())
    }

    fn build(product: NewProduct) -> Product {
        let created_at = product.created_at.unwrap_or_else(Utc::now);
        Product {
            id: Uuid::new_v4(),
            name: product.name,
            description: product.description,
            price: product.price,
            category: product.category,
            stock: product.stock,
            image_url: product.image.url,
            image_id: product.image.public_id,
            created_at,
            updated_at: created_at,
        }
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn insert(&self, product: NewProduct) -> Result<Product> {
        let created = Self::build(product);
        lock(&self.products)?.push(created.clone());
        Ok(created)
    }

    async fn insert_many(&self, products: Vec<NewProduct>) -> Result<u64> {
        let built: Vec<Product> = products.into_iter().map(Self::build).collect();
        let count = built.len() as u64;
        lock(&self.products)?.extend(built);
        Ok(count)
    }

    async fn list_recent(&self) -> Result<Vec<Product>> {
        let mut items: Vec<Product> = lock(&self.products)?.iter().rev().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(lock(&self.products)?.iter().find(|p| p.id == id).cloned())
    }
}
