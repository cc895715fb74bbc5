use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};

use super::storage::KeyValueStore;
use crate::error::Result;
use crate::services::session::{expiry_of, SessionClaims};

pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Client-held session token, persisted under [`AUTH_TOKEN_KEY`].
pub struct ClientSession {
    store: Arc<dyn KeyValueStore>,
    token: Option<String>,
}

impl ClientSession {
    /// Restores whatever token a previous run left behind.
    pub fn hydrate(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let token = store.get(AUTH_TOKEN_KEY)?.filter(|t| !t.is_empty());
        Ok(Self { store, token })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn login(&mut self, token: &str) -> Result<()> {
        self.store.set(AUTH_TOKEN_KEY, token)?;
        self.token = Some(token.to_string());
        Ok(())
    }

    pub fn logout(&mut self) -> Result<()> {
        self.store.remove(AUTH_TOKEN_KEY)?;
        self.token = None;
        Ok(())
    }

    /// Reads the token payload for display. The signature is NOT checked;
    /// only the server's verification grants access.
    pub fn identity(&self) -> Option<SessionClaims> {
        let payload = self.token.as_deref()?.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.identity().as_ref().and_then(expiry_of) {
            Some(expires_at) => expires_at <= now,
            None => true,
        }
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> Option<String> {
        self.token().map(|t| format!("Bearer {}", t))
    }
}
