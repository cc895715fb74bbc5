use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::role::Role;
use crate::services::session::{IssuedSession, SessionClaims};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdTokenPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "idToken is required"))]
    pub id_token: String,
}

/// Email/password registration. The Portuguese field names used by the
/// storefront client are accepted as aliases.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SignUpPayload {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[serde(alias = "senha")]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(alias = "nome")]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(default, alias = "sobrenome")]
    pub surname: Option<String>,
}

impl SignUpPayload {
    /// `"<name> <surname>"` with surrounding whitespace removed.
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.name.trim(),
            self.surname.as_deref().unwrap_or_default().trim()
        )
        .trim()
        .to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_token: String,
    pub uid: String,
    pub email: String,
    pub name: Option<String>,
    pub roles: Vec<Role>,
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedSession> for SessionResponse {
    fn from(value: IssuedSession) -> Self {
        Self {
            uid: value.claims.sub,
            email: value.claims.email,
            name: value.claims.name,
            roles: value.claims.roles.to_vec(),
            expires_at: value.expires_at,
            session_token: value.token,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionUser {
    pub uid: String,
    pub email: String,
    pub name: Option<String>,
    pub roles: Vec<Role>,
}

impl From<&SessionClaims> for SessionUser {
    fn from(value: &SessionClaims) -> Self {
        Self {
            uid: value.sub.clone(),
            email: value.email.clone(),
            name: value.name.clone(),
            roles: value.roles.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProtectedResponse {
    pub message: String,
    pub user: SessionUser,
}
