use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::role::{Role, RoleSet};
use crate::models::user::User;

pub const SESSION_TTL_SECS: i64 = 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub name: Option<String>,
    pub roles: RoleSet,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn has_any_role(&self, required: &[Role]) -> bool {
        self.roles.intersects(required)
    }
}

#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub claims: SessionClaims,
    pub expires_at: DateTime<Utc>,
}

/// Mints and checks HS256 session tokens.
#[derive(Clone)]
pub struct SessionSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl SessionSigner {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, user: &User) -> Result<IssuedSession> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: &User, issued_at: DateTime<Utc>) -> Result<IssuedSession> {
        let expires_at = issued_at + Duration::seconds(SESSION_TTL_SECS);
        let claims = SessionClaims {
            sub: user.uid.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            roles: user.roles.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Internal(format!("Failed to sign session token: {}", e)))?;

        Ok(IssuedSession {
            token,
            claims,
            expires_at,
        })
    }

    /// Rejects forged, malformed and expired tokens alike.
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Session token rejected: {}", e);
                Error::Unauthorized("Invalid or expired session token".to_string())
            })
    }
}

pub fn expiry_of(claims: &SessionClaims) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(claims.exp, 0).single()
}
